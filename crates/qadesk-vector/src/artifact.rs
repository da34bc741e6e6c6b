//! Combined index artifact: corpus records and their embedded vectors in one
//! checksummed file.
//!
//! The vector index and corpus store relate by position only; nothing in
//! either structure enforces that they were built together. Shipping them as
//! a single artifact with a content checksum turns a mismatched or truncated
//! pair into a load-time `DataCorrupt` failure instead of silently wrong
//! answers.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use qadesk_core::error::{QadeskError, Result};
use qadesk_core::types::QaRecord;

use crate::corpus::CorpusStore;
use crate::index::VectorIndex;

/// Current artifact format version. Bump on incompatible layout changes.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Serialized form of the index + corpus pair.
///
/// Produced by the offline indexing step; the serving process only reads it.
/// `records[i]` and `vectors[i]` describe the same corpus entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexArtifact {
    pub format_version: u32,
    /// Name of the encoder that produced the vectors. The serving process
    /// must run the same encoder for queries.
    pub embedding_model: String,
    pub dimension: usize,
    /// blake3 hex digest over the canonical byte encoding of records and
    /// vectors.
    pub checksum: String,
    pub records: Vec<QaRecord>,
    pub vectors: Vec<Vec<f32>>,
}

impl IndexArtifact {
    /// Assemble an artifact from aligned records and vectors, computing the
    /// checksum. Used by the offline indexing step and by test fixtures.
    pub fn from_parts(
        embedding_model: impl Into<String>,
        records: Vec<QaRecord>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if records.len() != vectors.len() {
            return Err(QadeskError::DataCorrupt(format!(
                "{} records but {} vectors",
                records.len(),
                vectors.len()
            )));
        }

        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        let checksum = compute_checksum(&records, &vectors);

        let artifact = Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            embedding_model: embedding_model.into(),
            dimension,
            checksum,
            records,
            vectors,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    /// Load and validate an artifact from disk.
    ///
    /// - absent file → `DataNotFound` naming the path
    /// - unreadable or malformed file → `DataCorrupt`
    /// - failed validation (version, alignment, dimension, checksum) →
    ///   `DataCorrupt`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                QadeskError::DataNotFound(format!(
                    "index artifact missing at {}",
                    path.display()
                ))
            } else {
                QadeskError::DataCorrupt(format!(
                    "failed to read index artifact {}: {}",
                    path.display(),
                    e
                ))
            }
        })?;

        let artifact: IndexArtifact = serde_json::from_str(&content).map_err(|e| {
            QadeskError::DataCorrupt(format!(
                "failed to parse index artifact {}: {}",
                path.display(),
                e
            ))
        })?;

        artifact.validate()?;

        info!(
            path = %path.display(),
            records = artifact.records.len(),
            dimension = artifact.dimension,
            model = %artifact.embedding_model,
            "Loaded index artifact"
        );

        Ok(artifact)
    }

    /// Serialize the artifact to disk, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string(self)?;
        std::fs::write(path, content)?;
        info!(path = %path.display(), records = self.records.len(), "Wrote index artifact");
        Ok(())
    }

    /// Check internal consistency: format version, positional alignment,
    /// vector dimensions, and content checksum.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(QadeskError::DataCorrupt(format!(
                "unsupported artifact format version {} (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }

        if self.records.len() != self.vectors.len() {
            return Err(QadeskError::DataCorrupt(format!(
                "artifact holds {} records but {} vectors",
                self.records.len(),
                self.vectors.len()
            )));
        }

        for (position, vector) in self.vectors.iter().enumerate() {
            if vector.len() != self.dimension {
                return Err(QadeskError::DataCorrupt(format!(
                    "vector at position {} has dimension {} (expected {})",
                    position,
                    vector.len(),
                    self.dimension
                )));
            }
        }

        let expected = compute_checksum(&self.records, &self.vectors);
        if expected != self.checksum {
            return Err(QadeskError::DataCorrupt(
                "artifact checksum mismatch; records and vectors do not match the recorded digest"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Split into the query-time structures.
    pub fn into_parts(self) -> Result<(VectorIndex, CorpusStore)> {
        let index = VectorIndex::from_vectors(self.vectors, self.dimension)?;
        let corpus = CorpusStore::new(self.records);
        Ok((index, corpus))
    }
}

/// blake3 digest over a canonical byte encoding of records and vectors.
///
/// Lengths are included so that moving bytes between fields cannot collide.
fn compute_checksum(records: &[QaRecord], vectors: &[Vec<f32>]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(records.len() as u64).to_le_bytes());

    for record in records {
        hasher.update(&(record.question.len() as u64).to_le_bytes());
        hasher.update(record.question.as_bytes());
        hasher.update(&(record.answer.len() as u64).to_le_bytes());
        hasher.update(record.answer.as_bytes());
    }

    for vector in vectors {
        hasher.update(&(vector.len() as u64).to_le_bytes());
        for value in vector {
            hasher.update(&value.to_le_bytes());
        }
    }

    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_artifact() -> IndexArtifact {
        IndexArtifact::from_parts(
            "all-MiniLM-L6-v2",
            vec![
                QaRecord::new("What is the KDD lab?", "A research lab."),
                QaRecord::new("Where is admissions?", "Block B, ground floor."),
            ],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_from_parts_rejects_misaligned_input() {
        let err = IndexArtifact::from_parts(
            "m",
            vec![QaRecord::new("q", "a")],
            vec![vec![1.0], vec![0.5]],
        )
        .unwrap_err();
        assert!(matches!(err, QadeskError::DataCorrupt(_)));
    }

    #[test]
    fn test_write_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qa_index.json");

        let artifact = sample_artifact();
        artifact.write(&path).unwrap();

        let loaded = IndexArtifact::load(&path).unwrap();
        assert_eq!(loaded.records, artifact.records);
        assert_eq!(loaded.vectors, artifact.vectors);
        assert_eq!(loaded.checksum, artifact.checksum);
        assert_eq!(loaded.embedding_model, "all-MiniLM-L6-v2");
    }

    #[test]
    fn test_load_missing_file_is_data_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let err = IndexArtifact::load(&path).unwrap_err();
        match err {
            QadeskError::DataNotFound(msg) => assert!(msg.contains("absent.json")),
            other => panic!("expected DataNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_load_malformed_file_is_data_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qa_index.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = IndexArtifact::load(&path).unwrap_err();
        assert!(matches!(err, QadeskError::DataCorrupt(_)));
    }

    #[test]
    fn test_tampered_record_fails_checksum() {
        let mut artifact = sample_artifact();
        artifact.records[0].answer = "A different answer.".to_string();

        let err = artifact.validate().unwrap_err();
        match err {
            QadeskError::DataCorrupt(msg) => assert!(msg.contains("checksum")),
            other => panic!("expected DataCorrupt, got {:?}", other),
        }
    }

    #[test]
    fn test_tampered_vector_fails_checksum() {
        let mut artifact = sample_artifact();
        artifact.vectors[1][0] = 0.25;

        assert!(artifact.validate().is_err());
    }

    #[test]
    fn test_truncated_vectors_fail_validation() {
        let mut artifact = sample_artifact();
        artifact.vectors.pop();

        let err = artifact.validate().unwrap_err();
        assert!(matches!(err, QadeskError::DataCorrupt(_)));
    }

    #[test]
    fn test_unsupported_version_fails_validation() {
        let mut artifact = sample_artifact();
        artifact.format_version = 99;

        let err = artifact.validate().unwrap_err();
        match err {
            QadeskError::DataCorrupt(msg) => assert!(msg.contains("version")),
            other => panic!("expected DataCorrupt, got {:?}", other),
        }
    }

    #[test]
    fn test_into_parts_alignment() {
        let (index, corpus) = sample_artifact().into_parts().unwrap();
        assert_eq!(index.len(), corpus.len());
        assert_eq!(index.dimension(), 2);
        assert_eq!(corpus.get(1).unwrap().answer, "Block B, ground floor.");
    }

    #[test]
    fn test_empty_artifact_allowed() {
        let artifact = IndexArtifact::from_parts("m", Vec::new(), Vec::new()).unwrap();
        assert_eq!(artifact.dimension, 0);
        let (index, corpus) = artifact.into_parts().unwrap();
        assert!(index.is_empty());
        assert!(corpus.is_empty());
    }
}

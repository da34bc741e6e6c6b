//! Position-keyed vector index with inner-product top-k search.
//!
//! The index is immutable at query time: it is built once by the offline
//! indexing step, loaded as part of the combined artifact, and shared
//! read-only across concurrent queries. Position i in the index corresponds
//! to position i in the corpus store.

use qadesk_core::error::{QadeskError, Result};

/// A single hit returned from a vector search.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    /// Corpus position of the matching vector.
    pub position: usize,
    /// Inner-product similarity to the query. Over unit vectors this equals
    /// cosine similarity. Not comparable to reranker scores.
    pub score: f32,
}

/// Immutable in-memory vector index over the corpus embeddings.
///
/// Search is brute-force over all N vectors, which is exact and fast enough
/// for corpus sizes in the tens of thousands.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    vectors: Vec<Vec<f32>>,
    dimension: usize,
}

impl VectorIndex {
    /// Build an index from position-ordered vectors.
    ///
    /// Every vector must have the given dimension; a mismatch means the
    /// artifact the vectors came from is internally inconsistent.
    pub fn from_vectors(vectors: Vec<Vec<f32>>, dimension: usize) -> Result<Self> {
        for (position, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(QadeskError::DataCorrupt(format!(
                    "vector at position {} has dimension {} (expected {})",
                    position,
                    vector.len(),
                    dimension
                )));
            }
        }
        Ok(Self { vectors, dimension })
    }

    /// Find the `k` nearest stored vectors to the query by inner product.
    ///
    /// Returns up to `k` hits sorted by descending score; ties keep
    /// ascending position order. Fewer than `k` hits are returned when the
    /// index holds fewer than `k` vectors, and an empty index yields no
    /// hits; both are normal outcomes, not errors.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<IndexHit>> {
        if self.vectors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if query.len() != self.dimension {
            return Err(QadeskError::Search(format!(
                "query dimension {} does not match index dimension {}",
                query.len(),
                self.dimension
            )));
        }

        let mut hits: Vec<IndexHit> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| IndexHit {
                position,
                score: inner_product(query, vector),
            })
            .collect();

        // Stable sort: tied scores keep ascending position order.
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);

        Ok(hits)
    }

    /// The stored vector at the given position, if in range.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        self.vectors.get(position).map(Vec::as_slice)
    }

    /// Number of vectors in the index.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// True if the index contains no vectors.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimensionality of the stored vectors.
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Inner product of two equal-length vectors.
fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

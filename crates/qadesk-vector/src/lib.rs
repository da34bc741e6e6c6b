//! Qadesk vector crate - embedding encoder, cross-encoder reranker, vector
//! index, corpus store, and the combined index artifact.
//!
//! Provides the model-facing and data-facing halves of the retrieval
//! pipeline: text-to-vector encoding, pairwise relevance scoring, exact
//! inner-product search over the corpus vectors, and checksummed loading of
//! the offline-built index artifact.

pub mod artifact;
pub mod corpus;
pub mod embedding;
pub mod index;
mod onnx;
pub mod reranker;

pub use artifact::{IndexArtifact, ARTIFACT_FORMAT_VERSION};
pub use corpus::CorpusStore;
pub use embedding::{DynEmbeddingService, EmbeddingService, MockEmbedding, OnnxEmbeddingService};
pub use index::{IndexHit, VectorIndex};
pub use reranker::{DynRerankService, MockReranker, OnnxCrossEncoder, RerankService};

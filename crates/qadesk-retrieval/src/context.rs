//! Retrieval context: the one-time-loaded services and data the pipeline
//! runs against.
//!
//! Model and artifact loading is the expensive part of this system, so it
//! happens at most once per process: `ContextLoader` guards a shared
//! `RetrievalContext` behind a `tokio::sync::OnceCell`, and concurrent first
//! callers share a single load. The context itself is read-only after
//! construction and safe to share across concurrent queries without locking.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use qadesk_core::config::QadeskConfig;
use qadesk_core::error::{QadeskError, Result};
use qadesk_vector::{
    CorpusStore, DynEmbeddingService, DynRerankService, IndexArtifact, OnnxCrossEncoder,
    OnnxEmbeddingService, VectorIndex,
};

/// Everything a query needs: encoder, reranker, index, corpus.
///
/// Built once (from config in production, from mocks in tests) and injected
/// into the pipeline, so nothing in the query path reaches for globals.
pub struct RetrievalContext {
    pub embedder: Box<dyn DynEmbeddingService>,
    pub reranker: Box<dyn DynRerankService>,
    pub index: VectorIndex,
    pub corpus: CorpusStore,
}

impl RetrievalContext {
    pub fn new(
        embedder: Box<dyn DynEmbeddingService>,
        reranker: Box<dyn DynRerankService>,
        index: VectorIndex,
        corpus: CorpusStore,
    ) -> Self {
        Self {
            embedder,
            reranker,
            index,
            corpus,
        }
    }

    /// Full production load: index artifact plus both ONNX models.
    ///
    /// Errors keep their classification (`DataNotFound` / `DataCorrupt` /
    /// `ModelLoad`) so startup diagnostics point at the right subsystem.
    pub fn load(config: &QadeskConfig) -> Result<Self> {
        let artifact = IndexArtifact::load(&config.index_artifact_path())?;

        // The artifact records which encoder produced its vectors. Serving
        // queries through a different encoder would silently search garbage.
        if artifact.embedding_model != config.models.embedding_model {
            return Err(QadeskError::DataCorrupt(format!(
                "index artifact was built with encoder '{}' but '{}' is configured",
                artifact.embedding_model, config.models.embedding_model
            )));
        }

        let (index, corpus) = artifact.into_parts()?;

        let embedder =
            OnnxEmbeddingService::from_directory(Path::new(&config.models.embedding_dir))?;
        let reranker = OnnxCrossEncoder::from_directory(Path::new(&config.models.reranker_dir))?;

        info!(
            records = corpus.len(),
            dimension = index.dimension(),
            "Retrieval context ready"
        );

        Ok(Self::new(
            Box::new(embedder),
            Box::new(reranker),
            index,
            corpus,
        ))
    }
}

impl std::fmt::Debug for RetrievalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalContext")
            .field("records", &self.corpus.len())
            .field("dimension", &self.index.dimension())
            .finish()
    }
}

type ContextFuture = Pin<Box<dyn Future<Output = Result<RetrievalContext>> + Send>>;
type ContextFactory = Box<dyn Fn() -> ContextFuture + Send + Sync>;

/// Guarded one-time initialization of the retrieval context.
///
/// The factory runs at most once per successful load; concurrent first
/// callers wait for the in-flight load instead of starting their own. A
/// failed load is not cached: the next caller retries, so a transient
/// startup problem does not wedge the process until restart.
pub struct ContextLoader {
    cell: OnceCell<Arc<RetrievalContext>>,
    loads: AtomicUsize,
    factory: ContextFactory,
}

impl ContextLoader {
    /// Build a loader around an arbitrary async factory. Tests inject
    /// mock-backed factories here.
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RetrievalContext>> + Send + 'static,
    {
        Self {
            cell: OnceCell::new(),
            loads: AtomicUsize::new(0),
            factory: Box::new(move || Box::pin(factory())),
        }
    }

    /// Production loader: ONNX models and the index artifact from config.
    ///
    /// The load is file and CPU heavy, so it runs on a blocking thread.
    pub fn from_config(config: QadeskConfig) -> Self {
        Self::new(move || {
            let config = config.clone();
            async move {
                tokio::task::spawn_blocking(move || RetrievalContext::load(&config))
                    .await
                    .map_err(|e| {
                        QadeskError::Inference(format!("Context load task panicked: {}", e))
                    })?
            }
        })
    }

    /// Get the shared context, loading it on first use.
    pub async fn get(&self) -> Result<Arc<RetrievalContext>> {
        self.cell
            .get_or_try_init(|| async {
                self.loads.fetch_add(1, Ordering::SeqCst);
                let context = (self.factory)().await?;
                Ok(Arc::new(context))
            })
            .await
            .cloned()
    }

    /// Number of times the factory has run. Instrumentation hook for tests
    /// asserting the load-once guarantee.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

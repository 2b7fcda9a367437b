//! Knowledge store manager.
//!
//! Owns the authoritative knowledge text and the active snapshot. Rebuilds
//! are all-or-nothing: a new snapshot is fully built before it replaces the
//! active one, so queries always see either the old or the new state.

use crate::chunker::{ChunkConfig, Chunker};
use crate::embeddings::{EmbeddingConfig, EmbeddingGateway};
use crate::retriever::{RetrievalResult, Retriever};
use crate::snapshot::KnowledgeSnapshot;
use chrono::{DateTime, Utc};
use grounded_core::{AppConfig, AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Separator placed between the existing source and appended text.
pub const APPEND_SEPARATOR: &str = "\n\n";

/// Lifecycle state of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreState {
    /// A snapshot is active and no rebuild is running
    Ready,
    /// A rebuild is in flight; queries use the previous snapshot
    Rebuilding,
}

/// Point-in-time description of the active snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeStats {
    pub version: u64,
    pub state: StoreState,
    pub chunk_count: usize,
    pub dimensions: usize,
    pub source_bytes: usize,
    pub source_sha256: String,
    pub built_at: DateTime<Utc>,
    pub embedding_provider: String,
    pub embedding_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Clears the rebuild flag when a rebuild ends, including on error or
/// cancellation.
struct RebuildGuard<'a>(&'a AtomicBool);

impl Drop for RebuildGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owner of the knowledge source and its active snapshot.
#[derive(Debug)]
pub struct KnowledgeStore {
    chunker: Chunker,
    retriever: Retriever,
    path: Option<PathBuf>,
    current: RwLock<Arc<KnowledgeSnapshot>>,
    rebuilding: AtomicBool,
}

impl KnowledgeStore {
    /// A store without a backing file, starting from an empty snapshot.
    pub fn in_memory(chunker: Chunker, gateway: EmbeddingGateway) -> Self {
        let empty = KnowledgeSnapshot::empty(gateway.dimensions());
        Self {
            chunker,
            retriever: Retriever::new(gateway),
            path: None,
            current: RwLock::new(Arc::new(empty)),
            rebuilding: AtomicBool::new(false),
        }
    }

    /// Open a knowledge file and build its first snapshot.
    ///
    /// A missing file is a configuration error.
    pub async fn open(
        path: impl Into<PathBuf>,
        chunker: Chunker,
        gateway: EmbeddingGateway,
    ) -> AppResult<Self> {
        let path = path.into();
        let source = read_source(&path).await?;

        let mut store = Self::in_memory(chunker, gateway);
        store.path = Some(path);
        store.rebuild_with(source, Persist::No).await?;

        Ok(store)
    }

    /// Open the knowledge file named by `config`, with its chunking,
    /// embedding and relevance settings.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let chunker = Chunker::new(ChunkConfig::from(&config.knowledge))?;
        let gateway = EmbeddingGateway::from_config(&EmbeddingConfig::from(&config.embedding))?;

        let store = Self::open(config.knowledge_path(), chunker, gateway).await?;
        Ok(store.with_min_score(config.knowledge.min_score))
    }

    /// Drop retrieved chunks scoring below `min_score`.
    pub fn with_min_score(mut self, min_score: Option<f32>) -> Self {
        self.retriever = self.retriever.with_min_score(min_score);
        self
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The active snapshot. Holding it pins that state for a whole query.
    pub fn snapshot(&self) -> Arc<KnowledgeSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> StoreState {
        if self.rebuilding.load(Ordering::SeqCst) {
            StoreState::Rebuilding
        } else {
            StoreState::Ready
        }
    }

    /// Replace the knowledge text with `source` and rebuild.
    ///
    /// For a file-backed store the file is overwritten only after the new
    /// snapshot is built. Fails with `RebuildInProgress` if another rebuild
    /// is running.
    pub async fn load(&self, source: impl Into<String>) -> AppResult<Arc<KnowledgeSnapshot>> {
        self.rebuild_with(source.into(), Persist::Replace).await
    }

    /// Append `new_text` to the knowledge text and rebuild everything.
    ///
    /// Blank text is rejected. A file-backed store re-reads its file, so
    /// external edits are kept, and replaces the file with the combined text
    /// only after the rebuild succeeds.
    pub async fn append(&self, new_text: &str) -> AppResult<Arc<KnowledgeSnapshot>> {
        if new_text.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "No content provided to append".to_string(),
            ));
        }

        let guard = self.begin_rebuild()?;
        let base = match &self.path {
            Some(path) => read_source(path).await?,
            None => self.snapshot().source().to_string(),
        };
        let source = format!("{}{}{}", base, APPEND_SEPARATOR, new_text);

        let snapshot = self
            .build_and_publish(&guard, source, Persist::Replace)
            .await?;

        tracing::info!(
            "Appended {} bytes to knowledge base (now v{})",
            new_text.len(),
            snapshot.version()
        );

        Ok(snapshot)
    }

    /// Rebuild from the backing file, or from the current text when the
    /// store has no file.
    pub async fn reload(&self) -> AppResult<Arc<KnowledgeSnapshot>> {
        let source = match &self.path {
            Some(path) => read_source(path).await?,
            None => self.snapshot().source().to_string(),
        };

        self.rebuild_with(source, Persist::No).await
    }

    /// Retrieve the chunks of the active snapshot most similar to `query`.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> AppResult<RetrievalResult> {
        let snapshot = self.snapshot();
        self.retriever.retrieve(&snapshot, query, top_k).await
    }

    pub fn stats(&self) -> KnowledgeStats {
        let snapshot = self.snapshot();
        let gateway = self.retriever.gateway();

        KnowledgeStats {
            version: snapshot.version(),
            state: self.state(),
            chunk_count: snapshot.chunks().len(),
            dimensions: snapshot.index().dimensions(),
            source_bytes: snapshot.source().len(),
            source_sha256: snapshot.source_sha256().to_string(),
            built_at: snapshot.built_at(),
            embedding_provider: gateway.provider_name().to_string(),
            embedding_model: gateway.model_name().to_string(),
            path: self.path.clone(),
        }
    }

    async fn rebuild_with(
        &self,
        source: String,
        persist: Persist,
    ) -> AppResult<Arc<KnowledgeSnapshot>> {
        let guard = self.begin_rebuild()?;
        self.build_and_publish(&guard, source, persist).await
    }

    fn begin_rebuild(&self) -> AppResult<RebuildGuard<'_>> {
        self.rebuilding
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| AppError::RebuildInProgress)?;
        Ok(RebuildGuard(&self.rebuilding))
    }

    async fn build_and_publish(
        &self,
        _guard: &RebuildGuard<'_>,
        source: String,
        persist: Persist,
    ) -> AppResult<Arc<KnowledgeSnapshot>> {
        let version = self.snapshot().version() + 1;
        tracing::info!("Rebuilding knowledge snapshot v{}", version);

        let built =
            KnowledgeSnapshot::build(version, source, &self.chunker, self.retriever.gateway())
                .await;
        let snapshot = match built {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                tracing::warn!("Rebuild v{} failed, keeping previous snapshot: {}", version, e);
                return Err(e);
            }
        };

        if let Some(path) = &self.path {
            if let Err(e) = persist.write(path, snapshot.source()).await {
                tracing::warn!("Failed to persist knowledge file {:?}: {}", path, e);
                return Err(e);
            }
        }

        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&snapshot);

        tracing::info!(
            "Published knowledge snapshot v{} ({} chunks)",
            snapshot.version(),
            snapshot.chunks().len()
        );

        Ok(snapshot)
    }
}

/// How a successful rebuild is written back to the knowledge file.
#[derive(Debug, Clone, Copy)]
enum Persist {
    No,
    Replace,
}

impl Persist {
    async fn write(self, path: &Path, full_source: &str) -> AppResult<()> {
        match self {
            Persist::No => Ok(()),
            Persist::Replace => write_atomically(path, full_source).await,
        }
    }
}

/// Replace `path` with `contents` via a sibling temp file and a rename, so
/// readers see either the old or the new file in full.
async fn write_atomically(path: &Path, contents: &str) -> AppResult<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            AppError::Config(format!("Knowledge path has no file name: {}", path.display()))
        })?;
    let temp = path.with_file_name(format!(".{}.tmp", file_name));

    let written = async {
        tokio::fs::write(&temp, contents).await?;
        tokio::fs::rename(&temp, path).await
    }
    .await;

    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e.into());
    }

    Ok(())
}

async fn read_source(path: &Path) -> AppResult<String> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(AppError::Config(format!(
            "Knowledge file not found: {}",
            path.display()
        )));
    }

    let source = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::Knowledge(format!(
            "Failed to read knowledge file {}: {}",
            path.display(),
            e
        ))
    })?;

    tracing::debug!("Read {} bytes from {}", source.len(), path.display());
    Ok(source)
}

//! KnowledgeRetriever: ingest, query, and maintain the knowledge base.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use dashmap::DashMap;
use rayon::prelude::*;
use tokio::sync::{Mutex, RwLock as AsyncRwLock};
use tracing::{debug, info, warn};

use bastion_core::config::RetrievalConfig;
use bastion_core::errors::{BastionError, BastionResult, RetrievalError};
use bastion_core::models::{
    Collection, DocumentChunk, DocumentMetadata, EmbeddingFingerprint, KnowledgeStats,
    RetrievalMatch, RetrievalQuery, RetrievalResult, SourceDocument, TagMatch,
};
use bastion_core::traits::{IChunkStore, IEmbeddingProvider};
use bastion_embeddings::{detect_fingerprint_change, FingerprintCheck};

use crate::chunker::chunk_text;
use crate::context::build_context;
use crate::index::KnowledgeIndex;
use crate::ranking::rank;
use crate::similarity::relevance;

/// Shared by all tasks. Queries and ingests run concurrently; writes to the
/// same source are serialized. Purges and resets wait for in-flight writes
/// and block new ones until the store and index agree again.
pub struct KnowledgeRetriever {
    embedder: Arc<dyn IEmbeddingProvider>,
    store: Arc<dyn IChunkStore>,
    index: KnowledgeIndex,
    config: RetrievalConfig,
    fingerprint: EmbeddingFingerprint,
    consistent: AtomicBool,
    /// Fingerprint found in the store when it disagreed with ours.
    stale_fingerprint: RwLock<Option<EmbeddingFingerprint>>,
    source_locks: DashMap<String, Arc<Mutex<()>>>,
    /// Shared by per-source writes, exclusive for purge and reset.
    maintenance: AsyncRwLock<()>,
}

impl KnowledgeRetriever {
    /// Open against a store, loading its chunks when their fingerprint
    /// matches the embedder. On mismatch the retriever opens but refuses
    /// ingests and queries until [`reset_index`](Self::reset_index).
    pub async fn open(
        config: RetrievalConfig,
        embedder: Arc<dyn IEmbeddingProvider>,
        store: Arc<dyn IChunkStore>,
    ) -> BastionResult<Self> {
        let fingerprint =
            EmbeddingFingerprint::new(embedder.name(), embedder.model(), embedder.dimensions());
        let stored = store.load_fingerprint().await?;

        let (index, consistent, stale) =
            match detect_fingerprint_change(&fingerprint, stored.as_ref()) {
                FingerprintCheck::FirstRun => {
                    store.store_fingerprint(&fingerprint).await?;
                    (KnowledgeIndex::from_chunks(store.load_chunks().await?), true, None)
                }
                FingerprintCheck::NoChange => {
                    (KnowledgeIndex::from_chunks(store.load_chunks().await?), true, None)
                }
                FingerprintCheck::Mismatch { stored, .. } => {
                    warn!(
                        stored = %stored,
                        current = %fingerprint,
                        "knowledge base needs a full reset and re-ingestion"
                    );
                    (KnowledgeIndex::new(), false, Some(stored))
                }
            };

        info!(
            chunks = index.chunk_count(),
            consistent,
            fingerprint = %fingerprint,
            "knowledge retriever opened"
        );

        Ok(Self {
            embedder,
            store,
            index,
            config,
            fingerprint,
            consistent: AtomicBool::new(consistent),
            stale_fingerprint: RwLock::new(stale),
            source_locks: DashMap::new(),
            maintenance: AsyncRwLock::new(()),
        })
    }

    pub fn fingerprint(&self) -> &EmbeddingFingerprint {
        &self.fingerprint
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// The stored fingerprint that disagreed with the embedder, if any.
    pub fn stale_fingerprint(&self) -> Option<EmbeddingFingerprint> {
        self.stale_fingerprint.read().ok().and_then(|fp| fp.clone())
    }

    pub fn is_consistent(&self) -> bool {
        self.consistent.load(Ordering::Acquire)
    }

    pub fn chunk_count(&self) -> usize {
        self.index.chunk_count()
    }

    fn ensure_consistent(&self) -> BastionResult<()> {
        if self.is_consistent() {
            return Ok(());
        }
        let stored = self
            .stale_fingerprint
            .read()
            .ok()
            .and_then(|fp| fp.as_ref().map(ToString::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        Err(RetrievalError::EmbeddingInconsistency {
            stored,
            current: self.fingerprint.to_string(),
        }
        .into())
    }

    fn source_lock(&self, source_id: &str) -> Arc<Mutex<()>> {
        self.source_locks
            .entry(source_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn embed_blocking(&self, texts: Vec<String>) -> BastionResult<Vec<Vec<f32>>> {
        let embedder = Arc::clone(&self.embedder);
        tokio::task::spawn_blocking(move || embedder.embed_batch(&texts))
            .await
            .map_err(|e| BastionError::Join {
                reason: e.to_string(),
            })?
    }

    /// Chunk, embed, and store `raw_text`, replacing anything previously
    /// ingested under `source_id`. Blank text removes the source.
    pub async fn ingest(
        &self,
        source_id: &str,
        raw_text: &str,
        collection: Collection,
    ) -> BastionResult<Vec<DocumentChunk>> {
        self.ingest_with_metadata(source_id, raw_text, collection, DocumentMetadata::default())
            .await
    }

    /// [`ingest`](Self::ingest), tagging every chunk with `metadata`.
    pub async fn ingest_with_metadata(
        &self,
        source_id: &str,
        raw_text: &str,
        collection: Collection,
        metadata: DocumentMetadata,
    ) -> BastionResult<Vec<DocumentChunk>> {
        self.ensure_consistent()?;
        if source_id.trim().is_empty() {
            return Err(RetrievalError::InvalidDocument {
                source_id: source_id.to_string(),
                reason: "source_id must not be empty".to_string(),
            }
            .into());
        }

        let _shared = self.maintenance.read().await;
        let lock = self.source_lock(source_id);
        let _guard = lock.lock().await;

        let windows = chunk_text(raw_text, self.config.chunk_size, self.config.chunk_overlap);
        if windows.is_empty() {
            self.store.remove_source(source_id).await?;
            self.index.remove(source_id);
            debug!(source_id, "blank document, source removed");
            return Ok(Vec::new());
        }

        let texts: Vec<String> = windows.iter().map(|w| w.text.clone()).collect();
        let vectors = self.embed_blocking(texts).await?;

        let now = Utc::now();
        let chunks: Vec<DocumentChunk> = windows
            .into_iter()
            .zip(vectors)
            .map(|(w, embedding_vector)| DocumentChunk {
                chunk_id: DocumentChunk::derive_id(collection, source_id, w.offset),
                collection,
                source_id: source_id.to_string(),
                text: w.text,
                embedding_vector,
                offset_in_source: w.offset,
                ingested_at: now,
                metadata: metadata.clone(),
            })
            .collect();

        self.store.replace_source(source_id, &chunks).await?;
        let replaced = self.index.replace(source_id, chunks.clone());

        info!(
            source_id,
            collection = %collection,
            chunks = chunks.len(),
            tags = metadata.tags.len(),
            replaced,
            "document ingested"
        );
        Ok(chunks)
    }

    pub async fn query(&self, query: &RetrievalQuery) -> BastionResult<RetrievalResult> {
        self.ensure_consistent()?;
        if !(0.0..=1.0).contains(&query.similarity_floor) {
            return Err(RetrievalError::InvalidQuery {
                reason: format!(
                    "similarity_floor must be within [0, 1], got {}",
                    query.similarity_floor
                ),
            }
            .into());
        }
        if query.text.trim().is_empty() {
            return Err(RetrievalError::InvalidQuery {
                reason: "query text is empty".to_string(),
            }
            .into());
        }
        if query.top_k == 0 {
            return Ok(RetrievalResult::default());
        }

        let sources = self.index.snapshot(query.collection_filter);
        if sources.is_empty() {
            return Ok(RetrievalResult::default());
        }

        let embedder = Arc::clone(&self.embedder);
        let q = query.clone();
        let scored = tokio::task::spawn_blocking(move || -> BastionResult<Vec<RetrievalMatch>> {
            let query_vec = embedder.embed(&q.text)?;
            Ok(sources
                .par_iter()
                .flat_map_iter(|chunks| chunks.iter())
                .filter(|c| q.collection_filter.map_or(true, |f| c.collection == f))
                .map(|c| RetrievalMatch {
                    score: relevance(&q.text, &query_vec, &c.text, &c.embedding_vector),
                    chunk: c.clone(),
                })
                .filter(|m| m.score >= q.similarity_floor)
                .collect())
        })
        .await
        .map_err(|e| BastionError::Join {
            reason: e.to_string(),
        })??;

        let result = rank(scored, query.top_k, query.similarity_floor);
        debug!(
            top_k = query.top_k,
            floor = query.similarity_floor,
            returned = result.len(),
            "knowledge query"
        );
        Ok(result)
    }

    /// Query with the configured `max_results` and `similarity_threshold`.
    pub async fn search(
        &self,
        text: &str,
        collection: Option<Collection>,
    ) -> BastionResult<RetrievalResult> {
        let mut query = RetrievalQuery::new(
            text,
            self.config.max_results,
            self.config.similarity_threshold,
        );
        query.collection_filter = collection;
        self.query(&query).await
    }

    /// A bounded context block for prompts, empty when nothing matches.
    pub async fn context_for_query(
        &self,
        text: &str,
        collection: Option<Collection>,
        max_chars: usize,
    ) -> BastionResult<String> {
        let result = self.search(text, collection).await?;
        Ok(build_context(&result, max_chars))
    }

    /// Sources in `collection` (all when `None`) with their metadata.
    pub fn list_sources(&self, collection: Option<Collection>) -> Vec<SourceDocument> {
        self.index.documents(collection)
    }

    /// Sources tagged with any of `tags`, case-insensitively. An empty tag
    /// list matches nothing.
    pub fn search_by_tags<S: AsRef<str>>(
        &self,
        tags: &[S],
        collection: Option<Collection>,
    ) -> Vec<TagMatch> {
        let found = self.index.tagged(tags, collection);
        debug!(tags = tags.len(), found = found.len(), "tag search");
        found
    }

    pub async fn remove_source(&self, source_id: &str) -> BastionResult<usize> {
        let removed = {
            let _shared = self.maintenance.read().await;
            let lock = self.source_lock(source_id);
            let removed = {
                let _guard = lock.lock().await;
                self.store.remove_source(source_id).await?;
                self.index.remove(source_id)
            };
            drop(lock);
            // Only drop the entry when no other writer holds or awaits it.
            self.source_locks
                .remove_if(source_id, |_, l| Arc::strong_count(l) == 1);
            removed
        };
        info!(source_id, removed, "source removed");
        Ok(removed)
    }

    pub async fn purge_collection(&self, collection: Collection) -> BastionResult<usize> {
        let _exclusive = self.maintenance.write().await;
        let stored = self.store.purge_collection(collection).await?;
        let indexed = self.index.purge(collection);
        info!(collection = %collection, stored, indexed, "collection purged");
        Ok(indexed.max(stored))
    }

    /// Drop every chunk and adopt the current embedding function. The only
    /// way out of an inconsistent state.
    pub async fn reset_index(&self) -> BastionResult<()> {
        let _exclusive = self.maintenance.write().await;
        self.store.reset(&self.fingerprint).await?;
        self.index.clear();
        if let Ok(mut stale) = self.stale_fingerprint.write() {
            *stale = None;
        }
        self.consistent.store(true, Ordering::Release);
        warn!(fingerprint = %self.fingerprint, "knowledge index reset");
        Ok(())
    }

    pub fn stats(&self) -> KnowledgeStats {
        let collections = self.index.stats();
        KnowledgeStats {
            total_chunks: collections.values().map(|s| s.chunks).sum(),
            collections,
            embedding_model: self.fingerprint.model.clone(),
            dimensions: self.fingerprint.dimensions,
        }
    }
}

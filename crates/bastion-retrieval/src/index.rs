//! In-memory chunk index, one entry per source.
//!
//! A source's chunks live in a single immutable slice, so replacing a source
//! is one map insert and readers never see a half-replaced source.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;

use bastion_core::models::{Collection, CollectionStats, DocumentChunk, SourceDocument, TagMatch};

#[derive(Default)]
pub struct KnowledgeIndex {
    sources: DashMap<String, Arc<[DocumentChunk]>>,
}

impl KnowledgeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored chunks, grouping them by source.
    pub fn from_chunks(chunks: Vec<DocumentChunk>) -> Self {
        let mut grouped: BTreeMap<String, Vec<DocumentChunk>> = BTreeMap::new();
        for chunk in chunks {
            grouped.entry(chunk.source_id.clone()).or_default().push(chunk);
        }
        let index = Self::new();
        for (source_id, chunks) in grouped {
            index.sources.insert(source_id, chunks.into());
        }
        index
    }

    /// Returns how many chunks the source had before.
    pub fn replace(&self, source_id: &str, chunks: Vec<DocumentChunk>) -> usize {
        self.sources
            .insert(source_id.to_string(), chunks.into())
            .map_or(0, |old| old.len())
    }

    pub fn remove(&self, source_id: &str) -> usize {
        self.sources
            .remove(source_id)
            .map_or(0, |(_, old)| old.len())
    }

    /// Drop every chunk in `collection`. Returns the number dropped.
    pub fn purge(&self, collection: Collection) -> usize {
        let mut dropped = 0;
        self.sources.retain(|_, chunks| {
            let before = chunks.len();
            if chunks.iter().any(|c| c.collection == collection) {
                let kept: Vec<DocumentChunk> = chunks
                    .iter()
                    .filter(|c| c.collection != collection)
                    .cloned()
                    .collect();
                dropped += before - kept.len();
                *chunks = kept.into();
            }
            !chunks.is_empty()
        });
        dropped
    }

    pub fn clear(&self) {
        self.sources.clear();
    }

    /// Point-in-time view of the sources a query should scan.
    pub fn snapshot(&self, filter: Option<Collection>) -> Vec<Arc<[DocumentChunk]>> {
        self.sources
            .iter()
            .filter(|entry| {
                filter.map_or(true, |c| entry.value().iter().any(|chunk| chunk.collection == c))
            })
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn chunk_count(&self) -> usize {
        self.sources.iter().map(|e| e.value().len()).sum()
    }

    pub fn source_chunks(&self, source_id: &str) -> Option<Arc<[DocumentChunk]>> {
        self.sources.get(source_id).map(|e| Arc::clone(e.value()))
    }

    /// Every source holding chunks in `filter` (all when `None`), ordered by
    /// source id. Metadata and timestamp come from the source's first chunk.
    pub fn documents(&self, filter: Option<Collection>) -> Vec<SourceDocument> {
        let mut docs: Vec<SourceDocument> = self
            .sources
            .iter()
            .filter_map(|entry| {
                let chunks = entry.value();
                let matching = chunks
                    .iter()
                    .filter(|c| filter.map_or(true, |f| c.collection == f))
                    .count();
                let first = chunks
                    .iter()
                    .find(|c| filter.map_or(true, |f| c.collection == f))?;
                Some(SourceDocument {
                    source_id: entry.key().clone(),
                    collection: first.collection,
                    metadata: first.metadata.clone(),
                    chunks: matching,
                    ingested_at: first.ingested_at,
                })
            })
            .collect();
        docs.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        docs
    }

    /// Sources carrying any of `tags`, compared case-insensitively.
    pub fn tagged<S: AsRef<str>>(&self, tags: &[S], filter: Option<Collection>) -> Vec<TagMatch> {
        self.documents(filter)
            .into_iter()
            .filter_map(|document| {
                let matched_tags = document.metadata.matching_tags(tags);
                (!matched_tags.is_empty()).then_some(TagMatch {
                    document,
                    matched_tags,
                })
            })
            .collect()
    }

    pub fn stats(&self) -> BTreeMap<Collection, CollectionStats> {
        let mut stats: BTreeMap<Collection, CollectionStats> = BTreeMap::new();
        let mut seen: HashSet<(Collection, String)> = HashSet::new();
        for entry in self.sources.iter() {
            for chunk in entry.value().iter() {
                let s = stats.entry(chunk.collection).or_default();
                s.chunks += 1;
                if seen.insert((chunk.collection, chunk.source_id.clone())) {
                    s.sources += 1;
                }
            }
        }
        stats
    }
}

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RetrievalError;

/// The fixed set of knowledge collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Vulnerabilities,
    Techniques,
    Tools,
    ThreatIntel,
    Reports,
    General,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Vulnerabilities,
        Collection::Techniques,
        Collection::Tools,
        Collection::ThreatIntel,
        Collection::Reports,
        Collection::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vulnerabilities => "vulnerabilities",
            Self::Techniques => "techniques",
            Self::Tools => "tools",
            Self::ThreatIntel => "threat_intel",
            Self::Reports => "reports",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| RetrievalError::UnknownCollection {
                name: s.to_string(),
            })
    }
}

/// Provenance of an ingested document, copied onto each of its chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    /// Where the document came from: a feed, URL, or file path.
    pub origin: Option<String>,
    pub tags: Vec<String>,
}

impl DocumentMetadata {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Tags are trimmed; blanks and case-insensitive duplicates are dropped.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into().trim().to_string();
            if !tag.is_empty() && !self.tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                self.tags.push(tag);
            }
        }
        self
    }

    /// The requested tags this document carries, compared case-insensitively,
    /// in request order.
    pub fn matching_tags<S: AsRef<str>>(&self, wanted: &[S]) -> Vec<String> {
        wanted
            .iter()
            .map(|w| w.as_ref().trim())
            .filter(|w| !w.is_empty() && self.tags.iter().any(|t| t.eq_ignore_ascii_case(w)))
            .map(str::to_string)
            .collect()
    }
}

/// A slice of an ingested source with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub chunk_id: String,
    pub collection: Collection,
    pub source_id: String,
    pub text: String,
    pub embedding_vector: Vec<f32>,
    /// Character offset of the chunk's first character in the source text.
    pub offset_in_source: usize,
    pub ingested_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl DocumentChunk {
    /// Deterministic id: re-ingesting identical input yields identical ids.
    pub fn derive_id(collection: Collection, source_id: &str, offset: usize) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(collection.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(source_id.as_bytes());
        hasher.update(&[0]);
        hasher.update(&(offset as u64).to_le_bytes());
        hasher.finalize().to_hex()[..32].to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalQuery {
    pub text: String,
    pub collection_filter: Option<Collection>,
    pub top_k: usize,
    pub similarity_floor: f64,
}

impl RetrievalQuery {
    pub fn new(text: impl Into<String>, top_k: usize, similarity_floor: f64) -> Self {
        Self {
            text: text.into(),
            collection_filter: None,
            top_k,
            similarity_floor,
        }
    }

    pub fn in_collection(mut self, collection: Collection) -> Self {
        self.collection_filter = Some(collection);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalMatch {
    pub chunk: DocumentChunk,
    pub score: f64,
}

/// Matches ordered by descending score. Never longer than the query's `top_k`,
/// never below its floor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub matches: Vec<RetrievalMatch>,
}

impl RetrievalResult {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn top(&self) -> Option<&RetrievalMatch> {
        self.matches.first()
    }
}

/// One indexed source, without its chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub source_id: String,
    pub collection: Collection,
    pub metadata: DocumentMetadata,
    pub chunks: usize,
    pub ingested_at: DateTime<Utc>,
}

/// A source found by tag, with the requested tags it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagMatch {
    pub document: SourceDocument,
    pub matched_tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub chunks: usize,
    pub sources: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeStats {
    pub collections: BTreeMap<Collection, CollectionStats>,
    pub total_chunks: usize,
    pub embedding_model: String,
    pub dimensions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_names_round_trip() {
        for c in Collection::ALL {
            assert_eq!(c.as_str().parse::<Collection>().ok(), Some(c));
        }
        assert_eq!("Threat Intel".parse::<Collection>().ok(), Some(Collection::ThreatIntel));
        assert!("exploits".parse::<Collection>().is_err());
    }

    #[test]
    fn tags_are_deduplicated_and_matched_without_case() {
        let meta = DocumentMetadata::default().with_tags(["Web", " web ", "", "RCE"]);
        assert_eq!(meta.tags, vec!["Web".to_string(), "RCE".to_string()]);
        assert_eq!(meta.matching_tags(&["rce", "phishing", "WEB"]), vec!["rce", "WEB"]);
        assert!(meta.matching_tags::<&str>(&[]).is_empty());
    }

    #[test]
    fn chunk_ids_are_stable_and_distinct() {
        let a = DocumentChunk::derive_id(Collection::Tools, "nmap-guide", 0);
        let b = DocumentChunk::derive_id(Collection::Tools, "nmap-guide", 0);
        let c = DocumentChunk::derive_id(Collection::Tools, "nmap-guide", 800);
        let d = DocumentChunk::derive_id(Collection::Techniques, "nmap-guide", 0);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }
}

//! # bastion-retrieval
//!
//! The knowledge half of Bastion: split documents into overlapping chunks,
//! embed them, keep them searchable, and answer similarity queries.
//!
//! Ingest path: text → [`chunker`] → embedding → store + [`index`].
//! Query path: text → embedding → [`similarity`] over the index → [`ranking`].

pub mod chunker;
pub mod context;
pub mod index;
pub mod ranking;
pub mod retriever;
pub mod similarity;

pub use retriever::KnowledgeRetriever;

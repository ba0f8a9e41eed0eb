//! # bastion-embeddings
//!
//! Turns text into fixed-length vectors for the knowledge base.
//!
//! ## Providers
//! - **hashed**: local TF-IDF term hashing, deterministic, no network.
//! - **http**: an OpenAI-compatible `/embeddings` endpoint.
//!
//! Providers never fall back to one another. Vectors from different functions
//! are not comparable, and the knowledge base pins the provider through an
//! [`EmbeddingFingerprint`](bastion_core::models::EmbeddingFingerprint).

pub mod cache;
pub mod engine;
pub mod fingerprint;
pub mod providers;

pub use engine::EmbeddingEngine;
pub use fingerprint::{detect_fingerprint_change, FingerprintCheck};
pub use providers::{HashedTfIdfProvider, HttpEmbeddingProvider};

//! Hashed TF-IDF provider.
//!
//! Unigrams and adjacent-word bigrams are hashed into fixed buckets with
//! FNV-1a, weighted by term frequency and a length-based IDF proxy, then
//! L2-normalized. Identical text always produces identical vectors.

use std::collections::HashMap;

use bastion_core::errors::BastionResult;
use bastion_core::traits::IEmbeddingProvider;
use rayon::prelude::*;

/// Bigrams count for less than the words they are built from.
const BIGRAM_WEIGHT: f32 = 0.5;

pub struct HashedTfIdfProvider {
    model: String,
    dimensions: usize,
}

impl HashedTfIdfProvider {
    pub fn new(model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            model: model.into(),
            dimensions: dimensions.max(1),
        }
    }

    fn hash_term(term: &str, dims: usize) -> usize {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        for b in term.as_bytes() {
            h ^= *b as u64;
            h = h.wrapping_mul(0x0100_0000_01b3);
        }
        (h % dims as u64) as usize
    }

    fn tokenize(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric() && c != '_' && c != '-')
            .map(|s| s.trim_matches('-'))
            .filter(|s| s.chars().count() >= 2)
            .map(str::to_lowercase)
            .collect()
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let tokens = Self::tokenize(text);
        let mut vec = vec![0.0f32; self.dimensions];
        if tokens.is_empty() {
            return vec;
        }

        let mut tf: HashMap<String, f32> = HashMap::new();
        for tok in &tokens {
            *tf.entry(tok.clone()).or_default() += 1.0;
        }
        for pair in tokens.windows(2) {
            *tf.entry(format!("{} {}", pair[0], pair[1])).or_default() += BIGRAM_WEIGHT;
        }

        let total = tokens.len() as f32;
        for (term, count) in &tf {
            let idf = 1.0 + (term.len() as f32).ln();
            vec[Self::hash_term(term, self.dimensions)] += (count / total) * idf;
        }

        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vec {
                *v /= norm;
            }
        }
        vec
    }
}

impl IEmbeddingProvider for HashedTfIdfProvider {
    fn embed(&self, text: &str) -> BastionResult<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    fn embed_batch(&self, texts: &[String]) -> BastionResult<Vec<Vec<f32>>> {
        Ok(texts.par_iter().map(|t| self.vectorize(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashed"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        true
    }
}

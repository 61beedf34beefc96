//! Offline embedding provider.
//!
//! Hashes lowercase terms into fixed buckets weighted by term frequency and a
//! log-length factor, then L2-normalizes. Far weaker than a neural model but
//! deterministic and available without any model files.

use anyhow::Result;
use std::collections::BTreeMap;

use super::EmbeddingModel;
use crate::similarity::normalize;

pub struct HashingEmbeddings {
    dimension: usize,
}

impl HashingEmbeddings {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// FNV-1a bucket for a term.
    fn bucket(term: &str, dims: usize) -> usize {
        let mut h: u64 = 0xcbf29ce484222325;
        for b in term.as_bytes() {
            h ^= *b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        (h % dims as u64) as usize
    }

    fn terms(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|s| s.len() >= 2)
            .map(|s| s.to_lowercase())
            .collect()
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dimension];
        let terms = Self::terms(text);
        if terms.is_empty() || self.dimension == 0 {
            return vec;
        }

        let mut tf: BTreeMap<&str, f32> = BTreeMap::new();
        for term in &terms {
            *tf.entry(term.as_str()).or_default() += 1.0;
        }

        let total = terms.len() as f32;
        for (term, count) in tf {
            let weight = 1.0 + (term.len() as f32).ln();
            vec[Self::bucket(term, self.dimension)] += (count / total) * weight;
        }

        normalize(&mut vec);
        vec
    }
}

impl EmbeddingModel for HashingEmbeddings {
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    fn embed_document(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

use anyhow::{anyhow, Result};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tokenizers::{Tokenizer, TruncationParams};

use super::EmbeddingModel;
use crate::similarity::normalize;

const MAX_BATCH_SIZE: usize = 16;

#[derive(Clone, Debug)]
pub struct MiniLmConfig {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub dimension: usize,
    pub max_length: usize,
}

impl MiniLmConfig {
    /// Locate the ONNX graph and tokenizer inside `model_dir`.
    pub fn from_dir(model_dir: &Path, dimension: usize, max_length: usize) -> Option<Self> {
        let model_path = [
            model_dir.join("model.onnx"),
            model_dir.join("onnx").join("model.onnx"),
        ]
        .into_iter()
        .find(|p| p.exists())?;

        let tokenizer_path = model_dir.join("tokenizer.json");
        if !tokenizer_path.exists() {
            return None;
        }

        Some(Self {
            model_path,
            tokenizer_path,
            dimension,
            max_length,
        })
    }
}

/// all-MiniLM-L6-v2 sentence embeddings: mean pooling over the attention
/// mask, then L2 normalization.
pub struct MiniLmEmbeddings {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    config: MiniLmConfig,
}

impl MiniLmEmbeddings {
    pub fn new(config: MiniLmConfig) -> Result<Self> {
        ort::init().with_name("mini_rag").commit();

        if !config.model_path.exists() {
            return Err(anyhow!(
                "Model file not found at: {}",
                config.model_path.display()
            ));
        }

        let mut tokenizer = Tokenizer::from_file(&config.tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {:?}", e))?;
        truncate_to(&mut tokenizer, config.max_length)?;

        let model_bytes = std::fs::read(&config.model_path)
            .map_err(|e| anyhow!("Failed to read model: {:?}", e))?;

        let session = Session::builder()
            .map_err(|e| anyhow!("Session builder: {:?}", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| anyhow!("Optimization level: {:?}", e))?
            .with_intra_threads(1)
            .map_err(|e| anyhow!("Intra threads: {:?}", e))?
            .commit_from_memory(&model_bytes)
            .map_err(|e| anyhow!("Failed to load model: {:?}", e))?;

        tracing::info!(
            model = %config.model_path.display(),
            dimension = config.dimension,
            "MiniLM embedding model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            config,
        })
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(MAX_BATCH_SIZE) {
            let encodings = self
                .tokenizer
                .encode_batch(batch.to_vec(), true)
                .map_err(|e| anyhow!("Tokenization failed: {:?}", e))?;

            let padded_len = encodings
                .iter()
                .map(|e| e.get_ids().len())
                .max()
                .unwrap_or(0)
                .max(1);
            let batch_size = encodings.len();

            let mut ids_flat = Vec::with_capacity(batch_size * padded_len);
            let mut mask_flat = Vec::with_capacity(batch_size * padded_len);
            let mut type_flat = Vec::with_capacity(batch_size * padded_len);

            for enc in &encodings {
                let len = enc.get_ids().len().min(padded_len);
                for i in 0..len {
                    ids_flat.push(enc.get_ids()[i] as i64);
                    mask_flat.push(enc.get_attention_mask()[i] as i64);
                    type_flat.push(enc.get_type_ids()[i] as i64);
                }
                for _ in len..padded_len {
                    ids_flat.push(0i64);
                    mask_flat.push(0i64);
                    type_flat.push(0i64);
                }
            }

            let shape = vec![batch_size, padded_len];
            let input_ids = Value::from_array((shape.clone(), ids_flat))
                .map_err(|e| anyhow!("input_ids tensor: {:?}", e))?;
            let attention_mask = Value::from_array((shape.clone(), mask_flat.clone()))
                .map_err(|e| anyhow!("attention_mask tensor: {:?}", e))?;
            let token_type_ids = Value::from_array((shape, type_flat))
                .map_err(|e| anyhow!("token_type_ids tensor: {:?}", e))?;

            let inputs = ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids,
            ];

            let mut session = self.session.lock();
            let outputs = session
                .run(inputs)
                .map_err(|e| anyhow!("Inference failed: {:?}", e))?;

            let output_name = outputs
                .iter()
                .find(|(name, _)| *name == "last_hidden_state" || *name == "token_embeddings")
                .or_else(|| outputs.iter().next())
                .map(|(name, _)| name.to_string())
                .ok_or_else(|| anyhow!("Model produced no outputs"))?;

            let (shape, data) = outputs[output_name.as_str()]
                .try_extract_tensor::<f32>()
                .map_err(|e| anyhow!("Failed to extract output '{}': {:?}", output_name, e))?;

            if shape.len() != 3 {
                return Err(anyhow!(
                    "Expected [batch, seq, dim] output, got {} dimensions",
                    shape.len()
                ));
            }
            let seq_len = shape[1] as usize;
            let hidden_dim = shape[2] as usize;
            if hidden_dim != self.config.dimension {
                return Err(anyhow!(
                    "Model hidden size {} does not match configured dimension {}",
                    hidden_dim,
                    self.config.dimension
                ));
            }

            for sample in 0..batch_size {
                let mask = &mask_flat[sample * padded_len..(sample + 1) * padded_len];
                let hidden = &data[sample * seq_len * hidden_dim..(sample + 1) * seq_len * hidden_dim];
                all_embeddings.push(mean_pool(hidden, mask, hidden_dim));
            }
        }

        Ok(all_embeddings)
    }
}

/// Cap encodings at `max_length` tokens. The tokenizer reserves room for the
/// special tokens, so long inputs still end with [SEP].
fn truncate_to(tokenizer: &mut Tokenizer, max_length: usize) -> Result<()> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| anyhow!("Failed to configure truncation: {:?}", e))?;
    Ok(())
}

/// Masked mean over token vectors, L2-normalized.
fn mean_pool(hidden: &[f32], mask: &[i64], hidden_dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden_dim];
    let mut mask_sum = 0.0f32;

    for (pos, token) in hidden.chunks_exact(hidden_dim).enumerate() {
        let weight = mask.get(pos).copied().unwrap_or(0) as f32;
        if weight > 0.0 {
            mask_sum += weight;
            for (acc, x) in pooled.iter_mut().zip(token) {
                *acc += x * weight;
            }
        }
    }

    if mask_sum > 0.0 {
        for v in &mut pooled {
            *v /= mask_sum;
        }
    }

    normalize(&mut pooled);
    pooled
}

impl EmbeddingModel for MiniLmEmbeddings {
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| anyhow!("Model returned no embedding"))
    }

    fn embed_document(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_query(text)
    }

    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.embed_batch(texts)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn name(&self) -> &str {
        "all-MiniLM-L6-v2"
    }
}

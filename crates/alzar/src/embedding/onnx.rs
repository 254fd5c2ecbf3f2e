use anyhow::{anyhow, Result};
use hf_hub::api::tokio::Api;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::EmbeddingModel;

const MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";
const TOKENIZER_FILE: &str = "tokenizer.json";
const MODEL_FILE: &str = "onnx/model.onnx";
const MAX_TEXT_LENGTH: usize = 8192;

/// Sentence-transformer embeddings computed locally with ONNX Runtime.
/// Token states are mean-pooled over the attention mask and L2-normalized.
pub struct OnnxEmbeddingModel {
  session: Session,
  tokenizer: Tokenizer,
}

impl OnnxEmbeddingModel {
  /// Download (or reuse the cached copy of) the model and tokenizer
  pub async fn load() -> Result<Self> {
    let api = Api::new().map_err(|e| anyhow!("HF API initialization failed: {}", e))?;
    let repo = api.model(MODEL_NAME.to_string());

    let tokenizer_file =
      repo.get(TOKENIZER_FILE).await.map_err(|e| anyhow!("Failed to download tokenizer: {}", e))?;
    let model_path =
      repo.get(MODEL_FILE).await.map_err(|e| anyhow!("Failed to download ONNX model: {}", e))?;

    let tokenizer = Tokenizer::from_file(tokenizer_file)
      .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;

    let session = Session::builder()
      .map_err(|e| anyhow!("Failed to create session builder: {}", e))?
      .with_optimization_level(GraphOptimizationLevel::Level1)
      .map_err(|e| anyhow!("Failed to set optimization level: {}", e))?
      .commit_from_file(model_path)
      .map_err(|e| anyhow!("Failed to load ONNX model: {}", e))?;

    Ok(Self { session, tokenizer })
  }
}

impl EmbeddingModel for OnnxEmbeddingModel {
  fn compute_embeddings(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
      return Ok(vec![]);
    }

    if let Some(text) = texts.iter().find(|t| t.len() > MAX_TEXT_LENGTH) {
      return Err(anyhow!("Text too long: {} characters (max {MAX_TEXT_LENGTH})", text.len()));
    }

    let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let encodings = self
      .tokenizer
      .encode_batch(inputs, true)
      .map_err(|e| anyhow!("Failed to encode texts: {}", e))?;

    let batch = batch_tokens(&encodings);
    let shape = [batch.size, batch.length];

    let ids = Tensor::from_array((shape, batch.ids.into_boxed_slice()))
      .map_err(|e| anyhow!("Failed to build input_ids tensor: {}", e))?;
    let mask = Tensor::from_array((shape, batch.mask.clone().into_boxed_slice()))
      .map_err(|e| anyhow!("Failed to build attention_mask tensor: {}", e))?;
    let token_type_ids = Tensor::from_array((shape, batch.token_type_ids.into_boxed_slice()))
      .map_err(|e| anyhow!("Failed to build token_type_ids tensor: {}", e))?;

    let outputs = self
      .session
      .run(ort::inputs![
        "input_ids" => ids,
        "attention_mask" => mask,
        "token_type_ids" => token_type_ids
      ])
      .map_err(|e| anyhow!("Inference failed: {}", e))?;

    let output = outputs.get("last_hidden_state").ok_or_else(|| {
      anyhow!("No output tensor found - available outputs: {:?}", outputs.keys().collect::<Vec<_>>())
    })?;

    let (dims, data) =
      output.try_extract_tensor::<f32>().map_err(|e| anyhow!("Failed to read output: {}", e))?;
    let dims: &[i64] = dims.as_ref();
    let hidden = dims.last().copied().unwrap_or(0).max(0) as usize;

    Ok(mean_pool(data, &batch.mask, batch.size, batch.length, hidden))
  }

  fn version(&self) -> String {
    MODEL_NAME.to_string()
  }
}

struct TokenBatch {
  ids: Vec<i64>,
  mask: Vec<i64>,
  token_type_ids: Vec<i64>,
  size: usize,
  length: usize,
}

/// Right-pad every encoding to the longest one in the batch
fn batch_tokens(encodings: &[tokenizers::Encoding]) -> TokenBatch {
  let size = encodings.len();
  let length = encodings.iter().map(|e| e.len()).max().unwrap_or(0);

  let mut ids = Vec::with_capacity(size * length);
  let mut mask = Vec::with_capacity(size * length);
  let mut token_type_ids = Vec::with_capacity(size * length);

  for encoding in encodings {
    let encoding_ids = encoding.get_ids();
    let encoding_mask = encoding.get_attention_mask();

    for i in 0..length {
      if i < encoding_ids.len() {
        ids.push(encoding_ids[i] as i64);
        mask.push(encoding_mask[i] as i64);
      } else {
        ids.push(0);
        mask.push(0);
      }
      token_type_ids.push(0);
    }
  }

  TokenBatch { ids, mask, token_type_ids, size, length }
}

fn mean_pool(
  data: &[f32],
  mask: &[i64],
  size: usize,
  length: usize,
  hidden: usize,
) -> Vec<Vec<f32>> {
  let mut results = Vec::with_capacity(size);

  for b in 0..size {
    let mut pooled = vec![0.0f32; hidden];
    let mut count = 0.0f32;

    for t in 0..length {
      if mask[b * length + t] == 0 {
        continue;
      }
      let start = (b * length + t) * hidden;
      if let Some(token) = data.get(start..start + hidden) {
        for (acc, value) in pooled.iter_mut().zip(token) {
          *acc += value;
        }
        count += 1.0;
      }
    }

    if count > 0.0 {
      pooled.iter_mut().for_each(|v| *v /= count);
    }

    let magnitude: f32 = pooled.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
      pooled.iter_mut().for_each(|v| *v /= magnitude);
    }

    results.push(pooled);
  }

  results
}

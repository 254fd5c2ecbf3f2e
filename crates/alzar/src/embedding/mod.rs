//! Text embedding models
//!
//! Ranking treats the model as an oracle: `texts -> vectors`, one vector per
//! input, in input order, deterministic for identical text and tolerant of
//! empty strings. Which model backs the oracle is a configuration choice.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

use crate::config::EmbeddingConfig;

mod hashing;
#[cfg(feature = "neural")]
mod onnx;
mod remote;

pub use hashing::HashingEmbeddingModel;
#[cfg(feature = "neural")]
pub use onnx::OnnxEmbeddingModel;
pub use remote::RemoteEmbeddingModel;

/// Trait for computing text embeddings - allows for testing with mocks
pub trait EmbeddingModel: Send {
  fn compute_embeddings(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

  /// Identifier of the model producing the vectors
  fn version(&self) -> String;
}

/// A loaded model shared by every request
pub type SharedModel = Arc<Mutex<Box<dyn EmbeddingModel>>>;

/// Build the model described by the configuration
pub async fn load_model(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingModel>> {
  match config {
    EmbeddingConfig::Hashing { dimensions } => {
      Ok(Box::new(HashingEmbeddingModel::new(*dimensions)))
    }
    EmbeddingConfig::Remote { url, timeout_secs } => {
      Ok(Box::new(RemoteEmbeddingModel::new(url, *timeout_secs)?))
    }
    #[cfg(feature = "neural")]
    EmbeddingConfig::Onnx => Ok(Box::new(OnnxEmbeddingModel::load().await?)),
    #[cfg(not(feature = "neural"))]
    EmbeddingConfig::Onnx => {
      Err(anyhow!("the onnx embedding model requires building with the `neural` feature"))
    }
  }
}

/// Process-lifetime handle to the embedding model. The model is loaded on
/// first use and kept until shutdown.
pub struct ModelHandle {
  config: EmbeddingConfig,
  cell: OnceCell<SharedModel>,
}

impl ModelHandle {
  pub fn new(config: EmbeddingConfig) -> Self {
    Self { config, cell: OnceCell::new() }
  }

  /// Wrap an already constructed model
  pub fn preloaded(model: Box<dyn EmbeddingModel>) -> Self {
    Self {
      config: EmbeddingConfig::default(),
      cell: OnceCell::new_with(Some(Arc::new(Mutex::new(model)))),
    }
  }

  pub async fn get(&self) -> Result<SharedModel> {
    let model = self
      .cell
      .get_or_try_init(|| async {
        tracing::info!(model = ?self.config, "loading embedding model");
        let model = load_model(&self.config).await?;
        tracing::info!(version = %model.version(), "embedding model ready");
        Ok::<_, anyhow::Error>(Arc::new(Mutex::new(model)))
      })
      .await?;

    Ok(model.clone())
  }

  pub fn is_loaded(&self) -> bool {
    self.cell.initialized()
  }
}

/// Mock embedding model for testing
///
/// Texts registered with [`MockEmbeddingModel::with_embedding`] map to fixed
/// vectors; anything else gets the default vector. Every call is recorded.
pub struct MockEmbeddingModel {
  pub fail_on_texts: Vec<String>,
  pub responses: HashMap<String, Vec<f32>>,
  pub default_embedding: Vec<f32>,
  pub calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl Default for MockEmbeddingModel {
  fn default() -> Self {
    Self::new()
  }
}

impl MockEmbeddingModel {
  pub fn new() -> Self {
    Self {
      fail_on_texts: vec![],
      responses: HashMap::new(),
      default_embedding: vec![0.1, 0.2, 0.3],
      calls: Arc::new(Mutex::new(Vec::new())),
    }
  }

  pub fn with_failure_on(mut self, text: &str) -> Self {
    self.fail_on_texts.push(text.to_string());
    self
  }

  pub fn with_embedding(mut self, text: &str, embedding: Vec<f32>) -> Self {
    self.responses.insert(text.to_string(), embedding);
    self
  }

  pub fn with_default(mut self, embedding: Vec<f32>) -> Self {
    self.default_embedding = embedding;
    self
  }

  /// Shared view of the recorded calls, usable after the model is boxed
  pub fn call_log(&self) -> Arc<Mutex<Vec<Vec<String>>>> {
    self.calls.clone()
  }
}

impl EmbeddingModel for MockEmbeddingModel {
  fn compute_embeddings(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    if let Ok(mut calls) = self.calls.lock() {
      calls.push(texts.to_vec());
    }

    for text in texts {
      if self.fail_on_texts.contains(text) {
        return Err(anyhow!("Mock failure for text: {}", text));
      }
    }

    Ok(
      texts
        .iter()
        .map(|text| self.responses.get(text).unwrap_or(&self.default_embedding).clone())
        .collect(),
    )
  }

  fn version(&self) -> String {
    "mock".to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_mock_returns_registered_vectors_in_order() {
    let mut model =
      MockEmbeddingModel::new().with_embedding("a", vec![1.0, 0.0]).with_default(vec![0.0, 1.0]);

    let out = model.compute_embeddings(&["b".to_string(), "a".to_string()]).unwrap();
    assert_eq!(out, vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
    assert_eq!(model.calls.lock().unwrap().len(), 1);
  }

  #[test]
  fn test_mock_failure() {
    let mut model = MockEmbeddingModel::new().with_failure_on("boom");
    let result = model.compute_embeddings(&["fine".to_string(), "boom".to_string()]);
    assert!(result.unwrap_err().to_string().contains("boom"));
  }

  #[tokio::test]
  async fn test_model_handle_loads_once() {
    let handle = ModelHandle::new(EmbeddingConfig::Hashing { dimensions: 16 });
    assert!(!handle.is_loaded());

    let first = handle.get().await.unwrap();
    let second = handle.get().await.unwrap();
    assert!(handle.is_loaded());
    assert!(Arc::ptr_eq(&first, &second));
  }

  #[tokio::test]
  async fn test_preloaded_handle() {
    let handle = ModelHandle::preloaded(Box::new(MockEmbeddingModel::new()));
    assert!(handle.is_loaded());
    let model = handle.get().await.unwrap();
    assert_eq!(model.lock().unwrap().version(), "mock");
  }

  #[cfg(not(feature = "neural"))]
  #[tokio::test]
  async fn test_onnx_requires_feature() {
    let err = load_model(&EmbeddingConfig::Onnx).await.err().unwrap();
    assert!(err.to_string().contains("neural"));
  }
}

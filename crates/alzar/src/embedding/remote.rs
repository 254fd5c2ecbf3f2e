use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::runtime::Handle;
use url::Url;

use super::EmbeddingModel;

/// Request to compute embeddings (supports batching)
#[derive(Serialize)]
struct EmbeddingRequest<'a> {
  texts: &'a [String],
  id: String,
}

/// Response with computed embeddings, one per requested text
#[derive(Deserialize)]
struct EmbeddingResponse {
  #[serde(default)]
  embeddings: Vec<Vec<f32>>,
  #[serde(default)]
  error: Option<String>,
}

/// Embedding model served over HTTP.
///
/// POSTs `{"texts": [...], "id": "..."}` and expects
/// `{"embeddings": [[...], ...]}` back. Calls block the current thread, so
/// they must run off the async executor (e.g. inside `spawn_blocking`).
pub struct RemoteEmbeddingModel {
  client: reqwest::Client,
  url: Url,
  runtime: Handle,
}

impl RemoteEmbeddingModel {
  pub fn new(url: &str, timeout_secs: u64) -> Result<Self> {
    let url = Url::parse(url).map_err(|e| anyhow!("Invalid embedding service url {url}: {e}"))?;
    let client = reqwest::Client::builder().timeout(Duration::from_secs(timeout_secs)).build()?;
    let runtime =
      Handle::try_current().map_err(|_| anyhow!("Remote embedding model needs a tokio runtime"))?;

    Ok(Self { client, url, runtime })
  }

  async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let request = EmbeddingRequest { texts, id: uuid::Uuid::new_v4().to_string() };

    let response = self
      .client
      .post(self.url.clone())
      .json(&request)
      .send()
      .await
      .map_err(|e| anyhow!("Embedding service unreachable: {e}"))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(anyhow!("Embedding service returned {status}: {body}"));
    }

    let parsed: EmbeddingResponse = response.json().await?;
    if let Some(error) = parsed.error {
      return Err(anyhow!("Embedding service error: {error}"));
    }

    Ok(parsed.embeddings)
  }
}

impl EmbeddingModel for RemoteEmbeddingModel {
  fn compute_embeddings(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
      return Ok(vec![]);
    }

    self.runtime.block_on(self.request(texts))
  }

  fn version(&self) -> String {
    format!("remote:{}", self.url)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use mockito::Matcher;
  use serde_json::json;

  #[tokio::test(flavor = "multi_thread")]
  async fn test_remote_embeddings() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/embed")
      .match_body(Matcher::PartialJson(json!({ "texts": ["hope", "grief"] })))
      .with_header("content-type", "application/json")
      .with_body(json!({ "embeddings": [[1.0, 0.0], [0.0, 1.0]], "id": "x" }).to_string())
      .create_async()
      .await;

    let mut model = RemoteEmbeddingModel::new(&format!("{}/embed", server.url()), 5).unwrap();
    let texts = vec!["hope".to_string(), "grief".to_string()];
    let out = tokio::task::spawn_blocking(move || model.compute_embeddings(&texts))
      .await
      .unwrap()
      .unwrap();

    assert_eq!(out, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    mock.assert_async().await;
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn test_remote_error_field() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/embed")
      .with_body(json!({ "embeddings": [], "error": "model not loaded" }).to_string())
      .create_async()
      .await;

    let mut model = RemoteEmbeddingModel::new(&format!("{}/embed", server.url()), 5).unwrap();
    let err = tokio::task::spawn_blocking(move || model.compute_embeddings(&["a".to_string()]))
      .await
      .unwrap()
      .unwrap_err();

    assert!(err.to_string().contains("model not loaded"));
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn test_remote_http_failure() {
    let mut server = mockito::Server::new_async().await;
    server.mock("POST", "/embed").with_status(500).with_body("boom").create_async().await;

    let mut model = RemoteEmbeddingModel::new(&format!("{}/embed", server.url()), 5).unwrap();
    let err = tokio::task::spawn_blocking(move || model.compute_embeddings(&["a".to_string()]))
      .await
      .unwrap()
      .unwrap_err();

    assert!(err.to_string().contains("500"));
  }

  #[test]
  fn test_invalid_url() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let _guard = runtime.enter();
    assert!(RemoteEmbeddingModel::new("not a url", 5).is_err());
  }
}

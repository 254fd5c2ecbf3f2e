//! Error kinds surfaced at the request boundary

use thiserror::Error;

use crate::record::Field;

/// Failures a single request can end in. None of them are fatal to the process.
#[derive(Debug, Error)]
pub enum AppError {
  #[error("{} required", describe_missing(.missing))]
  Validation { missing: Vec<Field> },

  #[error("record store unavailable: {0}")]
  StoreUnavailable(String),

  #[error("embedding failed: {0}")]
  EmbeddingFailure(String),

  #[error("invalid configuration: {0}")]
  Config(String),
}

impl AppError {
  /// Stable machine-readable key used in API error envelopes
  pub fn key(&self) -> &'static str {
    match self {
      AppError::Validation { .. } => "validation_failed",
      AppError::StoreUnavailable(_) => "store_unavailable",
      AppError::EmbeddingFailure(_) => "embedding_failed",
      AppError::Config(_) => "invalid_config",
    }
  }
}

/// Errors raised by record store adapters
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("malformed row at line {line}: {reason}")]
  Malformed { line: usize, reason: String },

  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("store rejected request ({status}): {body}")]
  Rejected { status: u16, body: String },

  #[error("{0}")]
  Misconfigured(String),
}

impl From<StoreError> for AppError {
  fn from(err: StoreError) -> Self {
    AppError::StoreUnavailable(err.to_string())
  }
}

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {path}: {source}")]
  Read { path: String, source: std::io::Error },

  #[error("failed to parse {path}: {source}")]
  Parse { path: String, source: serde_yaml::Error },

  #[error("{0}")]
  Invalid(String),
}

impl From<ConfigError> for AppError {
  fn from(err: ConfigError) -> Self {
    AppError::Config(err.to_string())
  }
}

fn describe_missing(missing: &[Field]) -> String {
  let names: Vec<&str> = missing.iter().map(|f| f.label()).collect();
  match names.as_slice() {
    [] => "nothing".to_string(),
    [one] => format!("{one} is"),
    [init @ .., last] => format!("{} and {} are", init.join(", "), last),
  }
}

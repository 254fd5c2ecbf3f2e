//! Configuration management for alzar
//!
//! Loads the YAML configuration describing where records live, which
//! embedding model backs ranking, and how scores are computed. Every field
//! has a default, so a missing or empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::ranker::RankingConfig;

const CONFIG_FILE_NAME: &str = "alzar.yaml";
const HOME_CONFIG_FILE_NAME: &str = "config.yaml";
const REDACTED: &str = "<redacted>";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub server: ServerConfig,
  #[serde(default)]
  pub store: StoreConfig,
  #[serde(default)]
  pub embedding: EmbeddingConfig,
  #[serde(default)]
  pub ranking: RankingConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
  /// Address the REST server listens on
  #[serde(default = "default_bind")]
  pub bind: String,
}

/// Where submitted works are stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
  /// Append-only JSON lines file on local disk
  Jsonl {
    #[serde(default = "default_store_path")]
    path: PathBuf,
  },
  /// A Google Sheets worksheet; the first row holds the headers
  Sheets {
    spreadsheet_id: String,
    #[serde(default = "default_sheet")]
    sheet: String,
    access_token: String,
    #[serde(default = "default_sheets_base_url")]
    base_url: String,
  },
  /// Process memory only, lost on exit
  Memory,
}

/// Which embedding model backs ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EmbeddingConfig {
  Hashing {
    #[serde(default = "default_dimensions")]
    dimensions: usize,
  },
  Remote {
    url: String,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
  },
  Onnx,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
  /// JSON lines file receiving request activity
  #[serde(default = "default_activity_log")]
  pub activity_log: PathBuf,
}

fn default_bind() -> String {
  "127.0.0.1:3000".to_string()
}
fn default_store_path() -> PathBuf {
  data_dir().join("works.jsonl")
}
fn default_sheet() -> String {
  "Sheet1".to_string()
}
fn default_sheets_base_url() -> String {
  "https://sheets.googleapis.com".to_string()
}
fn default_dimensions() -> usize {
  384
}
fn default_timeout_secs() -> u64 {
  30
}
fn default_activity_log() -> PathBuf {
  data_dir().join("activity.jsonl")
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self { bind: default_bind() }
  }
}

impl Default for StoreConfig {
  fn default() -> Self {
    StoreConfig::Jsonl { path: default_store_path() }
  }
}

impl Default for EmbeddingConfig {
  fn default() -> Self {
    EmbeddingConfig::Hashing { dimensions: default_dimensions() }
  }
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self { activity_log: default_activity_log() }
  }
}

/// Base directory for alzar data: `$ALZAR_HOME` or `~/.alzar`
pub fn data_dir() -> PathBuf {
  if let Ok(home) = std::env::var("ALZAR_HOME") {
    if !home.trim().is_empty() {
      return PathBuf::from(home);
    }
  }

  dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".alzar")
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &Path) -> PathBuf {
  match path.strip_prefix("~") {
    Ok(rest) => dirs::home_dir().map(|home| home.join(rest)).unwrap_or_else(|| path.to_path_buf()),
    Err(_) => path.to_path_buf(),
  }
}

impl Config {
  /// Load configuration from a file
  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let content = std::fs::read_to_string(path)
      .map_err(|source| ConfigError::Read { path: display.clone(), source })?;

    let mut config: Config = if content.trim().is_empty() {
      Config::default()
    } else {
      serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse { path: display, source })?
    };

    config.expand_paths();
    config.validate()?;
    Ok(config)
  }

  /// Resolve the configuration: an explicit path wins, then `./alzar.yaml`,
  /// then `<data dir>/config.yaml`, then defaults
  pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
    if let Some(path) = explicit {
      tracing::debug!(path = %path.display(), "loading configuration");
      return Self::load_from_file(path);
    }

    let candidates = [PathBuf::from(CONFIG_FILE_NAME), data_dir().join(HOME_CONFIG_FILE_NAME)];
    for path in &candidates {
      if path.exists() {
        tracing::debug!(path = %path.display(), "loading configuration");
        return Self::load_from_file(path);
      }
    }

    // No config file found, use defaults
    let config = Config::default();
    config.validate()?;
    Ok(config)
  }

  /// Reject settings that would make every request fail
  pub fn validate(&self) -> Result<(), ConfigError> {
    self.ranking.validate().map_err(ConfigError::Invalid)?;

    match &self.embedding {
      EmbeddingConfig::Hashing { dimensions } if *dimensions == 0 => {
        return Err(ConfigError::Invalid("embedding.dimensions must be at least 1".to_string()));
      }
      EmbeddingConfig::Remote { url, .. } if url::Url::parse(url).is_err() => {
        return Err(ConfigError::Invalid(format!("embedding.url is not a valid url: {url}")));
      }
      _ => {}
    }

    if let StoreConfig::Sheets { spreadsheet_id, sheet, access_token, .. } = &self.store {
      for (name, value) in
        [("spreadsheet_id", spreadsheet_id), ("sheet", sheet), ("access_token", access_token)]
      {
        if value.trim().is_empty() {
          return Err(ConfigError::Invalid(format!("store.{name} must not be empty")));
        }
      }
    }

    Ok(())
  }

  /// Copy safe to print: credentials are masked
  pub fn redacted(&self) -> Config {
    let mut config = self.clone();
    if let StoreConfig::Sheets { access_token, .. } = &mut config.store {
      *access_token = REDACTED.to_string();
    }
    config
  }

  fn expand_paths(&mut self) {
    if let StoreConfig::Jsonl { path } = &mut self.store {
      *path = expand_home(path);
    }
    self.logging.activity_log = expand_home(&self.logging.activity_log);
  }
}

//! Persistent activity log
//!
//! Every API request and notable library event is appended to a JSON lines
//! file so it can be inspected later through `GET /logs` or `alzar logs`.
//! Entries are mirrored to `tracing` at the matching level.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Level {
  Debug,
  Info,
  Warn,
  Error,
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Level::Debug => "debug",
      Level::Info => "info",
      Level::Warn => "warn",
      Level::Error => "error",
    };
    f.write_str(name)
  }
}

impl FromStr for Level {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "debug" => Ok(Level::Debug),
      "info" => Ok(Level::Info),
      "warn" | "warning" => Ok(Level::Warn),
      "error" => Ok(Level::Error),
      other => Err(format!("unknown log level: {other}")),
    }
  }
}

/// Request details attached to an entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RequestContext {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub request_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub method: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status_code: Option<u16>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub duration_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActivityEntry {
  pub timestamp: DateTime<Utc>,
  pub level: Level,
  pub component: String,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub context: Option<RequestContext>,
}

/// Thread-safe JSON lines log; clones share the same file lock
#[derive(Clone)]
pub struct ActivityLog {
  path: Arc<PathBuf>,
  lock: Arc<Mutex<()>>,
}

impl ActivityLog {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: Arc::new(path.into()), lock: Arc::new(Mutex::new(())) }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Append an entry
  pub async fn record(
    &self,
    level: Level,
    component: &str,
    message: &str,
    context: Option<RequestContext>,
  ) -> std::io::Result<()> {
    mirror(level, component, message);

    let entry = ActivityEntry {
      timestamp: Utc::now(),
      level,
      component: component.to_string(),
      message: message.to_string(),
      context,
    };
    let mut line = serde_json::to_string(&entry)
      .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    line.push('\n');

    let _guard = self.lock.lock().await;
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent).await?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(self.path.as_ref()).await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await
  }

  /// Append an entry, ignoring write failures
  pub async fn log(&self, level: Level, component: &str, message: &str) {
    if let Err(e) = self.record(level, component, message, None).await {
      tracing::debug!(error = %e, "failed to write activity log");
    }
  }

  pub async fn log_request(&self, level: Level, message: &str, context: RequestContext) {
    if let Err(e) = self.record(level, "api", message, Some(context)).await {
      tracing::debug!(error = %e, "failed to write activity log");
    }
  }

  /// The most recent `limit` entries at `level` (all levels when `None`),
  /// oldest first. Unreadable lines are skipped.
  pub async fn entries(
    &self,
    limit: Option<usize>,
    level: Option<Level>,
  ) -> std::io::Result<Vec<ActivityEntry>> {
    let _guard = self.lock.lock().await;
    let content = match fs::read_to_string(self.path.as_ref()).await {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
      Err(e) => return Err(e),
    };

    let mut entries: Vec<ActivityEntry> = content
      .lines()
      .filter(|line| !line.trim().is_empty())
      .filter_map(|line| serde_json::from_str::<ActivityEntry>(line).ok())
      .filter(|entry| level.is_none_or(|wanted| entry.level == wanted))
      .collect();

    if let Some(limit) = limit {
      let skip = entries.len().saturating_sub(limit);
      entries.drain(..skip);
    }

    Ok(entries)
  }
}

fn mirror(level: Level, component: &str, message: &str) {
  match level {
    Level::Debug => tracing::debug!(component, "{message}"),
    Level::Info => tracing::info!(component, "{message}"),
    Level::Warn => tracing::warn!(component, "{message}"),
    Level::Error => tracing::error!(component, "{message}"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[tokio::test]
  async fn test_missing_file_has_no_entries() {
    let dir = TempDir::new().unwrap();
    let log = ActivityLog::new(dir.path().join("activity.jsonl"));
    assert!(log.entries(None, None).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_limit_keeps_most_recent_oldest_first() {
    let dir = TempDir::new().unwrap();
    let log = ActivityLog::new(dir.path().join("logs").join("activity.jsonl"));

    for i in 0..5 {
      log.log(Level::Info, "library", &format!("event {i}")).await;
    }

    let entries = log.entries(Some(2), None).await.unwrap();
    let messages: Vec<&str> = entries.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["event 3", "event 4"]);
  }

  #[tokio::test]
  async fn test_level_filter_and_context() {
    let dir = TempDir::new().unwrap();
    let log = ActivityLog::new(dir.path().join("activity.jsonl"));

    log.log(Level::Info, "api", "fine").await;
    log
      .log_request(
        Level::Error,
        "POST /recommend failed",
        RequestContext { status_code: Some(502), ..Default::default() },
      )
      .await;

    let errors = log.entries(None, Some(Level::Error)).await.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].component, "api");
    assert_eq!(errors[0].context.as_ref().unwrap().status_code, Some(502));
  }

  #[tokio::test]
  async fn test_malformed_lines_skipped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("activity.jsonl");
    fs::write(&path, "garbage\n").await.unwrap();

    let log = ActivityLog::new(&path);
    log.log(Level::Warn, "store", "slow").await;
    assert_eq!(log.entries(None, None).await.unwrap().len(), 1);
  }

  #[test]
  fn test_level_parsing() {
    assert_eq!("WARNING".parse::<Level>(), Ok(Level::Warn));
    assert_eq!("error".parse::<Level>(), Ok(Level::Error));
    assert!("loud".parse::<Level>().is_err());
    assert_eq!(Level::Debug.to_string(), "debug");
  }
}

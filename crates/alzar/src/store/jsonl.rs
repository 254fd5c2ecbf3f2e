use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::RecordStore;
use crate::error::StoreError;
use crate::record::{Field, Row};

/// Works stored one JSON object per line, keyed by column header
pub struct JsonlStore {
  path: PathBuf,
}

impl JsonlStore {
  pub fn new(path: PathBuf) -> Self {
    Self { path }
  }
}

#[async_trait]
impl RecordStore for JsonlStore {
  async fn append_row(&self, values: &[String]) -> Result<(), StoreError> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent).await?;
    }

    let row: Row = Field::headers().into_iter().zip(values.iter().cloned()).collect();
    let mut line = serde_json::to_string(&row)
      .map_err(|e| StoreError::Malformed { line: 0, reason: e.to_string() })?;
    line.push('\n');

    let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;

    Ok(())
  }

  async fn get_all_records(&self) -> Result<Vec<Row>, StoreError> {
    let content = match fs::read_to_string(&self.path).await {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
      Err(e) => return Err(e.into()),
    };

    content
      .lines()
      .enumerate()
      .filter(|(_, line)| !line.trim().is_empty())
      .map(|(index, line)| {
        serde_json::from_str::<Row>(line)
          .map_err(|e| StoreError::Malformed { line: index + 1, reason: e.to_string() })
      })
      .collect()
  }

  fn describe(&self) -> String {
    format!("jsonl:{}", self.path.display())
  }
}

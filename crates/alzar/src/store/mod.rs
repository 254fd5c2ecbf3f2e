//! Record store abstraction
//!
//! Works are appended as ordered rows and read back in append order as
//! header-keyed maps. Implementations (a local JSON lines file, a Google
//! Sheets worksheet, process memory) can be swapped without touching the
//! request pipeline.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::record::Row;

mod jsonl;
mod memory;
mod sheets;

pub use jsonl::JsonlStore;
pub use memory::MemoryStore;
pub use sheets::SheetsStore;

/// Append-only storage for submitted works
#[async_trait]
pub trait RecordStore: Send + Sync {
  /// Append one row, values in store column order
  async fn append_row(&self, values: &[String]) -> Result<(), StoreError>;

  /// Every stored row, earliest first
  async fn get_all_records(&self) -> Result<Vec<Row>, StoreError>;

  /// Short human readable description for status output
  fn describe(&self) -> String;
}

/// Build the store selected by the configuration
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn RecordStore>, StoreError> {
  let store: Arc<dyn RecordStore> = match config {
    StoreConfig::Jsonl { path } => Arc::new(JsonlStore::new(path.clone())),
    StoreConfig::Sheets { spreadsheet_id, sheet, access_token, base_url } => {
      Arc::new(SheetsStore::new(base_url, spreadsheet_id, sheet, access_token)?)
    }
    StoreConfig::Memory => Arc::new(MemoryStore::new()),
  };

  tracing::debug!(store = %store.describe(), "record store ready");
  Ok(store)
}

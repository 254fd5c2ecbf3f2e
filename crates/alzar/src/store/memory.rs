use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::RecordStore;
use crate::error::StoreError;
use crate::record::{Field, Row};

/// In-process store. Useful for tests and throwaway servers.
#[derive(Default)]
pub struct MemoryStore {
  rows: RwLock<Vec<Vec<String>>>,
  appends: AtomicUsize,
  reads: AtomicUsize,
  unavailable: AtomicBool,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Start with rows already stored, values in column order
  pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
    Self { rows: RwLock::new(rows), ..Default::default() }
  }

  /// Make every subsequent call fail, or recover
  pub fn set_unavailable(&self, unavailable: bool) {
    self.unavailable.store(unavailable, Ordering::SeqCst);
  }

  /// Number of `append_row` calls received, including failed ones
  pub fn append_count(&self) -> usize {
    self.appends.load(Ordering::SeqCst)
  }

  /// Number of `get_all_records` calls received
  pub fn read_count(&self) -> usize {
    self.reads.load(Ordering::SeqCst)
  }

  fn check_available(&self) -> Result<(), StoreError> {
    if self.unavailable.load(Ordering::SeqCst) {
      return Err(StoreError::Misconfigured("memory store marked unavailable".to_string()));
    }
    Ok(())
  }
}

#[async_trait]
impl RecordStore for MemoryStore {
  async fn append_row(&self, values: &[String]) -> Result<(), StoreError> {
    self.appends.fetch_add(1, Ordering::SeqCst);
    self.check_available()?;
    self.rows.write().await.push(values.to_vec());
    Ok(())
  }

  async fn get_all_records(&self) -> Result<Vec<Row>, StoreError> {
    self.reads.fetch_add(1, Ordering::SeqCst);
    self.check_available()?;

    let headers = Field::headers();
    Ok(
      self
        .rows
        .read()
        .await
        .iter()
        .map(|values| headers.iter().cloned().zip(values.iter().cloned()).collect())
        .collect(),
    )
  }

  fn describe(&self) -> String {
    "memory".to_string()
  }
}

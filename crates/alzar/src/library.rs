//! The request pipeline shared by the CLI and the REST server
//!
//! A [`Library`] owns the injected record store and embedding model, the
//! cached record collection and the ranker. Each call is one linear request:
//! load, maybe append, maybe rank.

use std::sync::Arc;
use std::time::Duration;

use crate::activity::{ActivityLog, Level};
use crate::cache::TtlCache;
use crate::embedding::ModelHandle;
use crate::error::AppError;
use crate::ranker::{split_terms, RankedResult, Ranker, RankingConfig};
use crate::record::{Record, Submission};
use crate::store::RecordStore;

/// Outcome of a recommendation request
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
  /// Nothing has been submitted yet
  NoData,
  /// Blank query: every record, most recent first
  Unranked(Vec<Record>),
  /// Best matches first
  Ranked(Vec<RankedResult>),
}

pub struct Library {
  store: Arc<dyn RecordStore>,
  model: Arc<ModelHandle>,
  ranker: Arc<Ranker>,
  cache: TtlCache<Vec<Record>>,
  activity: Option<ActivityLog>,
}

impl Library {
  pub fn new(store: Arc<dyn RecordStore>, model: Arc<ModelHandle>, config: RankingConfig) -> Self {
    let cache = TtlCache::new(Duration::from_secs(config.cache_ttl_secs));
    Self { store, model, ranker: Arc::new(Ranker::new(config)), cache, activity: None }
  }

  /// Also write submissions and failures to an activity log
  pub fn with_activity_log(mut self, activity: ActivityLog) -> Self {
    self.activity = Some(activity);
    self
  }

  pub fn ranking_config(&self) -> &RankingConfig {
    self.ranker.config()
  }

  pub fn store_description(&self) -> String {
    self.store.describe()
  }

  pub fn model_loaded(&self) -> bool {
    self.model.is_loaded()
  }

  /// Validate and store a submission. Nothing reaches the store when a
  /// required field is blank.
  pub async fn submit(&self, submission: Submission) -> Result<Record, AppError> {
    let row = submission.into_row()?;

    if let Err(e) = self.store.append_row(&row).await {
      self.note(Level::Error, &format!("append failed: {e}")).await;
      return Err(e.into());
    }
    self.cache.invalidate().await;

    let record = Record::from_values(&row);
    self.note(Level::Info, &format!("stored \"{}\" by {}", record.title, record.author)).await;
    Ok(record)
  }

  /// Every record in append order, reusing the cached load while fresh
  pub async fn records(&self) -> Result<Vec<Record>, AppError> {
    let records = self
      .cache
      .get_or_refresh(|| async {
        let rows = self.store.get_all_records().await?;
        tracing::debug!(rows = rows.len(), "loaded records from store");
        Ok::<_, AppError>(rows.iter().map(Record::from_row).collect::<Vec<_>>())
      })
      .await;

    if let Err(e) = &records {
      self.note(Level::Error, &format!("load failed: {e}")).await;
    }
    records
  }

  /// Most recent records first, at most `limit` of them
  pub async fn recent(&self, limit: Option<usize>) -> Result<Vec<Record>, AppError> {
    let mut records = self.records().await?;
    records.reverse();
    if let Some(limit) = limit {
      records.truncate(limit);
    }
    Ok(records)
  }

  /// Rank stored works against `query`.
  ///
  /// A blank query lists every record most recent first without touching the
  /// embedding model; an empty store yields [`Recommendation::NoData`].
  pub async fn recommend(&self, query: &str) -> Result<Recommendation, AppError> {
    let records = self.records().await?;
    if records.is_empty() {
      return Ok(Recommendation::NoData);
    }

    if split_terms(query).is_empty() {
      let mut records = records;
      records.reverse();
      return Ok(Recommendation::Unranked(records));
    }

    let model = self.model.get().await.map_err(|e| AppError::EmbeddingFailure(e.to_string()))?;
    let ranker = self.ranker.clone();
    let query = query.to_string();

    let ranked = tokio::task::spawn_blocking(move || {
      let mut model = model
        .lock()
        .map_err(|_| AppError::EmbeddingFailure("embedding model lock poisoned".to_string()))?;
      ranker.rank(&mut **model, &query, &records)
    })
    .await
    .map_err(|e| AppError::EmbeddingFailure(format!("ranking task failed: {e}")))?;

    match ranked {
      Ok(results) => Ok(Recommendation::Ranked(results)),
      Err(e) => {
        self.note(Level::Error, &format!("ranking failed: {e}")).await;
        Err(e)
      }
    }
  }

  async fn note(&self, level: Level, message: &str) {
    match &self.activity {
      Some(activity) => activity.log(level, "library", message).await,
      None => tracing::debug!(level = %level, "{message}"),
    }
  }
}

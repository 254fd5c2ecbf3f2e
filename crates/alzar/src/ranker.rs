//! Query ranking
//!
//! Turns a free-text query and the current record collection into the top-k
//! most similar works. The query is split into comma-separated terms, each
//! term is embedded and the term vectors are averaged into one query vector.
//! Records are embedded in a single batch and compared by cosine similarity,
//! optionally blended with a keyword-overlap count.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::embedding::EmbeddingModel;
use crate::error::AppError;
use crate::record::{Field, Record};
use crate::similarity::{cosine_similarity, mean_vector};

/// How the final score of a record is computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum Scoring {
  /// Cosine similarity against the combined text
  Cosine,
  /// `similarity_weight * similarity + keyword_weight * keyword_score`
  KeywordBlend {
    #[serde(default = "default_similarity_weight")]
    similarity_weight: f32,
    #[serde(default = "default_keyword_weight")]
    keyword_weight: f32,
  },
  /// Emotions and opinion embedded separately, similarities blended
  FieldSplit {
    #[serde(default = "default_emotion_weight")]
    emotion_weight: f32,
    #[serde(default = "default_opinion_weight")]
    opinion_weight: f32,
  },
}

fn default_similarity_weight() -> f32 {
  0.7
}
fn default_keyword_weight() -> f32 {
  0.3
}
fn default_emotion_weight() -> f32 {
  0.3
}
fn default_opinion_weight() -> f32 {
  0.7
}

impl Scoring {
  /// The 0.7 similarity / 0.3 keyword preset
  pub fn keyword_blend() -> Self {
    Scoring::KeywordBlend {
      similarity_weight: default_similarity_weight(),
      keyword_weight: default_keyword_weight(),
    }
  }

  /// The 0.3 emotion / 0.7 opinion preset
  pub fn field_split() -> Self {
    Scoring::FieldSplit {
      emotion_weight: default_emotion_weight(),
      opinion_weight: default_opinion_weight(),
    }
  }

  fn weights(&self) -> Vec<f32> {
    match self {
      Scoring::Cosine => vec![],
      Scoring::KeywordBlend { similarity_weight, keyword_weight } => {
        vec![*similarity_weight, *keyword_weight]
      }
      Scoring::FieldSplit { emotion_weight, opinion_weight } => {
        vec![*emotion_weight, *opinion_weight]
      }
    }
  }
}

/// Ranking options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RankingConfig {
  /// Number of results returned
  #[serde(default = "default_top_k")]
  pub top_k: usize,
  /// How long a loaded record collection is reused
  #[serde(default = "default_cache_ttl_secs")]
  pub cache_ttl_secs: u64,
  /// Fields concatenated into the text embedded for each record
  #[serde(default = "default_combined_fields")]
  pub combined_fields: Vec<Field>,
  #[serde(default = "default_scoring")]
  pub scoring: Scoring,
}

fn default_top_k() -> usize {
  5
}
fn default_cache_ttl_secs() -> u64 {
  600
}
fn default_combined_fields() -> Vec<Field> {
  vec![Field::Genre, Field::Emotions, Field::Opinion]
}
fn default_scoring() -> Scoring {
  Scoring::Cosine
}

impl Default for RankingConfig {
  fn default() -> Self {
    Self {
      top_k: default_top_k(),
      cache_ttl_secs: default_cache_ttl_secs(),
      combined_fields: default_combined_fields(),
      scoring: default_scoring(),
    }
  }
}

impl RankingConfig {
  pub fn validate(&self) -> Result<(), String> {
    if self.top_k == 0 {
      return Err("ranking.top_k must be at least 1".to_string());
    }
    if self.combined_fields.is_empty() {
      return Err("ranking.combined_fields must name at least one field".to_string());
    }
    if self.scoring.weights().iter().any(|w| !w.is_finite()) {
      return Err("ranking.scoring weights must be finite numbers".to_string());
    }
    Ok(())
  }
}

/// A record with its score and the parts that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RankedResult {
  pub record: Record,
  pub score: f32,
  /// Cosine similarity to the query (weighted per field in field-split mode)
  pub similarity: f32,
  /// Number of term/field substring matches
  pub keyword_score: f32,
}

/// Split a query on commas, trimming terms and dropping empty ones
pub fn split_terms(query: &str) -> Vec<String> {
  query.split(',').map(str::trim).filter(|term| !term.is_empty()).map(String::from).collect()
}

/// One point per (term, field) pair where the field contains the term,
/// ignoring case
pub fn keyword_score(record: &Record, terms: &[String]) -> f32 {
  let fields: Vec<String> =
    Field::KEYWORD_FIELDS.iter().map(|f| record.field(*f).to_lowercase()).collect();

  terms
    .iter()
    .map(|term| term.to_lowercase())
    .map(|term| fields.iter().filter(|field| field.contains(&term)).count())
    .sum::<usize>() as f32
}

pub struct Ranker {
  config: RankingConfig,
}

impl Ranker {
  pub fn new(config: RankingConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &RankingConfig {
    &self.config
  }

  /// Rank `records` against `query`, best first, at most `top_k` entries.
  ///
  /// Returns an empty list without touching the model when there are no
  /// records or the query has no terms. The model is called once for the
  /// terms and once for the records.
  pub fn rank(
    &self,
    model: &mut dyn EmbeddingModel,
    query: &str,
    records: &[Record],
  ) -> Result<Vec<RankedResult>, AppError> {
    let terms = split_terms(query);
    if records.is_empty() || terms.is_empty() {
      return Ok(vec![]);
    }

    let term_vectors = embed(model, &terms)?;
    let query_vector = mean_vector(&term_vectors).ok_or_else(|| {
      AppError::EmbeddingFailure("query term vectors have inconsistent dimensions".to_string())
    })?;

    let similarities = self.similarities(model, &query_vector, records)?;

    let mut results: Vec<RankedResult> = records
      .iter()
      .zip(similarities)
      .map(|(record, similarity)| {
        let keyword_score = keyword_score(record, &terms);
        let score = match &self.config.scoring {
          Scoring::KeywordBlend { similarity_weight, keyword_weight } => {
            similarity_weight * similarity + keyword_weight * keyword_score
          }
          Scoring::Cosine | Scoring::FieldSplit { .. } => similarity,
        };
        // NaN would break the sort order; such records rank last
        let score = if score.is_finite() { score } else { f32::NEG_INFINITY };
        RankedResult { record: record.clone(), score, similarity, keyword_score }
      })
      .collect();

    // sort_by is stable, ties keep insertion order
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results.truncate(self.config.top_k);

    tracing::debug!(
      terms = terms.len(),
      records = records.len(),
      returned = results.len(),
      "ranked records"
    );

    Ok(results)
  }

  /// Similarity of every record to the query vector, in record order
  fn similarities(
    &self,
    model: &mut dyn EmbeddingModel,
    query: &[f32],
    records: &[Record],
  ) -> Result<Vec<f32>, AppError> {
    match &self.config.scoring {
      Scoring::Cosine | Scoring::KeywordBlend { .. } => {
        let documents: Vec<String> =
          records.iter().map(|r| r.combined_text(&self.config.combined_fields)).collect();
        let vectors = embed(model, &documents)?;
        Ok(vectors.iter().map(|v| cosine_similarity(query, v)).collect())
      }
      Scoring::FieldSplit { emotion_weight, opinion_weight } => {
        // emotions first, then opinions, in one batch
        let documents: Vec<String> = records
          .iter()
          .map(|r| r.emotions.clone())
          .chain(records.iter().map(|r| r.opinion.clone()))
          .collect();
        let vectors = embed(model, &documents)?;
        let (emotions, opinions) = vectors.split_at(records.len());

        Ok(
          emotions
            .iter()
            .zip(opinions)
            .map(|(emotion, opinion)| {
              emotion_weight * cosine_similarity(query, emotion)
                + opinion_weight * cosine_similarity(query, opinion)
            })
            .collect(),
        )
      }
    }
  }
}

/// Embed a batch, insisting on one vector per text
fn embed(model: &mut dyn EmbeddingModel, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
  let vectors = model.compute_embeddings(texts).map_err(|e| {
    tracing::warn!(error = %e, "embedding model failed");
    AppError::EmbeddingFailure(e.to_string())
  })?;

  if vectors.len() != texts.len() {
    return Err(AppError::EmbeddingFailure(format!(
      "model returned {} vectors for {} texts",
      vectors.len(),
      texts.len()
    )));
  }

  Ok(vectors)
}

//! REST API types with schemars annotations for OpenAPI generation

use axum::{http::StatusCode, response::Json};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::activity::ActivityEntry;
use crate::error::AppError;
use crate::ranker::{RankedResult, RankingConfig};
use crate::record::Record;

// Base Response Structure
// ======================

/// Base response object for all API endpoints
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BaseResponse<T> {
  /// API versioning information
  pub versioning: VersionInfo,

  /// Transaction ID for logging correlation
  pub transaction_id: Uuid,

  /// Optional error information
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub errors: Vec<ApiError>,

  /// Response data (generic for different endpoint types)
  #[serde(flatten)]
  pub data: T,
}

/// API versioning information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionInfo {
  pub latest: String,
  pub requested: String,
  pub resolved: String,
}

/// API error information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiError {
  /// Error key, unique to the error source
  pub key: String,

  /// Human readable error message
  pub message: String,

  /// Additional error context
  #[serde(default)]
  pub context: serde_json::Value,
}

/// Failed request: status code plus error envelope
pub type ApiFailure = (StatusCode, Json<BaseResponse<()>>);

pub type ApiResult<T> = Result<Json<BaseResponse<T>>, ApiFailure>;

// Status/Version Endpoints
// =======================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionResponse {
  pub version: String,
}

/// Response for /status endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StatusResponse {
  pub status: String,
  pub version: String,
  /// Where records are stored
  pub store: String,
  /// Whether the embedding model has been loaded yet
  pub model_loaded: bool,
  pub uptime_secs: i64,
}

/// Response for /config endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ConfigResponse {
  pub ranking: RankingConfig,
}

// Logs Endpoint
// =============

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct LogsQuery {
  pub limit: Option<usize>,
  /// debug, info, warn or error; all levels when absent
  pub level: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LogsResponse {
  pub logs: Vec<ActivityEntry>,
}

// Works Endpoints
// ===============

/// Response for POST /works
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SubmitWorkResponse {
  /// The work as stored
  pub work: Record,
  pub message: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListWorksQuery {
  pub limit: Option<usize>,
}

/// Response for GET /works, most recent first
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListWorksResponse {
  pub works: Vec<Record>,
  pub count: usize,
}

// Recommendation Endpoint
// =======================

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct RecommendRequest {
  /// Comma separated terms; blank lists every work
  #[serde(default)]
  pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecommendOutcome {
  Ranked,
  Unranked,
  NoData,
}

/// Response for POST /recommend
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecommendResponse {
  pub outcome: RecommendOutcome,
  /// Ranked matches, best first
  #[serde(default)]
  pub results: Vec<RankedResult>,
  /// Every work, most recent first, for a blank query
  #[serde(default)]
  pub works: Vec<Record>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
}

// Helper Functions
// ================

impl<T> BaseResponse<T> {
  /// Create a successful response
  pub fn success(data: T, transaction_id: Uuid) -> Self {
    Self { versioning: VersionInfo::current(), transaction_id, errors: Vec::new(), data }
  }
}

impl BaseResponse<()> {
  /// Create an error response
  pub fn error(errors: Vec<ApiError>, transaction_id: Uuid) -> Self {
    Self { versioning: VersionInfo::current(), transaction_id, errors, data: () }
  }
}

impl VersionInfo {
  fn current() -> Self {
    let version = env!("CARGO_PKG_VERSION");
    Self {
      latest: version.to_string(),
      requested: version.to_string(),
      resolved: version.to_string(),
    }
  }
}

impl ApiError {
  pub fn new(key: &str, message: &str) -> Self {
    Self { key: key.to_string(), message: message.to_string(), context: serde_json::Value::Null }
  }

  pub fn with_context(mut self, context: serde_json::Value) -> Self {
    self.context = context;
    self
  }
}

/// HTTP status for a failed request
pub fn status_for(err: &AppError) -> StatusCode {
  match err {
    AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    AppError::EmbeddingFailure(_) => StatusCode::BAD_GATEWAY,
    AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

/// Render an error as status code plus envelope
pub fn failure(err: &AppError, transaction_id: Uuid) -> ApiFailure {
  let mut error = ApiError::new(err.key(), &err.to_string());
  if let AppError::Validation { missing } = err {
    error = error.with_context(serde_json::json!({ "missing": missing }));
  }

  (status_for(err), Json(BaseResponse::error(vec![error], transaction_id)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::Field;

  #[test]
  fn test_status_mapping() {
    assert_eq!(
      status_for(&AppError::Validation { missing: vec![Field::Opinion] }),
      StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(status_for(&AppError::StoreUnavailable("x".into())), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(status_for(&AppError::EmbeddingFailure("x".into())), StatusCode::BAD_GATEWAY);
  }

  #[test]
  fn test_failure_envelope_lists_missing_fields() {
    let (status, Json(body)) =
      failure(&AppError::Validation { missing: vec![Field::Title] }, Uuid::nil());
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["errors"][0]["key"], "validation_failed");
    assert_eq!(json["errors"][0]["context"]["missing"][0], "title");
    assert_eq!(json["versioning"]["latest"], env!("CARGO_PKG_VERSION"));
  }

  #[test]
  fn test_success_flattens_data() {
    let body =
      BaseResponse::success(VersionResponse { version: "1.0".to_string() }, Uuid::nil());
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["version"], "1.0");
    assert!(json.get("errors").is_none());
  }
}

//! Status, version and configuration endpoint handlers

use axum::extract::{Extension, State};
use axum::response::Json;
use chrono::Utc;

use crate::server::middleware::RequestId;
use crate::server::types::{BaseResponse, ConfigResponse, StatusResponse, VersionResponse};
use crate::server::AppState;

/// GET /status - Health check endpoint
pub async fn status(
  State(state): State<AppState>,
  Extension(RequestId(transaction_id)): Extension<RequestId>,
) -> Json<BaseResponse<StatusResponse>> {
  let response = StatusResponse {
    status: "healthy".to_string(),
    version: env!("CARGO_PKG_VERSION").to_string(),
    store: state.library.store_description(),
    model_loaded: state.library.model_loaded(),
    uptime_secs: (Utc::now() - state.started_at).num_seconds(),
  };

  Json(BaseResponse::success(response, transaction_id))
}

/// GET /version - Returns current API version
pub async fn version(
  Extension(RequestId(transaction_id)): Extension<RequestId>,
) -> Json<BaseResponse<VersionResponse>> {
  let response = VersionResponse { version: env!("CARGO_PKG_VERSION").to_string() };
  Json(BaseResponse::success(response, transaction_id))
}

/// GET /config - Effective ranking configuration
pub async fn config(
  State(state): State<AppState>,
  Extension(RequestId(transaction_id)): Extension<RequestId>,
) -> Json<BaseResponse<ConfigResponse>> {
  let response = ConfigResponse { ranking: state.library.ranking_config().clone() };
  Json(BaseResponse::success(response, transaction_id))
}

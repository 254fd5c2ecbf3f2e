//! Logs endpoint handler

use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::Json;

use crate::activity::Level;
use crate::server::middleware::RequestId;
use crate::server::types::{ApiError, ApiResult, BaseResponse, LogsQuery, LogsResponse};
use crate::server::AppState;

const DEFAULT_LOG_LIMIT: usize = 100;

/// GET /logs - Recent activity log entries
pub async fn get_logs(
  State(state): State<AppState>,
  Extension(RequestId(transaction_id)): Extension<RequestId>,
  Query(query): Query<LogsQuery>,
) -> ApiResult<LogsResponse> {
  let level = match query.level.as_deref().filter(|l| *l != "all") {
    None => None,
    Some(raw) => match raw.parse::<Level>() {
      Ok(level) => Some(level),
      Err(message) => {
        let error = ApiError::new("invalid_level", &message);
        return Err((StatusCode::BAD_REQUEST, Json(BaseResponse::error(vec![error], transaction_id))));
      }
    },
  };

  match state.activity.entries(Some(query.limit.unwrap_or(DEFAULT_LOG_LIMIT)), level).await {
    Ok(logs) => Ok(Json(BaseResponse::success(LogsResponse { logs }, transaction_id))),
    Err(e) => {
      let error = ApiError::new("logs_read_failed", &format!("Failed to read logs: {e}"));
      Err((StatusCode::INTERNAL_SERVER_ERROR, Json(BaseResponse::error(vec![error], transaction_id))))
    }
  }
}

//! Works endpoint handlers

use axum::extract::{Extension, Json, Query, State};
use axum::response::Json as ResponseJson;

use crate::record::Submission;
use crate::server::middleware::RequestId;
use crate::server::types::{
  failure, ApiResult, BaseResponse, ListWorksQuery, ListWorksResponse, SubmitWorkResponse,
};
use crate::server::AppState;

/// POST /works - Validate and store a submitted work
pub async fn submit_work(
  State(state): State<AppState>,
  Extension(RequestId(transaction_id)): Extension<RequestId>,
  Json(submission): Json<Submission>,
) -> ApiResult<SubmitWorkResponse> {
  match state.library.submit(submission).await {
    Ok(work) => {
      let message = format!("Saved \"{}\" by {}", work.title, work.author);
      Ok(ResponseJson(BaseResponse::success(SubmitWorkResponse { work, message }, transaction_id)))
    }
    Err(e) => Err(failure(&e, transaction_id)),
  }
}

/// GET /works - Recent works, most recent first
pub async fn list_works(
  State(state): State<AppState>,
  Extension(RequestId(transaction_id)): Extension<RequestId>,
  Query(query): Query<ListWorksQuery>,
) -> ApiResult<ListWorksResponse> {
  match state.library.recent(query.limit).await {
    Ok(works) => {
      let count = works.len();
      Ok(ResponseJson(BaseResponse::success(ListWorksResponse { works, count }, transaction_id)))
    }
    Err(e) => Err(failure(&e, transaction_id)),
  }
}

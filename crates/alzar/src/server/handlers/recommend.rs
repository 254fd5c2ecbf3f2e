//! Recommendation endpoint handler

use axum::extract::{Extension, Json, State};
use axum::response::Json as ResponseJson;

use crate::library::Recommendation;
use crate::server::middleware::RequestId;
use crate::server::types::{
  failure, ApiResult, BaseResponse, RecommendOutcome, RecommendRequest, RecommendResponse,
};
use crate::server::AppState;

/// POST /recommend - Rank stored works against a comma separated query
pub async fn recommend(
  State(state): State<AppState>,
  Extension(RequestId(transaction_id)): Extension<RequestId>,
  Json(request): Json<RecommendRequest>,
) -> ApiResult<RecommendResponse> {
  let recommendation = match state.library.recommend(&request.query).await {
    Ok(recommendation) => recommendation,
    Err(e) => return Err(failure(&e, transaction_id)),
  };

  let response = match recommendation {
    Recommendation::NoData => RecommendResponse {
      outcome: RecommendOutcome::NoData,
      results: vec![],
      works: vec![],
      message: Some("No works have been submitted yet".to_string()),
    },
    Recommendation::Unranked(works) => RecommendResponse {
      outcome: RecommendOutcome::Unranked,
      results: vec![],
      works,
      message: None,
    },
    Recommendation::Ranked(results) => RecommendResponse {
      outcome: RecommendOutcome::Ranked,
      results,
      works: vec![],
      message: None,
    },
  };

  Ok(ResponseJson(BaseResponse::success(response, transaction_id)))
}

//! Axum router configuration for all endpoints

use axum::{
  middleware::from_fn_with_state,
  routing::{get, post},
  Router,
};

use crate::server::handlers::{logs, recommend, status, works};
use crate::server::middleware::request_logging;
use crate::server::AppState;

/// Create the application router with request logging attached
pub fn create_router(state: AppState) -> Router {
  Router::new()
    // Status and version endpoints
    .route("/status", get(status::status))
    .route("/version", get(status::version))
    .route("/config", get(status::config))
    // Logs endpoint
    .route("/logs", get(logs::get_logs))
    // Works endpoints
    .route("/works", post(works::submit_work).get(works::list_works))
    .route("/recommend", post(recommend::recommend))
    .layer(from_fn_with_state(state.clone(), request_logging))
    .with_state(state)
}

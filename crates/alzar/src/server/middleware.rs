//! Request logging middleware
//!
//! Tags every request with an id (exposed to handlers as [`RequestId`] and
//! used as the response transaction id) and records its outcome in the
//! activity log.

use axum::{
  extract::{Request, State},
  middleware::Next,
  response::Response,
};
use std::time::Instant;
use uuid::Uuid;

use crate::activity::{Level, RequestContext};
use crate::server::AppState;

/// Id assigned to the current request
#[derive(Debug, Clone, Copy)]
pub struct RequestId(pub Uuid);

pub async fn request_logging(
  State(state): State<AppState>,
  mut request: Request,
  next: Next,
) -> Response {
  let request_id = Uuid::new_v4();
  let method = request.method().to_string();
  let path = request.uri().path().to_string();
  request.extensions_mut().insert(RequestId(request_id));

  let start = Instant::now();
  let response = next.run(request).await;
  let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

  let status = response.status();
  let level = if status.is_server_error() {
    Level::Error
  } else if status.is_client_error() {
    Level::Warn
  } else {
    Level::Info
  };

  let context = RequestContext {
    request_id: Some(request_id.to_string()),
    method: Some(method.clone()),
    path: Some(path.clone()),
    status_code: Some(status.as_u16()),
    duration_ms: Some(duration_ms),
  };
  state.activity.log_request(level, &format!("{method} {path} -> {}", status.as_u16()), context).await;

  response
}

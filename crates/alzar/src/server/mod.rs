//! REST API module for alzar
//!
//! Exposes submission, listing and recommendation over HTTP. Uses axum for
//! routing and schemars for OpenAPI documentation generation.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::activity::ActivityLog;
use crate::library::Library;

pub mod handlers;
pub mod middleware;
pub mod routing;
pub mod startup;
pub mod types;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
  pub library: Arc<Library>,
  pub activity: ActivityLog,
  pub started_at: DateTime<Utc>,
}

impl AppState {
  pub fn new(library: Arc<Library>, activity: ActivityLog) -> Self {
    Self { library, activity, started_at: Utc::now() }
  }
}

//! REST server startup and configuration

use anyhow::{Context, Result};
use axum::serve;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::activity::{ActivityLog, Level};
use crate::config::Config;
use crate::embedding::ModelHandle;
use crate::library::Library;
use crate::server::routing::create_router;
use crate::server::AppState;
use crate::store::build_store;

/// Wire store, model and activity log together from configuration
pub fn build_state(config: &Config) -> Result<AppState> {
  let store = build_store(&config.store).context("failed to set up record store")?;
  let model = Arc::new(ModelHandle::new(config.embedding.clone()));
  let activity = ActivityLog::new(config.logging.activity_log.clone());

  let library =
    Library::new(store, model, config.ranking.clone()).with_activity_log(activity.clone());
  Ok(AppState::new(Arc::new(library), activity))
}

/// Start the REST server and run until ctrl-c
pub async fn start_server(config: Config, addr: SocketAddr) -> Result<()> {
  let state = build_state(&config)?;
  let activity = state.activity.clone();

  activity
    .log(Level::Info, "server", &format!("Starting alzar REST server on {addr}"))
    .await;

  let app = create_router(state).layer(
    ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()),
  );

  let listener =
    TcpListener::bind(addr).await.with_context(|| format!("failed to bind {addr}"))?;
  activity.log(Level::Info, "server", &format!("Server listening on {addr}")).await;

  match serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
    Ok(_) => {
      activity.log(Level::Info, "server", "Server shutdown gracefully").await;
      Ok(())
    }
    Err(e) => {
      activity.log(Level::Error, "server", &format!("Server error: {e}")).await;
      Err(anyhow::anyhow!("Server error: {}", e))
    }
  }
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!(error = %e, "failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
}

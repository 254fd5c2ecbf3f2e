//! Alzar REST Server
//!
//! HTTP API for submitting works, listing them and requesting
//! recommendations.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use alzar::config::Config;
use alzar::server::startup::start_server;

#[derive(Parser)]
#[command(name = "alzar_server")]
#[command(about = "Alzar REST API Server")]
#[command(version)]
struct Args {
  /// Configuration file (defaults to ./alzar.yaml, then ~/.alzar/config.yaml)
  #[arg(long, env = "ALZAR_CONFIG")]
  config: Option<PathBuf>,

  /// Server bind address, overrides server.bind from the configuration
  #[arg(long)]
  bind: Option<SocketAddr>,

  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let default_filter = if args.verbose { "info" } else { "alzar=info,warn" };
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
  tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

  let config = Config::load(args.config.as_deref())?;
  let bind = match args.bind {
    Some(bind) => bind,
    None => config.server.bind.parse()?,
  };

  tracing::info!("Starting Alzar REST Server v{}", env!("CARGO_PKG_VERSION"));
  tracing::info!("Binding to address: {}", bind);

  start_server(config, bind).await
}

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use alzar::commands;
use alzar::config::Config;
use alzar::record::Submission;
use alzar::server::startup::build_state;

#[derive(Parser)]
#[command(name = "alzar")]
#[command(about = "Alzar - share the works you read and find similar ones")]
#[command(version)]
struct Cli {
  /// Configuration file (defaults to ./alzar.yaml, then ~/.alzar/config.yaml)
  #[arg(long, global = true, env = "ALZAR_CONFIG")]
  config: Option<PathBuf>,

  /// Enable verbose logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

/// Fields of a submitted work
#[derive(Args)]
struct WorkArgs {
  /// Title of the work (required)
  #[arg(long, default_value = "")]
  title: String,
  /// Author (required)
  #[arg(long, default_value = "")]
  author: String,
  #[arg(long, default_value = "")]
  country: String,
  /// Period or era the work belongs to
  #[arg(long, default_value = "")]
  period: String,
  #[arg(long, default_value = "")]
  genre: String,
  /// Comma separated emotion tags, e.g. "hope, loneliness"
  #[arg(long, default_value = "")]
  emotions: String,
  /// Why you recommend it (required)
  #[arg(long, default_value = "")]
  opinion: String,
  #[arg(long, default_value = "")]
  nickname: String,
}

impl From<WorkArgs> for Submission {
  fn from(args: WorkArgs) -> Self {
    Submission {
      title: args.title,
      author: args.author,
      country: args.country,
      period: args.period,
      genre: args.genre,
      emotions: args.emotions,
      opinion: args.opinion,
      nickname: args.nickname,
    }
  }
}

#[derive(Subcommand)]
enum Command {
  /// Submit a work you have read
  Submit {
    #[command(flatten)]
    work: WorkArgs,
  },
  /// List submitted works, most recent first
  List {
    /// Maximum number of works to show
    #[arg(short, long)]
    limit: Option<usize>,
  },
  /// Recommend works similar to comma separated terms
  Recommend {
    /// Query terms, e.g. "hope, loneliness"
    query: Vec<String>,
  },
  /// Show the activity log
  Logs {
    /// Maximum number of log entries to return
    #[arg(short, long, default_value = "50")]
    limit: usize,
    /// Filter by log level (debug, info, warn, error, all)
    #[arg(long, default_value = "all")]
    level: String,
  },
  /// Print the effective configuration
  Config,
}

async fn handle(command: Command, config: Config) -> Result<()> {
  if let Command::Config = command {
    return commands::show_config(&config);
  }

  let state = build_state(&config)?;
  match command {
    Command::Submit { work } => commands::submit(&state.library, work.into()).await,
    Command::List { limit } => commands::list(&state.library, limit).await,
    Command::Recommend { query } => commands::recommend(&state.library, &query.join(" ")).await,
    Command::Logs { limit, level } => commands::logs(&state.activity, limit, &level).await,
    Command::Config => commands::show_config(&config),
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_filter = if cli.verbose { "info" } else { "alzar=warn,warn" };
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

  let config = Config::load(cli.config.as_deref())?;
  handle(cli.command, config).await
}

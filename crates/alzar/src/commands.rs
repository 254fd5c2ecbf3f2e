//! CLI command implementations
//!
//! The CLI runs the same [`Library`] pipeline as the REST server, in
//! process, against the configured store.

use anyhow::Result;
use colored::*;

use crate::activity::{ActivityLog, Level};
use crate::config::Config;
use crate::display;
use crate::library::{Library, Recommendation};
use crate::record::Submission;

/// Validate and store a work
pub async fn submit(library: &Library, submission: Submission) -> Result<()> {
  let record = library.submit(submission).await?;
  println!(
    "{} Saved {} by {}",
    "✓".green(),
    format!("\"{}\"", record.title).yellow(),
    record.author.cyan()
  );
  Ok(())
}

/// List works, most recent first
pub async fn list(library: &Library, limit: Option<usize>) -> Result<()> {
  let records = library.recent(limit).await?;

  if records.is_empty() {
    println!("No works have been submitted yet.");
    return Ok(());
  }

  for record in &records {
    display::display_record(record);
  }
  Ok(())
}

/// Recommend works similar to a comma separated query
pub async fn recommend(library: &Library, query: &str) -> Result<()> {
  match library.recommend(query).await? {
    Recommendation::NoData => display::display_no_data(),
    Recommendation::Unranked(records) => {
      println!("{} Empty query, listing every work instead:", "ℹ".blue());
      println!();
      for record in &records {
        display::display_record(record);
      }
    }
    Recommendation::Ranked(results) => display::display_recommendations(&results),
  }
  Ok(())
}

/// Show recent activity log entries
pub async fn logs(activity: &ActivityLog, limit: usize, level: &str) -> Result<()> {
  let level = match level {
    "all" => None,
    other => Some(other.parse::<Level>().map_err(|e| anyhow::anyhow!(e))?),
  };

  let entries = activity.entries(Some(limit), level).await?;
  if entries.is_empty() {
    println!("No log entries in {}", activity.path().display().to_string().dimmed());
    return Ok(());
  }

  for entry in &entries {
    display::display_log_entry(entry);
  }
  Ok(())
}

/// Print the effective configuration as YAML, credentials masked
pub fn show_config(config: &Config) -> Result<()> {
  print!("{}", serde_yaml::to_string(&config.redacted())?);
  Ok(())
}

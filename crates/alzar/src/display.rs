//! Display formatting utilities for CLI output

use colored::*;

use crate::activity::{ActivityEntry, Level};
use crate::ranker::RankedResult;
use crate::record::Record;

const WRAP_WIDTH: usize = 80;

/// Wrap text to fit within a specified width
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
  let mut lines = Vec::new();

  for paragraph in text.split('\n') {
    if paragraph.trim().is_empty() {
      lines.push(String::new());
      continue;
    }

    let mut current_line = String::new();
    for word in paragraph.split_whitespace() {
      if current_line.is_empty() {
        current_line = word.to_string();
      } else if current_line.chars().count() + 1 + word.chars().count() <= width {
        current_line.push(' ');
        current_line.push_str(word);
      } else {
        lines.push(current_line);
        current_line = word.to_string();
      }
    }

    if !current_line.is_empty() {
      lines.push(current_line);
    }
  }

  lines
}

/// `### title - author`
pub fn heading(record: &Record) -> String {
  format!("### {} - {}", record.title.bold(), record.author.cyan())
}

/// `country: X  |  period: Y`, skipping blank parts; `None` when both are blank
pub fn origin_line(record: &Record) -> Option<String> {
  let parts: Vec<String> = [("country", &record.country), ("period", &record.period)]
    .into_iter()
    .filter(|(_, value)| !value.is_empty())
    .map(|(label, value)| format!("{}: {value}", label.bold()))
    .collect();

  if parts.is_empty() {
    None
  } else {
    Some(format!("- {}", parts.join("  |  ")))
  }
}

fn print_opinion(label: &str, opinion: &str) {
  for (i, line) in wrap_text(opinion, WRAP_WIDTH).iter().enumerate() {
    if i == 0 {
      println!("- {}: {line}", label.bold());
    } else {
      println!("  {line}");
    }
  }
}

/// A stored work as listed under "recent submissions"
pub fn display_record(record: &Record) {
  println!("{}", heading(record));
  if let Some(origin) = origin_line(record) {
    println!("{origin}");
  }
  println!("- {}: {}  |  {}: {}", "genre".bold(), record.genre, "emotions".bold(), record.emotions);
  print_opinion("opinion", &record.opinion);
  if !record.nickname.is_empty() {
    println!("- {}: {}", "by".bold(), record.nickname.dimmed());
  }
  println!("{}", "---".dimmed());
}

/// One ranked recommendation with its similarity score
pub fn display_ranked(result: &RankedResult) {
  let record = &result.record;
  println!("{}", heading(record));
  if let Some(origin) = origin_line(record) {
    println!("{origin}");
  }
  println!("- {}: {}  |  {}: {}", "genre".bold(), record.genre, "emotions".bold(), record.emotions);
  print_opinion("opinion", &record.opinion);
  println!("- {}: {}", "score".bold(), format_score(result.score).yellow());
  println!("{}", "---".dimmed());
}

pub fn format_score(score: f32) -> String {
  format!("{score:.3}")
}

pub fn display_recommendations(results: &[RankedResult]) {
  println!("{} Top {} recommended works:", "🔍".cyan(), results.len());
  println!();
  for result in results {
    display_ranked(result);
  }
}

pub fn display_no_data() {
  println!(
    "{} No works yet, so there is nothing to recommend from. Submit at least one work first.",
    "⚠️".yellow()
  );
}

pub fn display_log_entry(entry: &ActivityEntry) {
  let level = match entry.level {
    Level::Debug => entry.level.to_string().dimmed(),
    Level::Info => entry.level.to_string().green(),
    Level::Warn => entry.level.to_string().yellow(),
    Level::Error => entry.level.to_string().red(),
  };

  println!(
    "{} {:>5} [{}] {}",
    entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
    level,
    entry.component.blue(),
    entry.message
  );
}

//! Submitted works and their normalization
//!
//! A [`Record`] is one literary work as read back from the store. Rows come
//! back as loosely keyed maps (header name to cell value); this module maps
//! them onto typed fields, tolerating missing columns, stray whitespace in
//! headers, and the Korean headers used by the original sheet.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::AppError;

/// One stored row, keyed by column header
pub type Row = HashMap<String, String>;

/// Columns of a work record, in store order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Field {
  Title,
  Author,
  Country,
  Period,
  Genre,
  Emotions,
  Opinion,
  Nickname,
}

impl Field {
  /// Every field in the order rows are appended to the store
  pub const ALL: [Field; 8] = [
    Field::Title,
    Field::Author,
    Field::Country,
    Field::Period,
    Field::Genre,
    Field::Emotions,
    Field::Opinion,
    Field::Nickname,
  ];

  /// Fields a submission must fill in
  pub const REQUIRED: [Field; 3] = [Field::Title, Field::Author, Field::Opinion];

  /// Fields scanned for keyword overlap
  pub const KEYWORD_FIELDS: [Field; 3] = [Field::Emotions, Field::Genre, Field::Opinion];

  /// Canonical column header
  pub fn label(&self) -> &'static str {
    match self {
      Field::Title => "title",
      Field::Author => "author",
      Field::Country => "country",
      Field::Period => "period",
      Field::Genre => "genre",
      Field::Emotions => "emotions",
      Field::Opinion => "opinion",
      Field::Nickname => "nickname",
    }
  }

  fn aliases(&self) -> &'static [&'static str] {
    match self {
      Field::Title => &["title", "작품명"],
      Field::Author => &["author", "저자"],
      Field::Country => &["country", "국가"],
      Field::Period => &["period", "시대"],
      Field::Genre => &["genre", "장르"],
      Field::Emotions => &["emotions", "emotion", "감정"],
      Field::Opinion => &["opinion", "reason", "평가", "추천 이유"],
      Field::Nickname => &["nickname", "user", "닉네임"],
    }
  }

  /// Header row matching [`Field::ALL`]
  pub fn headers() -> Vec<String> {
    Field::ALL.iter().map(|f| f.label().to_string()).collect()
  }
}

/// A stored literary work
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Record {
  pub title: String,
  pub author: String,
  pub country: String,
  pub period: String,
  pub genre: String,
  /// Emotion tags, space separated
  pub emotions: String,
  pub opinion: String,
  pub nickname: String,
}

impl Record {
  /// Build a record from a keyed row. Unknown columns are ignored and missing
  /// ones read as empty.
  pub fn from_row(row: &Row) -> Self {
    let normalized: HashMap<String, &str> =
      row.iter().map(|(k, v)| (k.trim().to_lowercase(), v.as_str())).collect();

    let lookup = |field: Field| -> String {
      field
        .aliases()
        .iter()
        .find_map(|alias| normalized.get(*alias))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
    };

    Self::assemble(lookup)
  }

  /// Build a record from values laid out in [`Field::ALL`] order
  pub fn from_values(values: &[String]) -> Self {
    Self::assemble(|field| {
      let index = Field::ALL.iter().position(|f| *f == field).unwrap_or(usize::MAX);
      values.get(index).map(|v| v.trim().to_string()).unwrap_or_default()
    })
  }

  fn assemble(lookup: impl Fn(Field) -> String) -> Self {
    Self {
      title: lookup(Field::Title),
      author: lookup(Field::Author),
      country: lookup(Field::Country),
      period: lookup(Field::Period),
      genre: lookup(Field::Genre),
      emotions: normalize_emotions(&lookup(Field::Emotions)),
      opinion: lookup(Field::Opinion),
      nickname: lookup(Field::Nickname),
    }
  }

  pub fn field(&self, field: Field) -> &str {
    match field {
      Field::Title => &self.title,
      Field::Author => &self.author,
      Field::Country => &self.country,
      Field::Period => &self.period,
      Field::Genre => &self.genre,
      Field::Emotions => &self.emotions,
      Field::Opinion => &self.opinion,
      Field::Nickname => &self.nickname,
    }
  }

  /// Text fed to the embedding model for this record, e.g.
  /// `genre: novel emotions: hope opinion: ...`
  pub fn combined_text(&self, fields: &[Field]) -> String {
    fields
      .iter()
      .map(|f| format!("{}: {}", f.label(), self.field(*f)))
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// Turn `"hope, loneliness,"` into `"hope loneliness"`
pub fn normalize_emotions(raw: &str) -> String {
  raw.split(',').map(str::trim).filter(|tag| !tag.is_empty()).collect::<Vec<_>>().join(" ")
}

/// A work as entered by a user, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Submission {
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub author: String,
  #[serde(default)]
  pub country: String,
  #[serde(default)]
  pub period: String,
  #[serde(default)]
  pub genre: String,
  /// Comma separated emotion tags
  #[serde(default)]
  pub emotions: String,
  #[serde(default)]
  pub opinion: String,
  #[serde(default)]
  pub nickname: String,
}

impl Submission {
  fn value(&self, field: Field) -> &str {
    match field {
      Field::Title => &self.title,
      Field::Author => &self.author,
      Field::Country => &self.country,
      Field::Period => &self.period,
      Field::Genre => &self.genre,
      Field::Emotions => &self.emotions,
      Field::Opinion => &self.opinion,
      Field::Nickname => &self.nickname,
    }
  }

  /// Check required fields and produce the row to append, in store order.
  /// Emotions are stored as entered; normalization happens on load.
  pub fn into_row(self) -> Result<Vec<String>, AppError> {
    let missing: Vec<Field> =
      Field::REQUIRED.into_iter().filter(|f| self.value(*f).trim().is_empty()).collect();

    if !missing.is_empty() {
      return Err(AppError::Validation { missing });
    }

    Ok(Field::ALL.iter().map(|f| self.value(*f).trim().to_string()).collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn submission() -> Submission {
    Submission {
      title: "The Little Prince".to_string(),
      author: "Antoine de Saint-Exupéry".to_string(),
      genre: "novel".to_string(),
      emotions: "loneliness, hope".to_string(),
      opinion: "A quiet book about what matters.".to_string(),
      ..Default::default()
    }
  }

  #[test]
  fn test_normalize_emotions() {
    assert_eq!(normalize_emotions("hope, loneliness"), "hope loneliness");
    assert_eq!(normalize_emotions(" hope ,, grief , "), "hope grief");
    assert_eq!(normalize_emotions(""), "");
    assert_eq!(normalize_emotions("single"), "single");
  }

  #[test]
  fn test_into_row_keeps_store_order() {
    let row = submission().into_row().unwrap();
    assert_eq!(row.len(), Field::ALL.len());
    assert_eq!(row[0], "The Little Prince");
    assert_eq!(row[5], "loneliness, hope");
    assert_eq!(row[7], "");
  }

  #[test]
  fn test_into_row_rejects_blank_required_fields() {
    let mut blank = submission();
    blank.opinion = "   ".to_string();
    blank.author = String::new();

    match blank.into_row() {
      Err(AppError::Validation { missing }) => {
        assert_eq!(missing, vec![Field::Author, Field::Opinion]);
      }
      other => panic!("expected validation error, got {other:?}"),
    }
  }

  #[test]
  fn test_genre_and_emotions_are_optional() {
    let mut sparse = submission();
    sparse.genre = String::new();
    sparse.emotions = String::new();
    assert!(sparse.into_row().is_ok());
  }

  #[test]
  fn test_from_row_accepts_korean_headers_and_padding() {
    let row: Row = [
      (" 작품명 ", "소나기"),
      ("저자", "황순원"),
      ("장르", "소설"),
      ("감정", "설렘, 슬픔"),
      ("평가", "첫사랑의 기억"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let record = Record::from_row(&row);
    assert_eq!(record.title, "소나기");
    assert_eq!(record.author, "황순원");
    assert_eq!(record.emotions, "설렘 슬픔");
    assert_eq!(record.opinion, "첫사랑의 기억");
    assert_eq!(record.country, "");
  }

  #[test]
  fn test_from_row_reason_alias() {
    let row: Row =
      [("Title".to_string(), "Dune".to_string()), ("reason".to_string(), "sand".to_string())]
        .into_iter()
        .collect();

    let record = Record::from_row(&row);
    assert_eq!(record.title, "Dune");
    assert_eq!(record.opinion, "sand");
  }

  #[test]
  fn test_from_values_round_trips_submission() {
    let record = Record::from_values(&submission().into_row().unwrap());
    assert_eq!(record.emotions, "loneliness hope");
    assert_eq!(record.genre, "novel");
  }

  #[test]
  fn test_from_values_short_row() {
    let record = Record::from_values(&["Only a title".to_string()]);
    assert_eq!(record.title, "Only a title");
    assert_eq!(record.opinion, "");
  }

  #[test]
  fn test_combined_text_follows_field_order() {
    let record = Record::from_values(&submission().into_row().unwrap());

    assert_eq!(
      record.combined_text(&[Field::Genre, Field::Emotions, Field::Opinion]),
      "genre: novel emotions: loneliness hope opinion: A quiet book about what matters."
    );
    assert_eq!(
      record.combined_text(&[Field::Opinion, Field::Genre]),
      "opinion: A quiet book about what matters. genre: novel"
    );
  }
}

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::RecordStore;
use crate::error::StoreError;
use crate::record::Row;

/// `spreadsheets.values.get` response; `values` is absent for an empty sheet
#[derive(Deserialize)]
struct ValueRange {
  #[serde(default)]
  values: Vec<Vec<String>>,
}

/// A Google Sheets worksheet accessed through the v4 values API.
///
/// The first row of the sheet holds column headers; every following row is
/// one work. Authentication is a bearer access token.
pub struct SheetsStore {
  client: reqwest::Client,
  base_url: Url,
  spreadsheet_id: String,
  sheet: String,
  access_token: String,
}

impl SheetsStore {
  pub fn new(
    base_url: &str,
    spreadsheet_id: &str,
    sheet: &str,
    access_token: &str,
  ) -> Result<Self, StoreError> {
    let base_url = Url::parse(base_url)
      .map_err(|e| StoreError::Misconfigured(format!("invalid sheets base url {base_url}: {e}")))?;
    if base_url.cannot_be_a_base() {
      return Err(StoreError::Misconfigured(format!("invalid sheets base url {base_url}")));
    }

    Ok(Self {
      client: reqwest::Client::new(),
      base_url,
      spreadsheet_id: spreadsheet_id.to_string(),
      sheet: sheet.to_string(),
      access_token: access_token.to_string(),
    })
  }

  /// `<base>/v4/spreadsheets/<id>/values/<range>`
  fn values_url(&self, range: &str) -> Result<Url, StoreError> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| StoreError::Misconfigured("sheets base url cannot hold a path".to_string()))?
      .pop_if_empty()
      .extend(["v4", "spreadsheets", &self.spreadsheet_id, "values", range]);
    Ok(url)
  }

  async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), "sheets request rejected");
    Err(StoreError::Rejected { status: status.as_u16(), body })
  }
}

#[async_trait]
impl RecordStore for SheetsStore {
  async fn append_row(&self, values: &[String]) -> Result<(), StoreError> {
    let mut url = self.values_url(&format!("{}!A1:append", self.sheet))?;
    // RAW keeps cells exactly as submitted; no formula or date parsing
    url
      .query_pairs_mut()
      .append_pair("valueInputOption", "RAW")
      .append_pair("insertDataOption", "INSERT_ROWS");

    let response = self
      .client
      .post(url)
      .bearer_auth(&self.access_token)
      .json(&json!({ "values": [values] }))
      .send()
      .await?;

    Self::check(response).await?;
    Ok(())
  }

  async fn get_all_records(&self) -> Result<Vec<Row>, StoreError> {
    let url = self.values_url(&self.sheet)?;
    let response = self.client.get(url).bearer_auth(&self.access_token).send().await?;
    let range: ValueRange = Self::check(response).await?.json().await?;

    let mut rows = range.values.into_iter();
    let Some(headers) = rows.next() else {
      return Ok(vec![]);
    };

    // Trailing empty cells are omitted by the API; pad them back
    Ok(
      rows
        .map(|cells| {
          headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), cells.get(i).cloned().unwrap_or_default()))
            .collect()
        })
        .collect(),
    )
  }

  fn describe(&self) -> String {
    format!("sheets:{}/{}", self.spreadsheet_id, self.sheet)
  }
}

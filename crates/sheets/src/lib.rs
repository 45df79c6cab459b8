//! Google Sheets backed [`RowStore`].
//!
//! Talks to the Sheets v4 `values` API with a bearer access token. Obtaining
//! and refreshing the token is the caller's business.

use engine::{A1Range, BoxFuture, Row, RowStore, StoreError};
use reqwest::{Client, StatusCode, Url, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("invalid base url: {0}")]
    BaseUrl(String),
    #[error("invalid access token")]
    Token,
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct ValueRange<'a> {
    values: &'a [Row],
}

#[derive(Debug, Default, Deserialize)]
struct ValueRangeResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Clone, Debug)]
pub struct SheetsStore {
    client: Client,
    base_url: Url,
    spreadsheet_id: String,
}

impl SheetsStore {
    pub fn new(
        spreadsheet_id: &str,
        access_token: &str,
        base_url: Option<&str>,
    ) -> Result<Self, SheetsError> {
        let base_url = Url::parse(base_url.unwrap_or(DEFAULT_BASE_URL))
            .map_err(|err| SheetsError::BaseUrl(err.to_string()))?;

        let mut auth = header::HeaderValue::try_from(format!("Bearer {access_token}"))
            .map_err(|_| SheetsError::Token)?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url,
            spreadsheet_id: spreadsheet_id.to_string(),
        })
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}{suffix}` with the range
    /// percent-encoded as one path segment.
    fn values_url(&self, range: &A1Range, suffix: &str) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Backend("base url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                &format!("{range}{suffix}"),
            ]);
        Ok(url)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = match resp.json::<ErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => "sheets api error".to_string(),
        };
        tracing::warn!(%status, %message, "sheets request failed");
        Err(store_error(status, message))
    }
}

fn store_error(status: StatusCode, message: String) -> StoreError {
    StoreError::Backend(format!("{status}: {message}"))
}

fn network(err: reqwest::Error) -> StoreError {
    StoreError::Backend(format!("network error: {err}"))
}

/// Cells come back as strings with the default render option, but numbers
/// and booleans are accepted too.
fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl RowStore for SheetsStore {
    fn append_row<'a>(&'a self, range: &'a A1Range, row: Row) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let url = self.values_url(range, ":append")?;
            let resp = self
                .client
                .post(url)
                .query(&[("valueInputOption", "USER_ENTERED")])
                .json(&ValueRange { values: &[row] })
                .send()
                .await
                .map_err(network)?;
            Self::check(resp).await?;
            Ok(())
        })
    }

    fn read_range<'a>(&'a self, range: &'a A1Range) -> BoxFuture<'a, Result<Vec<Row>, StoreError>> {
        Box::pin(async move {
            let url = self.values_url(range, "")?;
            let resp = self.client.get(url).send().await.map_err(network)?;
            let body = Self::check(resp)
                .await?
                .json::<ValueRangeResponse>()
                .await
                .map_err(network)?;

            Ok(body
                .values
                .into_iter()
                .map(|row| row.into_iter().map(cell_text).collect())
                .collect())
        })
    }

    fn write_cell<'a>(&'a self, cell: &'a A1Range, value: String) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            cell.cell()?;
            let url = self.values_url(cell, "")?;
            let resp = self
                .client
                .put(url)
                .query(&[("valueInputOption", "USER_ENTERED")])
                .json(&ValueRange {
                    values: &[vec![value]],
                })
                .send()
                .await
                .map_err(network)?;
            Self::check(resp).await?;
            Ok(())
        })
    }
}

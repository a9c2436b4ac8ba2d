use crate::error::SubmitError;
use crate::record::Cell;
use log::{debug, info};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

/// Appends one ordered row to a named worksheet, atomically or not at all.
pub trait RowAppender {
    fn append_row(
        &self,
        worksheet: &str,
        row: &[Cell],
    ) -> impl Future<Output = Result<(), SubmitError>> + Send;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange<'a> {
    major_dimension: &'static str,
    values: [&'a [Cell]; 1],
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// Google Sheets v4 client bound to one spreadsheet.
pub struct SheetsClient {
    client: Client,
    base: Url,
    spreadsheet_key: String,
    token: String,
    pub(crate) timeout: Duration,
}

impl SheetsClient {
    pub fn new(spreadsheet_key: &str, token: &str) -> Result<Self, SubmitError> {
        let base = Url::parse(DEFAULT_API_BASE)
            .map_err(|e| SubmitError::Destination(e.to_string()))?;
        Ok(Self {
            client: Client::new(),
            base,
            spreadsheet_key: spreadsheet_key.to_string(),
            token: token.to_string(),
            timeout: Duration::from_secs(30),
        })
    }

    pub fn with_api_base(mut self, base: &str) -> Result<Self, SubmitError> {
        self.base = Url::parse(base).map_err(|e| SubmitError::Destination(e.to_string()))?;
        Ok(self)
    }

    /// Bound every request; a hung call surfaces as a submission failure.
    pub fn with_timeout(mut self, secs: u64) -> Result<Self, SubmitError> {
        self.timeout = Duration::from_secs(secs);
        self.client = Client::builder().timeout(self.timeout).build()?;
        Ok(self)
    }

    /// A1 range addressing the first cell of `worksheet`.
    pub fn worksheet_range(worksheet: &str) -> String {
        format!("'{}'!A1", worksheet.replace('\'', "''"))
    }

    pub fn append_url(&self, worksheet: &str) -> Result<Url, SubmitError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SubmitError::Destination(self.base.to_string()))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_key.as_str(),
                "values",
                format!("{}:append", Self::worksheet_range(worksheet)).as_str(),
            ]);
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        Ok(url)
    }
}

impl RowAppender for SheetsClient {
    async fn append_row(&self, worksheet: &str, row: &[Cell]) -> Result<(), SubmitError> {
        let url = self.append_url(worksheet)?;
        debug!("POST {}", url);

        let body = ValueRange {
            major_dimension: "ROWS",
            values: [row],
        };
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("Appended {} cells to worksheet '{}'", row.len(), worksheet);
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .map(|b| b.error.message)
            .unwrap_or(text);
        Err(SubmitError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

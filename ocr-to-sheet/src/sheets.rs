//! Google Sheets publishing of extracted text.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::TokenProvider;
use crate::config::SheetsConfig;
use crate::error::{PipelineResult, PublishError};

/// Spreadsheet operations needed to publish one text
pub trait SpreadsheetService {
    /// Create an empty spreadsheet and return its id
    async fn create_spreadsheet(&self, title: &str) -> PipelineResult<String>;

    /// Overwrite `range` with `values` (row-major)
    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
        value_input_option: &str,
    ) -> PipelineResult<()>;
}

/// A spreadsheet created by a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetRecord {
    pub title: String,
    pub spreadsheet_id: String,
    pub url: String,
}

/// Sheets v4 REST client
pub struct SheetsClient {
    client: Client,
    base_url: String,
    scope: String,
    tokens: Arc<TokenProvider>,
}

impl SheetsClient {
    pub fn new(
        config: &SheetsConfig,
        scope: impl Into<String>,
        tokens: Arc<TokenProvider>,
    ) -> Result<Self, PublishError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(format!(
                "{}/{}",
                config.application_name,
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| PublishError::Connection {
                url: base_url.clone(),
                source: e,
            })?;

        Ok(Self {
            client,
            base_url,
            scope: scope.into(),
            tokens,
        })
    }

    pub fn values_url(&self, spreadsheet_id: &str, range: &str, value_input_option: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}?valueInputOption={}",
            self.base_url,
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(range),
            urlencoding::encode(value_input_option)
        )
    }
}

impl SpreadsheetService for SheetsClient {
    async fn create_spreadsheet(&self, title: &str) -> PipelineResult<String> {
        let url = format!("{}/v4/spreadsheets", self.base_url);
        let builder = self
            .tokens
            .authorize(self.client.post(&url), &self.scope)
            .await?;

        let request = CreateSpreadsheetRequest {
            properties: SpreadsheetProperties {
                title: title.to_string(),
            },
        };

        let response = builder
            .json(&request)
            .send()
            .await
            .map_err(|e| PublishError::Connection {
                url: url.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(PublishError::Create {
                title: title.to_string(),
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            }
            .into());
        }

        let created: CreateSpreadsheetResponse = response
            .json()
            .await
            .map_err(|e| PublishError::InvalidResponse { source: e })?;

        Ok(created.spreadsheet_id)
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
        value_input_option: &str,
    ) -> PipelineResult<()> {
        let url = self.values_url(spreadsheet_id, range, value_input_option);
        let builder = self
            .tokens
            .authorize(self.client.put(&url), &self.scope)
            .await?;

        let body = ValueRange {
            range: range.to_string(),
            major_dimension: "ROWS".to_string(),
            values,
        };

        let response = builder
            .json(&body)
            .send()
            .await
            .map_err(|e| PublishError::Connection {
                url: url.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(PublishError::Write {
                spreadsheet_id: spreadsheet_id.to_string(),
                range: range.to_string(),
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            }
            .into());
        }

        Ok(())
    }
}

/// Create a spreadsheet titled `title` and store `text` in the target cell
pub async fn publish<S: SpreadsheetService>(
    service: &S,
    config: &SheetsConfig,
    title: &str,
    text: &str,
) -> PipelineResult<SpreadsheetRecord> {
    let spreadsheet_id = service.create_spreadsheet(title).await?;
    info!(spreadsheet_id = %spreadsheet_id, title = %title, "Spreadsheet created");

    service
        .update_values(
            &spreadsheet_id,
            &config.target_range,
            vec![vec![text.to_string()]],
            &config.value_input_option,
        )
        .await?;
    info!(range = %config.target_range, "Extracted text written");

    Ok(SpreadsheetRecord {
        title: title.to_string(),
        url: config.document_url(&spreadsheet_id),
        spreadsheet_id,
    })
}

// Internal Sheets API types

#[derive(Debug, Serialize)]
struct CreateSpreadsheetRequest {
    properties: SpreadsheetProperties,
}

#[derive(Debug, Serialize)]
struct SpreadsheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSpreadsheetResponse {
    spreadsheet_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    range: String,
    major_dimension: String,
    values: Vec<Vec<String>>,
}

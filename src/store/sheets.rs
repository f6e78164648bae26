// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Spreadsheet-backed question store using the Google Sheets v4 values API.
//!
//! Each question type lives in its own sheet (tab) named after its table.
//! Row 1 holds column headers; data starts at row 2.

use super::QuestionStore;
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::model::{ExistingQuestionRecord, PersistedRow, QuestionType};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Response body of `GET .../values/{range}`.
#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    /// Absent when the range is empty
    #[serde(default)]
    values: Vec<Vec<JsonValue>>,
}

/// Sheets API client scoped to one spreadsheet.
pub struct SheetsStore {
    config: StoreConfig,
    client: reqwest::Client,
}

impl SheetsStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.config.api_base_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.spreadsheet_id),
            urlencoding::encode(range)
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.config.access_token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.config.access_token)
        }
    }

    async fn fetch_table(&self, question_type: QuestionType) -> Result<Vec<Vec<String>>, StoreError> {
        let url = self.values_url(&data_range(question_type));
        let response = self.authorize(self.client.get(&url)).send().await?;

        if !response.status().is_success() {
            return Err(StoreError::BadResponse {
                operation: "fetch",
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let range: ValueRange = response.json().await?;
        debug!(table = question_type.table_name(), rows = range.values.len(), "Fetched sheet");
        Ok(range.values.into_iter().map(stringify_row).collect())
    }
}

/// A1 range covering the data rows of a table, e.g. `'MCQ Questions'!A2:O`.
fn data_range(question_type: QuestionType) -> String {
    format!(
        "'{}'!A2:{}",
        question_type.table_name(),
        column_letter(question_type.column_count())
    )
}

/// Spreadsheet column letter for a 1-based column index (up to 26).
fn column_letter(index: usize) -> char {
    (b'A' + (index.clamp(1, 26) - 1) as u8) as char
}

fn stringify_row(row: Vec<JsonValue>) -> Vec<String> {
    row.into_iter()
        .map(|cell| match cell {
            JsonValue::String(s) => s,
            JsonValue::Null => String::new(),
            other => other.to_string(),
        })
        .collect()
}

/// Decode the data rows of one table.
fn decode_rows(question_type: QuestionType, rows: &[Vec<String>]) -> Vec<ExistingQuestionRecord> {
    rows.iter()
        .filter_map(|row| ExistingQuestionRecord::from_row(question_type, row))
        .collect()
}

#[async_trait]
impl QuestionStore for SheetsStore {
    async fn fetch_existing_questions(&self) -> Result<Vec<ExistingQuestionRecord>, StoreError> {
        let mut records = Vec::new();
        for question_type in QuestionType::ALL {
            let rows = self.fetch_table(question_type).await?;
            records.extend(decode_rows(question_type, &rows));
        }
        Ok(records)
    }

    async fn append_row(&self, table: &str, row: &PersistedRow) -> Result<(), StoreError> {
        let url = format!(
            "{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
            self.values_url(&format!("'{table}'!A1"))
        );

        let response = self
            .authorize(self.client.post(&url))
            .json(&serde_json::json!({ "values": [row.cells()] }))
            .send()
            .await?;

        if response.status().is_success() {
            debug!(table, cells = row.len(), "Appended row");
            Ok(())
        } else {
            Err(StoreError::BadResponse {
                operation: "append",
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}

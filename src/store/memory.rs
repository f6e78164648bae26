// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Process-local question store.

use super::QuestionStore;
use crate::error::StoreError;
use crate::model::{ExistingQuestionRecord, PersistedRow, QuestionType};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Tables held in memory, keyed by table name.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<&'static str, Vec<PersistedRow>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `rows` appended to their tables.
    pub fn with_rows(rows: impl IntoIterator<Item = (QuestionType, PersistedRow)>) -> Self {
        let mut tables: HashMap<&'static str, Vec<PersistedRow>> = HashMap::new();
        for (question_type, row) in rows {
            tables.entry(question_type.table_name()).or_default().push(row);
        }
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Rows of `table`, oldest first.
    pub async fn rows(&self, table: &str) -> Vec<PersistedRow> {
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

fn table_type(table: &str) -> Option<QuestionType> {
    QuestionType::ALL
        .into_iter()
        .find(|question_type| question_type.table_name() == table)
}

#[async_trait]
impl QuestionStore for InMemoryStore {
    async fn fetch_existing_questions(&self) -> Result<Vec<ExistingQuestionRecord>, StoreError> {
        let tables = self.tables.read().await;
        let records = QuestionType::ALL
            .into_iter()
            .flat_map(|question_type| {
                tables
                    .get(question_type.table_name())
                    .into_iter()
                    .flatten()
                    .filter_map(move |row| {
                        ExistingQuestionRecord::from_row(question_type, row.cells())
                    })
            })
            .collect();
        Ok(records)
    }

    async fn append_row(&self, table: &str, row: &PersistedRow) -> Result<(), StoreError> {
        let question_type =
            table_type(table).ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        self.tables
            .write()
            .await
            .entry(question_type.table_name())
            .or_default()
            .push(row.clone());
        Ok(())
    }
}

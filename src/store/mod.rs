// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Question storage.
//!
//! The portal keeps its questions in three spreadsheet tables. The intake
//! core only needs to read every existing question back (for duplicate
//! checks) and append one row per accepted submission.

mod memory;
mod sheets;

pub use memory::InMemoryStore;
pub use sheets::SheetsStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::StoreError;
use crate::model::{ExistingQuestionRecord, PersistedRow};
use async_trait::async_trait;
use std::sync::Arc;

/// Backing store for community questions.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Every question currently stored, across all tables.
    async fn fetch_existing_questions(&self) -> Result<Vec<ExistingQuestionRecord>, StoreError>;

    /// Append `row` to the end of `table`.
    async fn append_row(&self, table: &str, row: &PersistedRow) -> Result<(), StoreError>;
}

/// Build the store selected by `config`.
pub fn from_config(config: &StoreConfig) -> Arc<dyn QuestionStore> {
    match config.backend {
        StoreBackend::Memory => Arc::new(InMemoryStore::new()),
        StoreBackend::Sheets => Arc::new(SheetsStore::new(config.clone())),
    }
}

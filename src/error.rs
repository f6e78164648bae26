// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for question intake.

use thiserror::Error;

/// Reasons a submission is not accepted.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Too many submissions, please try again in {retry_after_secs} seconds")]
    RateLimitExceeded { retry_after_secs: u64 },

    #[error("A similar question already exists, please check the existing questions before submitting")]
    DuplicateQuestion,

    /// A type tag reached the core that upstream validation should have rejected.
    #[error("Unsupported question type: {0}")]
    UnsupportedQuestionType(String),

    #[error("Failed to save submission: {0}")]
    Persistence(#[source] StoreError),
}

impl SubmissionError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RateLimitExceeded { .. } => "RATE_LIMITED",
            Self::DuplicateQuestion => "DUPLICATE_QUESTION",
            Self::UnsupportedQuestionType(_) => "UNSUPPORTED_QUESTION_TYPE",
            Self::Persistence(_) => "PERSISTENCE_FAILED",
        }
    }
}

/// Failures talking to the question store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Store returned {status} for {operation}: {body}")]
    BadResponse {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Store {operation} timed out after {timeout_ms} ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SubmissionError>;

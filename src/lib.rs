// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Question Intake
//!
//! Intake service for community-contributed interview questions:
//!
//! - Per-client sliding-window rate limiting (10 submissions per minute default)
//! - Duplicate detection (exact and Levenshtein similarity above 0.8)
//! - Routing of interview, scenario and MCQ submissions onto fixed
//!   spreadsheet row layouts
//! - Spreadsheet-backed storage with a fail-open corpus read

pub mod config;
pub mod duplicate;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod router;
pub mod similarity;
pub mod store;
pub mod validator;

pub use config::Config;
pub use duplicate::DuplicateDetector;
pub use error::{StoreError, SubmissionError};
pub use limiter::{RateLimitInfo, RateLimitResult, RateLimiter};
pub use model::{PersistedRow, QuestionType, SubmissionCandidate};
pub use pipeline::{SubmissionPipeline, SubmissionReceipt};
pub use store::{InMemoryStore, QuestionStore, SheetsStore};
pub use validator::{SubmissionValidator, ValidationResult};

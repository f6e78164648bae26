// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Submission pipeline: rate limit → duplicate check → route → persist.
//!
//! Corpus fetch failures are logged and treated as an empty corpus so a
//! flaky store never blocks contributions. Append failures are returned to
//! the caller. Both store calls are bounded by the configured timeout.

use crate::config::Config;
use crate::duplicate::DuplicateDetector;
use crate::error::{Result, StoreError, SubmissionError};
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::metrics::{IntakeMetrics, Outcome};
use crate::model::{ExistingQuestionRecord, PersistedRow, SubmissionCandidate};
use crate::router;
use crate::store::QuestionStore;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What was stored for an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub table: &'static str,
    pub row: PersistedRow,
}

/// Runs one submission through the intake checks and into the store.
pub struct SubmissionPipeline {
    limiter: RateLimiter,
    detector: DuplicateDetector,
    store: Arc<dyn QuestionStore>,
    store_timeout: Duration,
    metrics: IntakeMetrics,
}

impl SubmissionPipeline {
    pub fn new(config: &Config, store: Arc<dyn QuestionStore>, metrics: IntakeMetrics) -> Self {
        Self {
            limiter: RateLimiter::new(config.rate_limit.clone()),
            detector: DuplicateDetector::new(config.duplicates.clone()),
            store,
            store_timeout: config.store.timeout(),
            metrics,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn metrics(&self) -> &IntakeMetrics {
        &self.metrics
    }

    /// Accept `candidate` from `identifier` or explain why not.
    pub async fn submit(
        &self,
        identifier: &str,
        candidate: &SubmissionCandidate,
    ) -> Result<SubmissionReceipt> {
        let result = self.run(identifier, candidate).await;
        self.metrics.record(match &result {
            Ok(_) => Outcome::Accepted,
            Err(SubmissionError::RateLimitExceeded { .. }) => Outcome::RateLimited,
            Err(SubmissionError::DuplicateQuestion) => Outcome::Duplicate,
            Err(SubmissionError::UnsupportedQuestionType(_)) => Outcome::UnsupportedType,
            Err(SubmissionError::Persistence(_)) => Outcome::PersistenceFailed,
        });
        result
    }

    async fn run(
        &self,
        identifier: &str,
        candidate: &SubmissionCandidate,
    ) -> Result<SubmissionReceipt> {
        if let RateLimitResult::Limited { retry_after } = self.limiter.check(identifier).await {
            info!(identifier, retry_after_secs = retry_after.as_secs(), "Submission rate limited");
            return Err(SubmissionError::RateLimitExceeded {
                retry_after_secs: retry_after.as_millis().div_ceil(1000).max(1) as u64,
            });
        }

        let question_type = candidate.question_type();
        let corpus = self.fetch_corpus().await;
        if let Some(found) = self
            .detector
            .find_match(&candidate.question, question_type, &corpus)
        {
            info!(
                identifier,
                question_type = %question_type,
                existing = %found.question,
                similarity = found.similarity,
                "Duplicate submission rejected"
            );
            return Err(SubmissionError::DuplicateQuestion);
        }

        let routed = router::route(candidate);
        self.bounded("append", self.store.append_row(routed.target_table, &routed.row))
            .await
            .map_err(|err| {
                warn!(table = routed.target_table, error = %err, "Failed to persist submission");
                SubmissionError::Persistence(err)
            })?;

        info!(
            identifier,
            table = routed.target_table,
            author = %candidate.author,
            "Submission accepted"
        );
        Ok(SubmissionReceipt {
            table: routed.target_table,
            row: routed.row,
        })
    }

    /// Existing questions, or an empty corpus when the store cannot be read.
    async fn fetch_corpus(&self) -> Vec<ExistingQuestionRecord> {
        match self
            .bounded("fetch", self.store.fetch_existing_questions())
            .await
        {
            Ok(corpus) => {
                debug!(size = corpus.len(), "Fetched question corpus");
                corpus
            }
            Err(err) => {
                warn!(error = %err, "Corpus fetch failed, skipping duplicate check");
                self.metrics.record_corpus_fetch_failure();
                Vec::new()
            }
        }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = std::result::Result<T, StoreError>>,
    ) -> std::result::Result<T, StoreError> {
        tokio::time::timeout(self.store_timeout, call)
            .await
            .unwrap_or(Err(StoreError::Timeout {
                operation,
                timeout_ms: self.store_timeout.as_millis() as u64,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RateLimitConfig, StoreConfig};
    use crate::model::{QuestionType, MCQ_TABLE};
    use crate::store::InMemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store whose reads and writes can be made to fail or stall.
    #[derive(Default)]
    struct FlakyStore {
        fail_fetch: bool,
        fail_append: bool,
        stall: bool,
        appends: AtomicUsize,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl QuestionStore for FlakyStore {
        async fn fetch_existing_questions(
            &self,
        ) -> std::result::Result<Vec<ExistingQuestionRecord>, StoreError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.stall {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if self.fail_fetch {
                return Err(StoreError::Unavailable("sheet offline".into()));
            }
            Ok(vec![ExistingQuestionRecord::interview(
                "Ana",
                "What is a container?",
                "...",
            )])
        }

        async fn append_row(
            &self,
            _table: &str,
            _row: &PersistedRow,
        ) -> std::result::Result<(), StoreError> {
            if self.stall {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if self.fail_append {
                return Err(StoreError::Unavailable("quota exceeded".into()));
            }
            self.appends.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn config() -> Config {
        Config {
            store: StoreConfig {
                timeout_ms: 50,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn pipeline(store: Arc<dyn QuestionStore>) -> SubmissionPipeline {
        SubmissionPipeline::new(&config(), store, IntakeMetrics::new().unwrap())
    }

    fn fresh_question() -> SubmissionCandidate {
        SubmissionCandidate::interview("Jane", "How does a service mesh work?", "Sidecars")
    }

    #[tokio::test]
    async fn test_accepted_submission_is_stored() {
        let store = Arc::new(InMemoryStore::new());
        let pipeline = pipeline(store.clone());

        let candidate = SubmissionCandidate::mcq(
            "Li",
            "Which port does SSH use?",
            vec!["21".into(), "22".into()],
            "22",
        );
        let receipt = pipeline.submit("ip", &candidate).await.unwrap();

        assert_eq!(receipt.table, MCQ_TABLE);
        assert_eq!(store.rows(MCQ_TABLE).await, vec![receipt.row]);
        assert_eq!(pipeline.metrics().count(Outcome::Accepted), 1);
    }

    #[tokio::test]
    async fn test_corpus_fetch_failure_fails_open() {
        let store = Arc::new(FlakyStore {
            fail_fetch: true,
            ..Default::default()
        });
        let pipeline = pipeline(store.clone());

        // Would be a duplicate if the corpus could be read.
        let candidate = SubmissionCandidate::interview("Jane", "What is a container?", "...");
        assert!(pipeline.submit("ip", &candidate).await.is_ok());
        assert_eq!(store.appends.load(Ordering::SeqCst), 1);
        assert_eq!(pipeline.metrics().corpus_fetch_failures(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_is_rejected_without_append() {
        let store = Arc::new(FlakyStore::default());
        let pipeline = pipeline(store.clone());

        let candidate = SubmissionCandidate::interview("Jane", "what is a CONTAINER? ", "...");
        let err = pipeline.submit("ip", &candidate).await.unwrap_err();

        assert!(matches!(err, SubmissionError::DuplicateQuestion));
        assert_eq!(store.appends.load(Ordering::SeqCst), 0);
        assert_eq!(pipeline.metrics().count(Outcome::Duplicate), 1);
    }

    #[tokio::test]
    async fn test_append_failure_is_surfaced() {
        let store = Arc::new(FlakyStore {
            fail_append: true,
            ..Default::default()
        });
        let pipeline = pipeline(store);

        let err = pipeline.submit("ip", &fresh_question()).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Persistence(StoreError::Unavailable(_))));
        assert_eq!(pipeline.metrics().count(Outcome::PersistenceFailed), 1);
    }

    #[tokio::test]
    async fn test_stalled_store_times_out() {
        let store = Arc::new(FlakyStore {
            stall: true,
            ..Default::default()
        });
        let pipeline = pipeline(store.clone());

        let err = pipeline.submit("ip", &fresh_question()).await.unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::Persistence(StoreError::Timeout { operation: "append", timeout_ms: 50 })
        ));
        // The stalled fetch also timed out and was skipped.
        assert_eq!(pipeline.metrics().corpus_fetch_failures(), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_before_store_is_touched() {
        let store = Arc::new(FlakyStore::default());
        let config = Config {
            rate_limit: RateLimitConfig {
                max_requests: 1,
                ..Default::default()
            },
            ..config()
        };
        let pipeline = SubmissionPipeline::new(&config, store.clone(), IntakeMetrics::new().unwrap());

        pipeline.submit("ip", &fresh_question()).await.unwrap();
        let err = pipeline.submit("ip", &fresh_question()).await.unwrap_err();

        match err {
            SubmissionError::RateLimitExceeded { retry_after_secs } => {
                assert!((1..=60).contains(&retry_after_secs));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(store.appends.load(Ordering::SeqCst), 1);
        assert_eq!(pipeline.metrics().count(Outcome::RateLimited), 1);
    }

    #[tokio::test]
    async fn test_question_type_of_receipt_matches_row() {
        let pipeline = pipeline(Arc::new(InMemoryStore::new()));
        let receipt = pipeline.submit("ip", &fresh_question()).await.unwrap();
        assert_eq!(receipt.row[2], QuestionType::Interview.as_str());
        assert_eq!(receipt.row.len(), 5);
    }
}

// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for submission outcomes.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Outcome label recorded for every submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    RateLimited,
    Duplicate,
    Invalid,
    UnsupportedType,
    PersistenceFailed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::RateLimited => "rate_limited",
            Self::Duplicate => "duplicate",
            Self::Invalid => "invalid",
            Self::UnsupportedType => "unsupported_type",
            Self::PersistenceFailed => "persistence_failed",
        }
    }
}

/// Registry and counters owned by one service instance.
#[derive(Clone)]
pub struct IntakeMetrics {
    registry: Registry,
    submissions: IntCounterVec,
    corpus_fetch_failures: IntCounter,
}

impl IntakeMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let submissions = IntCounterVec::new(
            Opts::new("question_submissions_total", "Question submissions by outcome"),
            &["outcome"],
        )?;
        let corpus_fetch_failures = IntCounter::new(
            "question_corpus_fetch_failures_total",
            "Corpus fetches that failed and were skipped",
        )?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(corpus_fetch_failures.clone()))?;

        Ok(Self {
            registry,
            submissions,
            corpus_fetch_failures,
        })
    }

    pub fn record(&self, outcome: Outcome) {
        self.submissions.with_label_values(&[outcome.as_str()]).inc();
    }

    pub fn record_corpus_fetch_failure(&self) {
        self.corpus_fetch_failures.inc();
    }

    pub fn count(&self, outcome: Outcome) -> u64 {
        self.submissions.with_label_values(&[outcome.as_str()]).get()
    }

    pub fn corpus_fetch_failures(&self) -> u64 {
        self.corpus_fetch_failures.get()
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

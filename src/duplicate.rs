// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Near-duplicate question detection.
//!
//! Two passes over the corpus:
//! 1. Exact: same normalized text and same question type.
//! 2. Fuzzy: Levenshtein similarity above the threshold. By default only
//!    questions of the candidate's own type are compared; `fuzzy_across_types`
//!    widens this to the whole corpus.
//!
//! Cost is O(corpus × length²), fine for a community FAQ of a few hundred rows.

use crate::config::DuplicateConfig;
use crate::model::{ExistingQuestionRecord, QuestionType};
use crate::similarity::{normalize, similarity};
use tracing::debug;

/// Closest existing question found for a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMatch {
    pub question: String,
    pub question_type: QuestionType,
    pub similarity: f64,
    pub exact: bool,
}

/// Decides whether a candidate question already exists.
#[derive(Debug, Clone)]
pub struct DuplicateDetector {
    config: DuplicateConfig,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new(DuplicateConfig::default())
    }
}

impl DuplicateDetector {
    pub fn new(config: DuplicateConfig) -> Self {
        Self { config }
    }

    /// True when `candidate` matches a corpus question exactly or fuzzily.
    pub fn is_duplicate(
        &self,
        candidate: &str,
        candidate_type: QuestionType,
        corpus: &[ExistingQuestionRecord],
    ) -> bool {
        self.find_match(candidate, candidate_type, corpus).is_some()
    }

    /// First corpus question the candidate duplicates, if any.
    pub fn find_match(
        &self,
        candidate: &str,
        candidate_type: QuestionType,
        corpus: &[ExistingQuestionRecord],
    ) -> Option<DuplicateMatch> {
        let needle = normalize(candidate);
        let normalized: Vec<(String, &ExistingQuestionRecord)> = corpus
            .iter()
            .map(|record| (normalize(&record.question), record))
            .collect();

        let exact = normalized
            .iter()
            .find(|(text, record)| record.question_type == candidate_type && *text == needle);
        if let Some((_, record)) = exact {
            debug!(question = %record.question, "Exact duplicate found");
            return Some(DuplicateMatch {
                question: record.question.clone(),
                question_type: record.question_type,
                similarity: 1.0,
                exact: true,
            });
        }

        normalized
            .iter()
            .filter(|(_, record)| {
                self.config.fuzzy_across_types || record.question_type == candidate_type
            })
            .map(|(text, record)| (similarity(&needle, text), *record))
            .find(|(score, _)| *score > self.config.similarity_threshold)
            .map(|(score, record)| {
                debug!(question = %record.question, similarity = score, "Near duplicate found");
                DuplicateMatch {
                    question: record.question.clone(),
                    question_type: record.question_type,
                    similarity: score,
                    exact: false,
                }
            })
    }
}

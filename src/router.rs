// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Maps a submission onto the column layout of its target table.
//!
//! Rows are positional. Column order per table:
//!
//! | Table | Cells |
//! |---|---|
//! | Interview Questions | timestamp, author, type, question, answer |
//! | Scenario-Based | timestamp, author, type, question, summary, diagnosis steps, root cause, fix, lesson learned, how to avoid |
//! | MCQ Questions | timestamp, author, type, question, option 1..10, correct answer |

use crate::model::{PersistedRow, QuestionPayload, SubmissionCandidate, MCQ_OPTION_SLOTS};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// A row ready to be appended, together with the table it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedRow {
    pub target_table: &'static str,
    pub row: PersistedRow,
}

/// Route a submission using the current time as its timestamp.
pub fn route(candidate: &SubmissionCandidate) -> RoutedRow {
    route_at(candidate, Utc::now())
}

/// Route a submission stamped with `at`.
pub fn route_at(candidate: &SubmissionCandidate, at: DateTime<Utc>) -> RoutedRow {
    let question_type = candidate.question_type();
    let mut cells = Vec::with_capacity(question_type.column_count());
    cells.push(at.to_rfc3339_opts(SecondsFormat::Millis, true));
    cells.push(candidate.author.clone());
    cells.push(question_type.as_str().to_string());
    cells.push(candidate.question.clone());

    match &candidate.payload {
        QuestionPayload::Interview { answer } => {
            cells.push(answer.clone());
        }
        QuestionPayload::Scenario(details) => {
            cells.extend([
                details.summary.clone(),
                details.diagnosis_steps.clone(),
                details.root_cause.clone(),
                details.fix.clone(),
                details.lesson_learned.clone(),
                details.how_to_avoid.clone(),
            ]);
        }
        QuestionPayload::Mcq {
            options,
            correct_answer,
        } => {
            cells.extend(
                options
                    .iter()
                    .cloned()
                    .chain(std::iter::repeat(String::new()))
                    .take(MCQ_OPTION_SLOTS),
            );
            cells.push(correct_answer.clone());
        }
    }

    debug_assert_eq!(cells.len(), question_type.column_count());

    RoutedRow {
        target_table: question_type.table_name(),
        row: PersistedRow::new(cells),
    }
}

// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Question types, submissions and stored rows.

use crate::error::SubmissionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Table holding interview questions.
pub const INTERVIEW_TABLE: &str = "Interview Questions";
/// Table holding scenario-based questions.
pub const SCENARIO_TABLE: &str = "Scenario-Based";
/// Table holding multiple-choice questions.
pub const MCQ_TABLE: &str = "MCQ Questions";

/// Number of option slots in an MCQ row.
pub const MCQ_OPTION_SLOTS: usize = 10;

/// Kind of community question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Interview,
    Scenario,
    Mcq,
}

impl QuestionType {
    pub const ALL: [QuestionType; 3] = [Self::Interview, Self::Scenario, Self::Mcq];

    /// Tag stored in the type column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interview => "interview",
            Self::Scenario => "scenario",
            Self::Mcq => "mcq",
        }
    }

    /// Name of the table rows of this type are appended to.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Interview => INTERVIEW_TABLE,
            Self::Scenario => SCENARIO_TABLE,
            Self::Mcq => MCQ_TABLE,
        }
    }

    /// Fixed cell count of a row in this type's table.
    pub fn column_count(&self) -> usize {
        match self {
            Self::Interview => 5,
            Self::Scenario => 10,
            Self::Mcq => 4 + MCQ_OPTION_SLOTS + 1,
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = SubmissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interview" => Ok(Self::Interview),
            "scenario" => Ok(Self::Scenario),
            "mcq" => Ok(Self::Mcq),
            _ => Err(SubmissionError::UnsupportedQuestionType(s.to_string())),
        }
    }
}

/// Free-text write-up of a production scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDetails {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub diagnosis_steps: String,
    #[serde(default)]
    pub root_cause: String,
    #[serde(default)]
    pub fix: String,
    #[serde(default)]
    pub lesson_learned: String,
    #[serde(default)]
    pub how_to_avoid: String,
}

/// Type-specific part of a submission. Exactly one shape per question type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionPayload {
    Interview {
        answer: String,
    },
    Scenario(ScenarioDetails),
    Mcq {
        options: Vec<String>,
        correct_answer: String,
    },
}

impl QuestionPayload {
    pub fn question_type(&self) -> QuestionType {
        match self {
            Self::Interview { .. } => QuestionType::Interview,
            Self::Scenario(_) => QuestionType::Scenario,
            Self::Mcq { .. } => QuestionType::Mcq,
        }
    }
}

/// A validated community submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionCandidate {
    pub author: String,
    pub question: String,
    pub payload: QuestionPayload,
}

impl SubmissionCandidate {
    pub fn interview(
        author: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            question: question.into(),
            payload: QuestionPayload::Interview {
                answer: answer.into(),
            },
        }
    }

    pub fn scenario(
        author: impl Into<String>,
        question: impl Into<String>,
        details: ScenarioDetails,
    ) -> Self {
        Self {
            author: author.into(),
            question: question.into(),
            payload: QuestionPayload::Scenario(details),
        }
    }

    pub fn mcq(
        author: impl Into<String>,
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            question: question.into(),
            payload: QuestionPayload::Mcq {
                options,
                correct_answer: correct_answer.into(),
            },
        }
    }

    pub fn question_type(&self) -> QuestionType {
        self.payload.question_type()
    }
}

/// Raw submission body as posted by the portal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub question_type: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(flatten)]
    pub scenario: ScenarioDetails,
}

impl TryFrom<SubmissionRequest> for SubmissionCandidate {
    type Error = SubmissionError;

    fn try_from(req: SubmissionRequest) -> Result<Self, Self::Error> {
        let payload = match req.question_type.parse::<QuestionType>()? {
            QuestionType::Interview => QuestionPayload::Interview {
                answer: req.answer.unwrap_or_default(),
            },
            QuestionType::Scenario => QuestionPayload::Scenario(req.scenario),
            QuestionType::Mcq => QuestionPayload::Mcq {
                options: req
                    .options
                    .unwrap_or_default()
                    .iter()
                    .map(|o| o.trim())
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect(),
                correct_answer: req
                    .correct_answer
                    .as_deref()
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
            },
        };

        Ok(Self {
            author: req.author.trim().to_string(),
            question: req.question.trim().to_string(),
            payload,
        })
    }
}

/// Type-specific fields of a stored question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RecordDetails {
    Interview {
        answer: String,
    },
    Scenario(ScenarioDetails),
    Mcq {
        options: Vec<String>,
        correct_answer: String,
    },
}

/// A question already present in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingQuestionRecord {
    pub question: String,
    pub question_type: QuestionType,
    pub author: String,
    pub details: RecordDetails,
}

impl ExistingQuestionRecord {
    /// Convenience constructor for an interview record.
    pub fn interview(
        author: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            question_type: QuestionType::Interview,
            author: author.into(),
            details: RecordDetails::Interview {
                answer: answer.into(),
            },
        }
    }

    /// Decode a record from a row of `question_type`'s table.
    ///
    /// Short rows are padded with empty cells. Returns `None` when the
    /// question cell is blank.
    pub fn from_row(question_type: QuestionType, cells: &[String]) -> Option<Self> {
        let cell = |i: usize| cells.get(i).cloned().unwrap_or_default();

        let question = cell(3);
        if question.trim().is_empty() {
            return None;
        }

        let details = match question_type {
            QuestionType::Interview => RecordDetails::Interview { answer: cell(4) },
            QuestionType::Scenario => RecordDetails::Scenario(ScenarioDetails {
                summary: cell(4),
                diagnosis_steps: cell(5),
                root_cause: cell(6),
                fix: cell(7),
                lesson_learned: cell(8),
                how_to_avoid: cell(9),
            }),
            QuestionType::Mcq => RecordDetails::Mcq {
                options: (4..4 + MCQ_OPTION_SLOTS)
                    .map(cell)
                    .filter(|o| !o.trim().is_empty())
                    .collect(),
                correct_answer: cell(4 + MCQ_OPTION_SLOTS),
            },
        };

        Some(Self {
            question,
            question_type,
            author: cell(1),
            details,
        })
    }
}

/// Ordered cells of a table row. Length and order are fixed per question type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedRow(Vec<String>);

impl PersistedRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self(cells)
    }

    pub fn cells(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::ops::Index<usize> for PersistedRow {
    type Output = String;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

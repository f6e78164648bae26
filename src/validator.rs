// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Submission request validator.
//!
//! Runs before the intake core:
//! - Required fields and minimum lengths
//! - Question type membership
//! - Type-specific payload checks (interview answer, MCQ options)

use crate::config::ValidationConfig;
use crate::model::{QuestionType, SubmissionRequest, MCQ_OPTION_SLOTS};
use thiserror::Error;
use tracing::debug;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field {field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("Unknown question type {0:?}: expected interview, scenario or mcq")]
    UnknownQuestionType(String),

    #[error("Multiple-choice questions need at least {min} options, got {actual}")]
    TooFewOptions { min: usize, actual: usize },

    #[error("Multiple-choice questions take at most {max} options, got {actual}")]
    TooManyOptions { max: usize, actual: usize },

    #[error("Correct answer must be one of the options")]
    CorrectAnswerNotAnOption,
}

/// Result of validation.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// Request is valid
    Valid,
    /// Request is invalid
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }
}

/// Submission request validator.
pub struct SubmissionValidator {
    config: ValidationConfig,
}

impl SubmissionValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a complete submission request.
    pub fn validate(&self, req: &SubmissionRequest) -> ValidationResult {
        match self.check(req) {
            Ok(()) => ValidationResult::Valid,
            Err(err) => {
                debug!(error = %err, "Submission invalid");
                ValidationResult::Invalid(err)
            }
        }
    }

    fn check(&self, req: &SubmissionRequest) -> Result<(), ValidationError> {
        require_len("author", &req.author, self.config.min_author_len)?;
        require_len("question", &req.question, self.config.min_question_len)?;

        if req.question_type.trim().is_empty() {
            return Err(ValidationError::MissingField("questionType"));
        }
        let question_type = req
            .question_type
            .parse::<QuestionType>()
            .map_err(|_| ValidationError::UnknownQuestionType(req.question_type.clone()))?;

        match question_type {
            QuestionType::Interview => {
                let answer = req.answer.as_deref().unwrap_or_default();
                require_len("answer", answer, self.config.min_answer_len)
            }
            QuestionType::Scenario => Ok(()),
            QuestionType::Mcq => self.check_mcq(req),
        }
    }

    fn check_mcq(&self, req: &SubmissionRequest) -> Result<(), ValidationError> {
        let options: Vec<&str> = req
            .options
            .iter()
            .flatten()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .collect();

        if options.len() < self.config.min_mcq_options {
            return Err(ValidationError::TooFewOptions {
                min: self.config.min_mcq_options,
                actual: options.len(),
            });
        }
        if options.len() > MCQ_OPTION_SLOTS {
            return Err(ValidationError::TooManyOptions {
                max: MCQ_OPTION_SLOTS,
                actual: options.len(),
            });
        }

        let correct = req.correct_answer.as_deref().unwrap_or_default().trim();
        if correct.is_empty() {
            return Err(ValidationError::MissingField("correctAnswer"));
        }
        if !options.contains(&correct) {
            return Err(ValidationError::CorrectAnswerNotAnOption);
        }
        Ok(())
    }
}

fn require_len(field: &'static str, value: &str, min: usize) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len == 0 {
        Err(ValidationError::MissingField(field))
    } else if len < min {
        Err(ValidationError::TooShort { field, min })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_validator() -> SubmissionValidator {
        SubmissionValidator::new(ValidationConfig::default())
    }

    fn interview() -> SubmissionRequest {
        SubmissionRequest {
            author: "Jane".into(),
            question_type: "interview".into(),
            question: "What is a container?".into(),
            answer: Some("An isolated process".into()),
            ..Default::default()
        }
    }

    fn mcq(options: &[&str], correct: &str) -> SubmissionRequest {
        SubmissionRequest {
            author: "Li".into(),
            question_type: "mcq".into(),
            question: "Which port does SSH use?".into(),
            options: Some(options.iter().map(|s| s.to_string()).collect()),
            correct_answer: Some(correct.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_interview() {
        assert!(default_validator().validate(&interview()).is_valid());
    }

    #[test]
    fn test_missing_author() {
        let req = SubmissionRequest {
            author: "   ".into(),
            ..interview()
        };
        let result = default_validator().validate(&req);
        assert_eq!(result.error(), Some(&ValidationError::MissingField("author")));
    }

    #[test]
    fn test_short_question() {
        let req = SubmissionRequest {
            question: "Why?".into(),
            ..interview()
        };
        let result = default_validator().validate(&req);
        assert!(matches!(
            result.error(),
            Some(ValidationError::TooShort { field: "question", min: 10 })
        ));
    }

    #[test]
    fn test_unknown_question_type() {
        let req = SubmissionRequest {
            question_type: "essay".into(),
            ..interview()
        };
        let result = default_validator().validate(&req);
        assert!(matches!(
            result.error(),
            Some(ValidationError::UnknownQuestionType(tag)) if tag == "essay"
        ));
    }

    #[test]
    fn test_interview_requires_answer() {
        let req = SubmissionRequest {
            answer: None,
            ..interview()
        };
        let result = default_validator().validate(&req);
        assert_eq!(result.error(), Some(&ValidationError::MissingField("answer")));
    }

    #[test]
    fn test_scenario_fields_are_optional() {
        let req = SubmissionRequest {
            question_type: "scenario".into(),
            answer: None,
            ..interview()
        };
        assert!(default_validator().validate(&req).is_valid());
    }

    #[test]
    fn test_valid_mcq() {
        assert!(default_validator()
            .validate(&mcq(&["21", "22", "80"], "22"))
            .is_valid());
    }

    #[test]
    fn test_mcq_blank_options_do_not_count() {
        let result = default_validator().validate(&mcq(&["22", "  ", ""], "22"));
        assert_eq!(
            result.error(),
            Some(&ValidationError::TooFewOptions { min: 2, actual: 1 })
        );
    }

    #[test]
    fn test_mcq_correct_answer_must_be_an_option() {
        let result = default_validator().validate(&mcq(&["21", "22"], "443"));
        assert_eq!(result.error(), Some(&ValidationError::CorrectAnswerNotAnOption));

        let result = default_validator().validate(&mcq(&["21", "22"], ""));
        assert_eq!(result.error(), Some(&ValidationError::MissingField("correctAnswer")));
    }

    #[test]
    fn test_mcq_rejects_options_beyond_row_slots() {
        let options: Vec<String> = (1..=11).map(|i| format!("opt{i}")).collect();
        let refs: Vec<&str> = options.iter().map(String::as_str).collect();
        let result = default_validator().validate(&mcq(&refs, "opt11"));
        assert_eq!(
            result.error(),
            Some(&ValidationError::TooManyOptions { max: 10, actual: 11 })
        );
    }

    #[test]
    fn test_mcq_ten_options_plus_blanks_is_valid() {
        let mut options: Vec<String> = (1..=10).map(|i| format!("opt{i}")).collect();
        options.push("  ".into());
        let refs: Vec<&str> = options.iter().map(String::as_str).collect();
        assert!(default_validator().validate(&mcq(&refs, "opt10")).is_valid());
    }
}

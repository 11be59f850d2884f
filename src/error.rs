//! Error types for the trivia engine.
//!
//! Every failure carries two messages: the full diagnostic (`Display`) for
//! logs, and a short `safe_message` that can be shown in a public chat.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::balance::BalanceError;

/// Result type for trivia operations
pub type TriviaResult<T> = Result<T, TriviaError>;

/// How bad a failure is
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The round or question draw cannot proceed
    Critical,
    /// A precondition was violated or a side path failed
    Runtime,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TriviaError {
    #[error("failed to read question file {path}: {reason}")]
    QuestionFileRead { path: String, reason: String },

    #[error("failed to parse question file {path}: {reason}")]
    QuestionFileParse { path: String, reason: String },

    #[error("question file {0} contains no valid questions")]
    EmptyQuestionFile(String),

    #[error("question entry #{index} could not be parsed: {reason}")]
    InvalidQuestion { index: usize, reason: String },

    #[error("question has no correct answers: {0}")]
    NoCorrectAnswers(String),

    #[error("no questions are available to ask")]
    NoQuestionsAvailable,

    #[error("could not get a question to start a trivia round")]
    QuestionUnavailable,

    #[error("question source is misconfigured: {0}")]
    MisconfiguredSource(String),

    #[error("trivia API request failed: {0}")]
    RemoteApi(String),

    #[error("trivia API request timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to decode trivia API response: {0}")]
    Decode(String),

    #[error("failed to persist used questions to {path}: {reason}")]
    Persistence { path: String, reason: String },

    #[error("balance lookup failed for {username}: {source}")]
    BalanceCheck {
        username: String,
        source: BalanceError,
    },

    #[error("balance adjustment of {delta} failed for {username}: {source}")]
    BalanceAdjustment {
        username: String,
        delta: i64,
        source: BalanceError,
    },

    #[error("create was called while a trivia round was already in progress")]
    RoundInProgress,

    #[error("{0} was called while no trivia round was in progress")]
    NoRoundInProgress(&'static str),
}

impl TriviaError {
    pub fn severity(&self) -> Severity {
        match self {
            TriviaError::QuestionFileRead { .. }
            | TriviaError::QuestionFileParse { .. }
            | TriviaError::EmptyQuestionFile(_)
            | TriviaError::NoCorrectAnswers(_)
            | TriviaError::NoQuestionsAvailable
            | TriviaError::QuestionUnavailable
            | TriviaError::MisconfiguredSource(_)
            | TriviaError::RemoteApi(_)
            | TriviaError::Timeout(_)
            | TriviaError::Decode(_)
            | TriviaError::BalanceCheck { .. } => Severity::Critical,

            TriviaError::InvalidQuestion { .. }
            | TriviaError::Persistence { .. }
            | TriviaError::BalanceAdjustment { .. }
            | TriviaError::RoundInProgress
            | TriviaError::NoRoundInProgress(_) => Severity::Runtime,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.severity() == Severity::Critical
    }

    /// Message that is safe to show in a public channel
    pub fn safe_message(&self) -> String {
        match self {
            TriviaError::QuestionFileRead { .. } => {
                "Error reading trivia file. Please check the file path and ensure it exists."
                    .to_string()
            }
            TriviaError::QuestionFileParse { .. } => {
                "Error parsing trivia file. Please check that the file is in the correct format."
                    .to_string()
            }
            TriviaError::EmptyQuestionFile(_) => {
                "The trivia file does not contain any usable questions.".to_string()
            }
            TriviaError::InvalidQuestion { .. } => {
                "A question in the trivia file could not be read and was skipped.".to_string()
            }
            TriviaError::NoCorrectAnswers(text) => {
                format!("A question in the trivia file has no correct answers. ({})", text)
            }
            TriviaError::NoQuestionsAvailable => {
                "No questions are available to ask. Add more questions to the trivia file or enable question recycling."
                    .to_string()
            }
            TriviaError::QuestionUnavailable => {
                "Could not get a question to start trivia.".to_string()
            }
            TriviaError::MisconfiguredSource(_) => {
                "Trivia questions are misconfigured. Select at least one category, difficulty, and type."
                    .to_string()
            }
            TriviaError::RemoteApi(_) | TriviaError::Timeout(_) | TriviaError::Decode(_) => {
                "An API error occurred while fetching the trivia question.".to_string()
            }
            TriviaError::Persistence { .. } => {
                "An error occurred while saving the used questions file.".to_string()
            }
            TriviaError::BalanceCheck { .. } | TriviaError::BalanceAdjustment { .. } => {
                "A currency error occurred in the trivia game.".to_string()
            }
            TriviaError::RoundInProgress => "A trivia question is already in progress.".to_string(),
            TriviaError::NoRoundInProgress(_) => "No trivia question is in progress.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_classes() {
        assert!(TriviaError::NoQuestionsAvailable.is_critical());
        assert!(TriviaError::MisconfiguredSource("x".into()).is_critical());
        assert!(TriviaError::Timeout(Duration::from_secs(5)).is_critical());
        assert_eq!(TriviaError::RoundInProgress.severity(), Severity::Runtime);
        assert_eq!(
            TriviaError::NoRoundInProgress("cancel").severity(),
            Severity::Runtime
        );
        assert_eq!(
            TriviaError::BalanceAdjustment {
                username: "a".into(),
                delta: 5,
                source: BalanceError::Unavailable("down".into()),
            }
            .severity(),
            Severity::Runtime
        );
    }

    #[test]
    fn test_safe_message_hides_diagnostics() {
        let err = TriviaError::QuestionFileRead {
            path: "/home/streamer/secret/questions.yaml".into(),
            reason: "permission denied".into(),
        };
        assert!(err.to_string().contains("/home/streamer/secret"));
        assert!(!err.safe_message().contains("/home/streamer/secret"));
    }

    #[test]
    fn test_no_round_message_names_action() {
        let err = TriviaError::NoRoundInProgress("cancel");
        assert_eq!(
            err.to_string(),
            "cancel was called while no trivia round was in progress"
        );
    }
}

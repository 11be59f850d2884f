use crate::types::*;
use serde::{Deserialize, Serialize};

/// Why an answer was turned away
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RejectionReason {
    AlreadyAnswered,
    InsufficientBalance,
    InternalError,
}

/// Lifecycle and outcome events emitted by the engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum TriviaEvent {
    GameStarted {
        round_id: RoundId,
        question: String,
        answers: Vec<String>,
        time_limit_secs: u64,
    },
    GameEnded {
        round_id: Option<RoundId>,
        results: RoundState,
    },
    GameCancelled {
        round_id: Option<RoundId>,
    },
    /// Batched "answer locked in" acknowledgement; never reveals correctness
    AnswerAccepted {
        usernames: Vec<String>,
    },
    AnswerRejected {
        username: Username,
        answer_index: usize,
        balance: Option<i64>,
        wager: Option<i64>,
        reason_code: RejectionReason,
        reason_message: String,
    },
    /// Settlement line for a correct answer; amount is net points won
    AnswerCorrect {
        username: Username,
        answer: String,
        answer_index: usize,
        amount: i64,
    },
    /// Settlement line for an incorrect answer; amount is the wager lost
    AnswerIncorrect {
        username: Username,
        answer: String,
        answer_index: usize,
        amount: i64,
    },
    ErrorCritical {
        message: String,
        safe_message: String,
    },
    ErrorRuntime {
        message: String,
        safe_message: String,
    },
}

impl TriviaEvent {
    /// Stable event identifier, as exposed to hosts that route by name
    pub fn event_id(&self) -> &'static str {
        match self {
            TriviaEvent::GameStarted { .. } => "triviaGameStarted",
            TriviaEvent::GameEnded { .. } => "triviaGameEnded",
            TriviaEvent::GameCancelled { .. } => "triviaGameCancelled",
            TriviaEvent::AnswerAccepted { .. } => "triviaAnswerAccepted",
            TriviaEvent::AnswerRejected { .. } => "triviaAnswerRejected",
            TriviaEvent::AnswerCorrect { .. } => "triviaAnswerCorrect",
            TriviaEvent::AnswerIncorrect { .. } => "triviaAnswerIncorrect",
            TriviaEvent::ErrorCritical { .. } => "triviaErrorCritical",
            TriviaEvent::ErrorRuntime { .. } => "triviaErrorRuntime",
        }
    }
}

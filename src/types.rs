use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Opaque ID types for readability
pub type RoundId = String;
pub type Username = String;
pub type QuestionKey = String;

/// A question as loaded from a source. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_text: String,
    pub correct_answers: Vec<String>,
    pub incorrect_answers: Vec<String>,
}

/// A question as shown for one round: merged, ordered choices plus the
/// positions of the correct ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PresentedQuestion {
    pub question: Question,
    pub answers: Vec<String>,
    pub correct_indices: BTreeSet<usize>,
}

impl PresentedQuestion {
    pub fn is_correct(&self, index: usize) -> bool {
        self.correct_indices.contains(&index)
    }
}

/// One user's answer in the current round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    pub answered_at: DateTime<Utc>,
    pub choice_index: usize,
    /// Amount deducted at the user's first answer
    pub wager: i64,
    /// Total credited on a correct answer (wager return included)
    pub award: i64,
    pub correct: bool,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundPhase {
    #[default]
    Idle,
    Active,
    Complete,
}

/// A settled player line in the round results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResult {
    pub username: Username,
    pub display_name: String,
    pub answer_index: usize,
    /// Net points won (winners) or wager lost (losers)
    pub points: i64,
}

/// State of the active or most recent round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RoundState {
    pub round_id: Option<RoundId>,
    pub phase: RoundPhase,
    pub presented: Option<PresentedQuestion>,
    pub started_at: Option<DateTime<Utc>>,
    pub total_players: u32,
    pub total_correct: u32,
    pub total_incorrect: u32,
    pub total_awarded: i64,
    pub total_lost: i64,
    pub winners: Vec<PlayerResult>,
    pub losers: Vec<PlayerResult>,
    /// Net currency movement per user this round (applied, or would-be in dry run)
    pub currency_adjustments: BTreeMap<Username, i64>,
}

impl RoundState {
    pub fn is_active(&self) -> bool {
        self.phase == RoundPhase::Active
    }

    pub fn is_complete(&self) -> bool {
        self.phase == RoundPhase::Complete
    }

    /// The presented question, only while answers are being accepted
    pub fn active_question(&self) -> Option<&PresentedQuestion> {
        if self.is_active() {
            self.presented.as_ref()
        } else {
            None
        }
    }

    pub fn winner_names(&self) -> Vec<String> {
        self.winners.iter().map(|w| w.display_name.clone()).collect()
    }

    /// Winners formatted like `"Name (+42)"`
    pub fn winners_with_points(&self) -> Vec<String> {
        self.winners
            .iter()
            .map(|w| format!("{} (+{})", w.display_name, w.points))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, points: i64) -> PlayerResult {
        PlayerResult {
            username: name.to_lowercase(),
            display_name: name.to_string(),
            answer_index: 0,
            points,
        }
    }

    #[test]
    fn test_default_round_is_idle() {
        let state = RoundState::default();
        assert_eq!(state.phase, RoundPhase::Idle);
        assert!(state.active_question().is_none());
    }

    #[test]
    fn test_winners_with_points() {
        let state = RoundState {
            phase: RoundPhase::Complete,
            winners: vec![result("Alice", 42), result("Bob", 30)],
            ..Default::default()
        };
        assert_eq!(state.winner_names(), vec!["Alice", "Bob"]);
        assert_eq!(state.winners_with_points(), vec!["Alice (+42)", "Bob (+30)"]);
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&RoundPhase::Active).unwrap();
        assert_eq!(json, "\"ACTIVE\"");
    }
}

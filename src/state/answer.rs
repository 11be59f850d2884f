use super::GameManager;
use crate::answer::{answer_label, validate_answer};
use crate::config::CurrencySettings;
use crate::error::TriviaError;
use crate::protocol::{RejectionReason, TriviaEvent};
use crate::types::AnswerEntry;

/// `(1 - clamp(elapsed / limit, 0, 1)) ^ decay`
pub fn time_bonus_factor(elapsed_secs: f64, limit_secs: f64, decay: f64) -> f64 {
    let time_factor = if limit_secs > 0.0 {
        (elapsed_secs / limit_secs).clamp(0.0, 1.0)
    } else {
        1.0
    };
    (1.0 - time_factor).powf(decay)
}

/// Total credited for a correct answer, wager included
pub fn award_for(wager: i64, currency: &CurrencySettings, elapsed_secs: f64, limit_secs: f64) -> i64 {
    let factor = time_bonus_factor(elapsed_secs, limit_secs, currency.time_bonus_decay);
    let bonus = (currency.time_bonus as f64 * factor).ceil() as i64;
    wager + currency.payout + bonus
}

impl GameManager {
    /// Offer a chat message as an answer to the active round.
    ///
    /// Returns true when the answer was recorded. Ordinary chat that is not
    /// an answer returns false without any event or log line.
    pub async fn handle_answer(&self, username: &str, display_name: &str, text: &str) -> bool {
        let mut slot = self.inner.round.lock().await;
        let Some(answer_index) = validate_answer(text, slot.state.active_question()) else {
            return false;
        };

        let settings = self.settings().await;
        let display_name = if display_name.trim().is_empty() {
            username
        } else {
            display_name
        }
        .to_string();
        let label = answer_label(answer_index).unwrap_or('?');

        let previous = slot
            .ledger
            .get(username)
            .map(|entry| (entry.choice_index, entry.wager));

        let wager = match previous {
            Some((_, wager)) if !settings.gameplay.permit_answer_change => {
                tracing::debug!("User {} has already answered the question", username);
                let balance = self.inner.balances.get_balance(username).await.ok();
                self.reject(
                    username,
                    answer_index,
                    balance,
                    Some(wager),
                    RejectionReason::AlreadyAnswered,
                    "You have already answered the question".to_string(),
                );
                return false;
            }
            Some((previous_index, _)) if previous_index == answer_index => {
                tracing::debug!("User {} repeated their answer {}", username, label);
                return false;
            }
            Some((previous_index, wager)) => {
                // Charged once at the first answer
                tracing::debug!(
                    "User {} changed their answer from {} to {}. Original wager was {}",
                    username,
                    answer_label(previous_index).unwrap_or('?'),
                    label,
                    wager
                );
                wager
            }
            None => {
                let balance = match self.inner.balances.get_balance(username).await {
                    Ok(balance) => balance,
                    Err(source) => {
                        self.report(TriviaError::BalanceCheck {
                            username: username.to_string(),
                            source,
                        });
                        self.reject(
                            username,
                            answer_index,
                            None,
                            Some(settings.currency.wager),
                            RejectionReason::InternalError,
                            "Your balance could not be checked. Please try again.".to_string(),
                        );
                        return false;
                    }
                };

                let mut wager = settings.currency.wager;
                if balance < wager {
                    if !settings.currency.allow_insufficient_balance {
                        tracing::debug!(
                            "User {} does not have enough currency to wager {}",
                            username,
                            wager
                        );
                        self.reject(
                            username,
                            answer_index,
                            Some(balance),
                            Some(wager),
                            RejectionReason::InsufficientBalance,
                            format!(
                                "You do not have enough currency to play. You need at least {}.",
                                wager
                            ),
                        );
                        return false;
                    }
                    tracing::debug!(
                        "User {} cannot cover a wager of {}; wagering {} instead",
                        username,
                        wager,
                        balance
                    );
                    wager = balance.max(0);
                }

                // Taken before scoring so balances never hint at the answer
                if !self
                    .apply_adjustment(
                        &mut slot.state,
                        username,
                        -wager,
                        settings.currency.dry_run,
                    )
                    .await
                {
                    self.reject(
                        username,
                        answer_index,
                        Some(balance),
                        Some(wager),
                        RejectionReason::InternalError,
                        "Your wager could not be placed. Please try again.".to_string(),
                    );
                    return false;
                }
                tracing::debug!("User {} wagered {}", username, wager);
                wager
            }
        };

        let now = self.inner.clock.now();
        let correct = slot
            .state
            .active_question()
            .is_some_and(|presented| presented.is_correct(answer_index));

        let award = match (correct, slot.state.started_at) {
            (true, Some(started_at)) => {
                let elapsed = (now - started_at).num_milliseconds() as f64 / 1000.0;
                let limit = settings.time_limit().as_secs_f64();
                let award = award_for(wager, &settings.currency, elapsed, limit);
                tracing::debug!(
                    "Answer correct: {} answered {} after {:.1}s; award {} (wager {})",
                    username,
                    label,
                    elapsed,
                    award,
                    wager
                );
                award
            }
            _ => {
                tracing::debug!("Answer incorrect: {} answered {}", username, label);
                0
            }
        };

        slot.ledger.upsert(
            username,
            AnswerEntry {
                answered_at: now,
                choice_index: answer_index,
                wager,
                award,
                correct,
                display_name: display_name.clone(),
            },
        );
        slot.pending.mark(display_name);
        true
    }

    fn reject(
        &self,
        username: &str,
        answer_index: usize,
        balance: Option<i64>,
        wager: Option<i64>,
        reason_code: RejectionReason,
        reason_message: String,
    ) {
        self.inner.sink.emit(TriviaEvent::AnswerRejected {
            username: username.to_string(),
            answer_index,
            balance,
            wager,
            reason_code,
            reason_message,
        });
    }
}

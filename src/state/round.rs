use super::{GameManager, RoundSlot};
use crate::answer::answer_label;
use crate::error::{TriviaError, TriviaResult};
use crate::presenter::prepare_question;
use crate::protocol::TriviaEvent;
use crate::types::*;

impl GameManager {
    /// Start a new round.
    ///
    /// Fails without touching the previous round's state when a round is
    /// already active or no question can be drawn.
    pub async fn create(&self) -> TriviaResult<RoundId> {
        let mut slot = self.inner.round.lock().await;
        if slot.state.is_active() {
            return Err(self.report(TriviaError::RoundInProgress));
        }

        let settings = self.settings().await;
        let supply = self.supply().await;
        let Some(question) = supply.get_new_question().await else {
            return Err(self.report(TriviaError::QuestionUnavailable));
        };

        let presented = prepare_question(
            question,
            settings.gameplay.answer_sort_order,
            &mut rand::rng(),
        );
        tracing::debug!(
            "A question has been prepared: {}",
            presented.question.question_text
        );

        slot.clear_transient();
        let round_id = ulid::Ulid::new().to_string();
        slot.state = RoundState {
            round_id: Some(round_id.clone()),
            phase: RoundPhase::Active,
            presented: Some(presented.clone()),
            started_at: Some(self.inner.clock.now()),
            ..Default::default()
        };

        slot.timers.notification =
            Some(self.arm_notification(round_id.clone(), settings.confirmation_interval()));
        slot.timers.deadline = Some(self.arm_deadline(round_id.clone(), settings.time_limit()));

        self.inner.sink.emit(TriviaEvent::GameStarted {
            round_id: round_id.clone(),
            question: presented.question.question_text,
            answers: presented.answers,
            time_limit_secs: settings.time_limit().as_secs(),
        });
        tracing::info!("Trivia round {} has started", round_id);
        Ok(round_id)
    }

    /// Settle the active round now. Normally the deadline timer does this.
    pub async fn end(&self) -> Option<RoundState> {
        let mut slot = self.inner.round.lock().await;
        if !slot.state.is_active() {
            slot.clear_transient();
            self.report(TriviaError::NoRoundInProgress("end"));
            return None;
        }
        Some(self.settle(&mut slot).await)
    }

    /// Stop the active round and refund every wager. No payouts.
    pub async fn cancel(&self) -> TriviaResult<()> {
        let mut slot = self.inner.round.lock().await;
        if !slot.state.is_active() {
            slot.clear_transient();
            return Err(self.report(TriviaError::NoRoundInProgress("cancel")));
        }

        let dry_run = self.inner.settings.read().await.currency.dry_run;
        let refunds: Vec<(Username, i64)> = slot
            .ledger
            .iter()
            .map(|(username, entry)| (username.clone(), entry.wager))
            .collect();
        for (username, wager) in refunds {
            tracing::debug!("Refunding wager of {} for user {}", wager, username);
            self.apply_adjustment(&mut slot.state, &username, wager, dry_run)
                .await;
        }

        let round_id = slot.state.round_id.take();
        slot.clear_transient();
        slot.state = RoundState::default();

        self.inner.sink.emit(TriviaEvent::GameCancelled {
            round_id: round_id.clone(),
        });
        tracing::info!("Trivia round {:?} has been cancelled", round_id);
        Ok(())
    }

    /// Pay out the ledger and move the round to Complete.
    pub(super) async fn settle(&self, slot: &mut RoundSlot) -> RoundState {
        slot.timers.abort_notification();
        self.answer_accepted_handler(slot, false).await;

        let dry_run = self.inner.settings.read().await.currency.dry_run;
        let entries: Vec<(Username, AnswerEntry)> = slot
            .ledger
            .iter()
            .map(|(username, entry)| (username.clone(), entry.clone()))
            .collect();

        let mut winners = Vec::new();
        let mut losers = Vec::new();
        for (username, entry) in entries {
            let answer = answer_label(entry.choice_index)
                .map(String::from)
                .unwrap_or_default();

            let points = if entry.correct {
                tracing::debug!(
                    "User {} answered correctly. Awarding {} (includes wager of {})",
                    username,
                    entry.award,
                    entry.wager
                );
                self.apply_adjustment(&mut slot.state, &username, entry.award, dry_run)
                    .await;
                let points = entry.award - entry.wager;
                slot.state.total_awarded += points;
                slot.state.total_correct += 1;
                self.inner.sink.emit(TriviaEvent::AnswerCorrect {
                    username: username.clone(),
                    answer,
                    answer_index: entry.choice_index,
                    amount: points,
                });
                points
            } else {
                slot.state.total_lost += entry.wager;
                slot.state.total_incorrect += 1;
                self.inner.sink.emit(TriviaEvent::AnswerIncorrect {
                    username: username.clone(),
                    answer,
                    answer_index: entry.choice_index,
                    amount: entry.wager,
                });
                entry.wager
            };
            slot.state.total_players += 1;

            let result = PlayerResult {
                username,
                display_name: entry.display_name,
                answer_index: entry.choice_index,
                points,
            };
            if entry.correct {
                winners.push(result);
            } else {
                losers.push(result);
            }
        }

        // Stable, so ties keep answer order
        winners.sort_by(|a, b| b.points.cmp(&a.points));
        slot.state.winners = winners;
        slot.state.losers = losers;
        slot.state.phase = RoundPhase::Complete;

        let results = slot.state.clone();
        self.inner.sink.emit(TriviaEvent::GameEnded {
            round_id: results.round_id.clone(),
            results: results.clone(),
        });
        slot.clear_transient();

        tracing::info!(
            "Trivia round {:?} has ended: {} players, {} correct",
            results.round_id,
            results.total_players,
            results.total_correct
        );
        results
    }

    /// Push a balance delta, or only record it in dry-run mode.
    /// A failed call is reported and skipped.
    pub(super) async fn apply_adjustment(
        &self,
        state: &mut RoundState,
        username: &str,
        delta: i64,
        dry_run: bool,
    ) -> bool {
        if !dry_run {
            if let Err(source) = self.inner.balances.adjust_balance(username, delta).await {
                self.report(TriviaError::BalanceAdjustment {
                    username: username.to_string(),
                    delta,
                    source,
                });
                return false;
            }
        }
        *state
            .currency_adjustments
            .entry(username.to_string())
            .or_insert(0) += delta;
        true
    }

    pub(super) fn report(&self, error: TriviaError) -> TriviaError {
        self.inner.reporter.report(&error);
        error
    }
}

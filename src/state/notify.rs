use super::{GameManager, RoundSlot};
use crate::protocol::TriviaEvent;
use std::collections::BTreeSet;

/// Display names whose answers were accepted since the last flush
#[derive(Debug, Default)]
pub struct NotificationBatch {
    pending: BTreeSet<String>,
}

impl NotificationBatch {
    pub fn mark(&mut self, display_name: String) {
        self.pending.insert(display_name);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every pending name, sorted case-insensitively
    pub fn drain(&mut self) -> Vec<String> {
        let mut names: Vec<String> = std::mem::take(&mut self.pending).into_iter().collect();
        names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
        names
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl GameManager {
    /// Emit one "answer accepted" batch if anyone is pending, then re-arm or
    /// stop the notification timer.
    pub(super) async fn answer_accepted_handler(&self, slot: &mut RoundSlot, reschedule: bool) {
        if !slot.pending.is_empty() {
            let usernames = slot.pending.drain();
            tracing::debug!("Trivia answers accepted for: {}", usernames.join(", "));
            self.inner
                .sink
                .emit(TriviaEvent::AnswerAccepted { usernames });
        }

        if reschedule {
            if let Some(round_id) = slot.state.round_id.clone() {
                let interval = self.inner.settings.read().await.confirmation_interval();
                slot.timers.notification = Some(self.arm_notification(round_id, interval));
            }
        } else {
            slot.timers.abort_notification();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_sorts_and_dedupes() {
        let mut batch = NotificationBatch::default();
        batch.mark("bob".into());
        batch.mark("Alice".into());
        batch.mark("bob".into());
        batch.mark("Carol".into());

        assert_eq!(batch.drain(), vec!["Alice", "bob", "Carol"]);
        assert!(batch.is_empty());
        assert!(batch.drain().is_empty());
    }
}

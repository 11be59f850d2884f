//! Deadline and notification timers.
//!
//! Each timer is a spawned task that sleeps and then calls back into the
//! manager. Tasks hold a weak reference so a dropped manager stops them.

use super::{GameManager, RoundSlot};
use crate::types::RoundId;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub(crate) struct RoundTimers {
    pub(crate) deadline: Option<JoinHandle<()>>,
    pub(crate) notification: Option<JoinHandle<()>>,
}

impl RoundTimers {
    pub(crate) fn abort_notification(&mut self) {
        if let Some(handle) = self.notification.take() {
            handle.abort();
        }
    }

    /// Aborting a finished or already aborted task is a no-op
    pub(crate) fn abort_all(&mut self) {
        self.abort_notification();
        if let Some(handle) = self.deadline.take() {
            handle.abort();
        }
    }

    #[cfg(test)]
    pub(crate) fn live(&self) -> usize {
        [&self.deadline, &self.notification]
            .into_iter()
            .flatten()
            .filter(|h| !h.is_finished())
            .count()
    }
}

fn owns(slot: &RoundSlot, round_id: &str) -> bool {
    slot.state.is_active() && slot.state.round_id.as_deref() == Some(round_id)
}

impl GameManager {
    pub(super) fn arm_deadline(&self, round_id: RoundId, after: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(inner) = weak.upgrade() {
                GameManager { inner }.deadline_fired(&round_id).await;
            }
        })
    }

    pub(super) fn arm_notification(&self, round_id: RoundId, after: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(inner) = weak.upgrade() {
                GameManager { inner }.notification_fired(&round_id).await;
            }
        })
    }

    async fn deadline_fired(&self, round_id: &str) {
        let mut slot = self.inner.round.lock().await;
        if !owns(&slot, round_id) {
            tracing::debug!("Ignoring deadline for stale round {}", round_id);
            return;
        }
        // Detach rather than abort: this task is the one running
        slot.timers.deadline.take();
        tracing::debug!("Answer time is up for round {}", round_id);
        self.settle(&mut slot).await;
    }

    async fn notification_fired(&self, round_id: &str) {
        let mut slot = self.inner.round.lock().await;
        if !owns(&slot, round_id) {
            return;
        }
        slot.timers.notification.take();
        self.answer_accepted_handler(&mut slot, true).await;
    }
}

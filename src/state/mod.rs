mod answer;
mod ledger;
mod notify;
mod round;
mod timers;

pub use answer::{award_for, time_bonus_factor};
pub use ledger::Ledger;
pub use notify::NotificationBatch;

use crate::balance::BalanceService;
use crate::broadcast::{ErrorReporter, EventSink};
use crate::clock::{Clock, SystemClock};
use crate::config::GameSettings;
use crate::questions::QuestionSupply;
use crate::types::*;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use timers::RoundTimers;

/// Everything a round transition touches, guarded by one lock
#[derive(Debug, Default)]
pub(crate) struct RoundSlot {
    pub(crate) state: RoundState,
    pub(crate) ledger: Ledger,
    pub(crate) pending: NotificationBatch,
    pub(crate) timers: RoundTimers,
}

impl RoundSlot {
    /// Drop per-round caches and stop both timers
    fn clear_transient(&mut self) {
        self.ledger.clear();
        self.pending.clear();
        self.timers.abort_all();
    }
}

struct Inner {
    round: Mutex<RoundSlot>,
    settings: RwLock<GameSettings>,
    supply: RwLock<Arc<QuestionSupply>>,
    balances: Arc<dyn BalanceService>,
    sink: Arc<dyn EventSink>,
    reporter: ErrorReporter,
    clock: Arc<dyn Clock>,
}

/// Runs trivia rounds: one at a time, settled against the balance service.
///
/// Cloning is cheap; clones share the same round.
#[derive(Clone)]
pub struct GameManager {
    inner: Arc<Inner>,
}

impl GameManager {
    /// Manager with the question source named by `settings`
    pub fn new(
        settings: GameSettings,
        balances: Arc<dyn BalanceService>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let supply = QuestionSupply::from_settings(&settings, ErrorReporter::new(sink.clone()));
        Self::with_supply(settings, supply, balances, sink, Arc::new(SystemClock))
    }

    pub fn with_supply(
        settings: GameSettings,
        supply: QuestionSupply,
        balances: Arc<dyn BalanceService>,
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let reporter = ErrorReporter::new(sink.clone());
        Self {
            inner: Arc::new(Inner {
                round: Mutex::new(RoundSlot::default()),
                settings: RwLock::new(settings),
                supply: RwLock::new(Arc::new(supply)),
                balances,
                sink,
                reporter,
                clock,
            }),
        }
    }

    /// Prepare the question source. Failures are reported, not returned.
    pub async fn initialize(&self) -> bool {
        self.supply().await.initialize().await
    }

    async fn supply(&self) -> Arc<QuestionSupply> {
        self.inner.supply.read().await.clone()
    }

    pub async fn settings(&self) -> GameSettings {
        self.inner.settings.read().await.clone()
    }

    /// Replace the settings snapshot and rebuild the question source.
    ///
    /// A round in progress keeps running; values are read again when next needed.
    pub async fn update_settings(&self, settings: GameSettings) -> bool {
        let supply = Arc::new(QuestionSupply::from_settings(
            &settings,
            self.inner.reporter.clone(),
        ));
        *self.inner.settings.write().await = settings;
        let initialized = supply.initialize().await;
        *self.inner.supply.write().await = supply;
        tracing::info!("Trivia settings updated");
        initialized
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.inner.reporter
    }

    /// Snapshot of the active or most recent round
    pub async fn round_state(&self) -> RoundState {
        self.inner.round.lock().await.state.clone()
    }

    pub async fn is_active(&self) -> bool {
        self.inner.round.lock().await.state.is_active()
    }

    /// Seconds left to answer, or `None` when no round is active
    pub async fn time_remaining(&self) -> Option<f64> {
        let started_at = {
            let slot = self.inner.round.lock().await;
            if !slot.state.is_active() {
                return None;
            }
            slot.state.started_at?
        };
        let limit = self.inner.settings.read().await.time_limit().as_secs_f64();
        let elapsed = (self.inner.clock.now() - started_at).num_milliseconds() as f64 / 1000.0;
        Some((limit - elapsed).max(0.0))
    }

    #[cfg(test)]
    async fn live_timers(&self) -> usize {
        self.inner.round.lock().await.timers.live()
    }
}

//! Currency balance service seam.
//!
//! The engine never stores balances itself. It reads a balance before a
//! user's first answer and pushes signed deltas (wager, award, refund).

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::types::Username;

#[derive(Debug, Clone, thiserror::Error)]
pub enum BalanceError {
    #[error("balance service unavailable: {0}")]
    Unavailable(String),

    #[error("unknown user: {0}")]
    UnknownUser(String),
}

/// External balance service
#[async_trait]
pub trait BalanceService: Send + Sync {
    async fn get_balance(&self, username: &str) -> Result<i64, BalanceError>;

    /// Apply a signed delta to a user's balance
    async fn adjust_balance(&self, username: &str, delta: i64) -> Result<(), BalanceError>;
}

/// In-memory balances for the standalone host and tests
#[derive(Debug, Default)]
pub struct InMemoryBalances {
    balances: RwLock<HashMap<Username, i64>>,
    starting_balance: i64,
}

impl InMemoryBalances {
    /// Users that were never seen start with `starting_balance`
    pub fn new(starting_balance: i64) -> Self {
        Self {
            balances: RwLock::new(HashMap::new()),
            starting_balance,
        }
    }

    pub async fn set_balance(&self, username: &str, amount: i64) {
        self.balances
            .write()
            .await
            .insert(username.to_string(), amount);
    }

    pub async fn snapshot(&self) -> HashMap<Username, i64> {
        self.balances.read().await.clone()
    }
}

#[async_trait]
impl BalanceService for InMemoryBalances {
    async fn get_balance(&self, username: &str) -> Result<i64, BalanceError> {
        Ok(self
            .balances
            .read()
            .await
            .get(username)
            .copied()
            .unwrap_or(self.starting_balance))
    }

    async fn adjust_balance(&self, username: &str, delta: i64) -> Result<(), BalanceError> {
        let mut balances = self.balances.write().await;
        let balance = balances
            .entry(username.to_string())
            .or_insert(self.starting_balance);
        *balance += delta;
        tracing::debug!(
            "Adjusted balance for {} by {} (now {})",
            username,
            delta,
            balance
        );
        Ok(())
    }
}

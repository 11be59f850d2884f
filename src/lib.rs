// Public API for integration tests and embedding hosts

pub mod answer;
pub mod api;
pub mod balance;
pub mod broadcast;
pub mod clock;
pub mod config;
pub mod error;
pub mod presenter;
pub mod protocol;
pub mod questions;
pub mod state;
pub mod types;
pub mod ws;

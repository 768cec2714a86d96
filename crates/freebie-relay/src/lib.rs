//! The freebie relay: poll GamerPower, notify each configured Discord
//! channel of every giveaway exactly once.
//!
//! The [`Engine`](engine::Engine) owns the poll/deduplicate/deliver cycle and
//! startup reconciliation; [`scheduler::run`] drives it on a fixed period.

pub mod config;
pub mod engine;
pub mod error;
pub mod scheduler;

pub use crate::config::RelayConfig;
pub use engine::{Engine, EngineSettings, EngineState};
pub use error::{Error, Result};

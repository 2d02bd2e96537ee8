//! # Stepwise Runtime
//!
//! Wires config, LLM backend, built-in actions and in-memory stores into a
//! [`RuntimeApp`] that generates and executes plans.

mod app;
mod bootstrap;

pub use app::{RunOptions, RunOutcome, RuntimeApp, RuntimeError};
pub use bootstrap::init_tracing_if_needed;

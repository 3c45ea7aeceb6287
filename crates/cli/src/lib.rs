//! Minibank CLI - command orchestrator
//!
//! This crate provides the `minibank` binary and the application context
//! that wires the store, ledger, cards, gateway and notifier together.

pub mod commands;
pub mod context;

pub use context::{AppContext, Config};

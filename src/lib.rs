//! Library modules for the jackpot herald.
//!
//! The binary in `main.rs` only wires configuration, logging and shutdown
//! around `agent::Agent`.

pub mod agent;
pub mod config;
pub mod handlers;
pub mod messages;
pub mod notifier;
pub mod onchain;
pub mod social;
pub mod stats;

#[cfg(test)]
mod testing;

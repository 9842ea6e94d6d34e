//! On-chain side of the herald for the 100x Jackpot game.
//!
//! Polls the JackpotGame contract for game events and reads the aggregate
//! stats the summaries are built from:
//! 1. JackpotWon: a player guessed the secret
//! 2. SocialAnnouncement: the contract asks for a post (new secret, funding, ...)
//! 3. NewPlayer: first guess from an address
//! 4. HintRequested: a player bought a hint
//! 5. HintAdded: the admin published a new hint
//!
//! Architecture:
//! - `ChainReader` / `ChainWriter`: the narrow collaborator traits the rest of
//!   the crate depends on
//! - `ChainClient` / `Announcer`: alloy HTTP implementations of those traits
//! - `Poller`: one cursor-based `EventFilter` per event kind, polled in
//!   registration order each tick

pub mod abi;
pub mod client;
pub mod poller;
pub mod types;

pub use client::{Announcer, ChainClient, ChainError, ChainReader, ChainWriter};
pub use poller::{EventFilter, Poller};
pub use types::{ChainEvent, EventKind, GameEvent};

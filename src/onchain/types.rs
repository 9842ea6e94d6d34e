//! Game event types decoded from JackpotGame logs.

use alloy::primitives::{Address, U256};

/// The five watched event kinds, in filter-registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    JackpotWon,
    SocialAnnouncement,
    NewPlayer,
    HintRequested,
    HintAdded,
}

impl EventKind {
    /// Registration order. The poller yields kinds in exactly this order.
    pub const ALL: [EventKind; 5] = [
        EventKind::JackpotWon,
        EventKind::SocialAnnouncement,
        EventKind::NewPlayer,
        EventKind::HintRequested,
        EventKind::HintAdded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::JackpotWon => "JackpotWon",
            EventKind::SocialAnnouncement => "SocialAnnouncement",
            EventKind::NewPlayer => "NewPlayer",
            EventKind::HintRequested => "HintRequested",
            EventKind::HintAdded => "HintAdded",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded event payload.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Someone guessed the secret. `amount` is in wei.
    JackpotWon {
        winner: Address,
        amount: U256,
        guess: String,
    },

    /// Free-form announcement; `kind` is an open tag such as `NEW_SECRET`.
    SocialAnnouncement { kind: String, message: String },

    NewPlayer { player: Address },

    HintRequested { player: Address, hint_index: u64 },

    HintAdded { index: u64 },
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::JackpotWon { .. } => EventKind::JackpotWon,
            Self::SocialAnnouncement { .. } => EventKind::SocialAnnouncement,
            Self::NewPlayer { .. } => EventKind::NewPlayer,
            Self::HintRequested { .. } => EventKind::HintRequested,
            Self::HintAdded { .. } => EventKind::HintAdded,
        }
    }
}

impl std::fmt::Display for GameEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JackpotWon { winner, amount, guess } => {
                write!(f, "JackpotWon(winner={}, amount={}, guess={:?})", winner, amount, guess)
            }
            Self::SocialAnnouncement { kind, message } => {
                write!(f, "SocialAnnouncement({}: {})", kind, message)
            }
            Self::NewPlayer { player } => write!(f, "NewPlayer({})", player),
            Self::HintRequested { player, hint_index } => {
                write!(f, "HintRequested(player={}, hint={})", player, hint_index)
            }
            Self::HintAdded { index } => write!(f, "HintAdded({})", index),
        }
    }
}

/// One decoded log entry with its chain position.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainEvent {
    pub block_number: u64,
    pub log_index: u64,
    pub event: GameEvent,
}

/// Core counters returned by `getGameStats()`. Jackpot is in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoreStats {
    pub total_guesses: u64,
    pub unique_players: u64,
    pub total_winners: u64,
    pub jackpot_wei: U256,
}

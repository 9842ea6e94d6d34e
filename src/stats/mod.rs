//! Cached game statistics and the recent-activity log.
//!
//! `GameStats` is the herald's local picture of the game. Event handlers
//! bump counters directly; `refresh` periodically overwrites them from the
//! contracts. Each of the three refresh reads fails independently.

use crate::messages::wei_to_ether;
use crate::onchain::ChainReader;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Maximum activities kept in memory.
pub const MAX_ACTIVITIES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    JackpotWin,
    Announcement,
    NewPlayer,
    HintPurchased,
    HintAdded,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::JackpotWin => "jackpot_win",
            ActivityKind::Announcement => "announcement",
            ActivityKind::NewPlayer => "new_player",
            ActivityKind::HintPurchased => "hint_purchased",
            ActivityKind::HintAdded => "hint_added",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    kind: ActivityKind,
    message: String,
    timestamp: DateTime<Utc>,
}

impl Activity {
    pub fn new(kind: ActivityKind, message: impl Into<String>) -> Self {
        Self::at(kind, message, Utc::now())
    }

    pub fn at(kind: ActivityKind, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp,
        }
    }

    pub fn kind(&self) -> ActivityKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Ring buffer of the last `MAX_ACTIVITIES` activities, oldest first.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: VecDeque<Activity>,
}

impl ActivityLog {
    pub fn push(&mut self, activity: Activity) {
        if self.entries.len() >= MAX_ACTIVITIES {
            self.entries.pop_front();
        }
        self.entries.push_back(activity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.entries.iter()
    }

    /// The `n` newest activities by timestamp, newest first.
    pub fn most_recent(&self, n: usize) -> Vec<&Activity> {
        let mut sorted: Vec<&Activity> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sorted.truncate(n);
        sorted
    }
}

/// Which parts of a refresh succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub core: bool,
    pub pool: bool,
    pub hints: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GameStats {
    pub total_guesses: u64,
    pub unique_players: u64,
    pub total_winners: u64,
    /// Current jackpot in whole units.
    pub jackpot_amount: Decimal,
    pub token_price: Decimal,
    pub liquidity: Decimal,
    pub hint_count: u64,
    pub hints_purchased: Vec<u64>,
    pub last_hint_time: Option<DateTime<Utc>>,
    pub last_winner: Option<Address>,
    pub last_win_time: Option<DateTime<Utc>>,
    pub last_refresh: Option<DateTime<Utc>>,
    pub activities: ActivityLog,
}

impl GameStats {
    pub fn add_activity(&mut self, kind: ActivityKind, message: impl Into<String>) {
        let activity = Activity::new(kind, message);
        debug!(kind = kind.as_str(), message = activity.message(), "activity recorded");
        self.activities.push(activity);
    }

    /// Re-read the game counters from chain.
    ///
    /// A failed core read abandons the refresh and keeps the previous
    /// snapshot. Liquidity and price are only written when both reads
    /// succeed. A failed hint count read keeps the previous count.
    pub async fn refresh(&mut self, chain: &dyn ChainReader) -> RefreshReport {
        let mut report = RefreshReport::default();

        let core = match chain.game_stats().await {
            Ok(core) => core,
            Err(e) => {
                warn!(error = %e, "game stats read failed, keeping previous snapshot");
                return report;
            }
        };
        self.total_guesses = core.total_guesses;
        self.unique_players = core.unique_players;
        self.total_winners = core.total_winners;
        self.jackpot_amount = wei_to_ether(core.jackpot_wei);
        self.last_refresh = Some(Utc::now());
        report.core = true;

        match read_pool(chain).await {
            Ok((liquidity, price)) => {
                self.liquidity = liquidity;
                self.token_price = price;
                report.pool = true;
            }
            Err(e) => warn!(error = %e, "bonding curve read failed, keeping previous price"),
        }

        match chain.hint_count().await {
            Ok(count) => {
                self.hint_count = count;
                report.hints = true;
            }
            Err(e) => warn!(error = %e, "hint count read failed"),
        }

        info!(
            jackpot = %self.jackpot_amount,
            players = self.unique_players,
            guesses = self.total_guesses,
            winners = self.total_winners,
            price = %self.token_price,
            hints = self.hint_count,
            "stats refreshed"
        );
        report
    }
}

async fn read_pool(
    chain: &dyn ChainReader,
) -> Result<(Decimal, Decimal), crate::onchain::ChainError> {
    let liquidity = chain.pool_liquidity().await?;
    let price = chain.current_price().await?;
    Ok((wei_to_ether(liquidity), wei_to_ether(price)))
}

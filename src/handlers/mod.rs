//! Per-event reactions: update stats, record an activity, maybe post.

use crate::messages::{self, wei_to_ether, AnnouncementTag};
use crate::notifier::Notifier;
use crate::onchain::{ChainEvent, ChainReader, GameEvent};
use crate::stats::{ActivityKind, GameStats};

use alloy::primitives::{Address, U256};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Post every Nth new player.
const PLAYER_MILESTONE: u64 = 10;
/// Post every Nth purchased hint.
const HINT_MILESTONE: usize = 5;

pub struct Dispatcher {
    chain: Arc<dyn ChainReader>,
}

impl Dispatcher {
    pub fn new(chain: Arc<dyn ChainReader>) -> Self {
        Self { chain }
    }

    pub async fn dispatch(&self, stats: &mut GameStats, notifier: &mut Notifier, entry: &ChainEvent) {
        debug!(block = entry.block_number, event = %entry.event, "dispatching");
        match &entry.event {
            GameEvent::JackpotWon { winner, amount, guess } => {
                self.on_jackpot_won(stats, notifier, *winner, *amount, guess).await
            }
            GameEvent::SocialAnnouncement { kind, message } => {
                self.on_announcement(stats, notifier, kind, message).await
            }
            GameEvent::NewPlayer { player } => self.on_new_player(stats, notifier, *player).await,
            GameEvent::HintRequested { player, hint_index } => {
                self.on_hint_requested(stats, notifier, *player, *hint_index)
                    .await
            }
            GameEvent::HintAdded { index } => self.on_hint_added(stats, notifier, *index).await,
        }
    }

    async fn on_jackpot_won(
        &self,
        stats: &mut GameStats,
        notifier: &mut Notifier,
        winner: Address,
        amount: U256,
        guess: &str,
    ) {
        let amount = wei_to_ether(amount);
        info!(winner = %winner, amount = %amount, guess = guess, "jackpot won");

        stats.last_winner = Some(winner);
        stats.last_win_time = Some(Utc::now());
        stats.total_winners = stats.total_winners.saturating_add(1);
        stats.add_activity(
            ActivityKind::JackpotWin,
            messages::jackpot_won_activity(&winner, amount, guess),
        );

        notifier
            .post(&messages::jackpot_won(&winner, amount, guess))
            .await;

        // jackpot resets after a win
        stats.refresh(self.chain.as_ref()).await;
    }

    async fn on_announcement(
        &self,
        stats: &mut GameStats,
        notifier: &mut Notifier,
        kind: &str,
        message: &str,
    ) {
        info!(kind = kind, message = message, "social announcement");
        stats.add_activity(ActivityKind::Announcement, format!("{}: {}", kind, message));

        let text = match AnnouncementTag::parse(kind) {
            Some(AnnouncementTag::NewSecret) => messages::new_secret(),
            Some(AnnouncementTag::NewHint) => messages::new_hint_announcement(message),
            Some(AnnouncementTag::JackpotFunded) => {
                messages::jackpot_funded(self.fresh_jackpot(stats).await)
            }
            Some(AnnouncementTag::JackpotWon) => messages::jackpot_won_announcement(message),
            None => messages::generic_announcement(kind, message),
        };
        notifier.post(&text).await;
    }

    async fn on_new_player(&self, stats: &mut GameStats, notifier: &mut Notifier, player: Address) {
        stats.unique_players = stats.unique_players.saturating_add(1);
        let count = stats.unique_players;
        info!(player = %player, players = count, "new player");
        stats.add_activity(
            ActivityKind::NewPlayer,
            format!("New player joined: {}", messages::truncate_address(&player)),
        );

        if count > 0 && count % PLAYER_MILESTONE == 0 {
            let jackpot = self.fresh_jackpot(stats).await;
            notifier
                .post(&messages::player_milestone(count, jackpot))
                .await;
        }
    }

    async fn on_hint_requested(
        &self,
        stats: &mut GameStats,
        notifier: &mut Notifier,
        player: Address,
        hint_index: u64,
    ) {
        stats.hints_purchased.push(hint_index);
        stats.last_hint_time = Some(Utc::now());
        let purchased = stats.hints_purchased.len();
        info!(player = %player, hint = hint_index, purchased = purchased, "hint purchased");
        stats.add_activity(
            ActivityKind::HintPurchased,
            format!(
                "Player {} purchased hint #{}",
                messages::truncate_address(&player),
                hint_index
            ),
        );

        if purchased % HINT_MILESTONE == 0 {
            let jackpot = self.fresh_jackpot(stats).await;
            notifier
                .post(&messages::hints_milestone(purchased, jackpot))
                .await;
        }
    }

    async fn on_hint_added(&self, stats: &mut GameStats, notifier: &mut Notifier, index: u64) {
        stats.hint_count = stats.hint_count.saturating_add(1);
        info!(index = index, hints = stats.hint_count, "hint added");
        stats.add_activity(
            ActivityKind::HintAdded,
            format!("New hint #{} added to the game", index),
        );

        let jackpot = self.fresh_jackpot(stats).await;
        notifier.post(&messages::hint_added(jackpot)).await;
    }

    /// Current jackpot from chain, falling back to the cached amount.
    async fn fresh_jackpot(&self, stats: &mut GameStats) -> Decimal {
        match self.chain.jackpot_amount().await {
            Ok(wei) => {
                stats.jackpot_amount = wei_to_ether(wei);
                stats.jackpot_amount
            }
            Err(e) => {
                warn!(error = %e, cached = %stats.jackpot_amount, "jackpot read failed, using cached amount");
                stats.jackpot_amount
            }
        }
    }
}

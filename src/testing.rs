//! In-memory collaborators shared by the unit tests.

use crate::onchain::{ChainError, ChainEvent, ChainReader, ChainWriter, EventKind};
use crate::onchain::types::CoreStats;
use crate::social::{SocialError, SocialPoster};

use alloy::primitives::{TxHash, U256};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const ETHER: u128 = 1_000_000_000_000_000_000;

/// Scriptable chain. A `None` read result makes that call fail.
pub struct MockChain {
    pub head: Mutex<Option<u64>>,
    pub events: Mutex<Vec<ChainEvent>>,
    pub core: Mutex<Option<CoreStats>>,
    pub liquidity: Mutex<Option<U256>>,
    pub price: Mutex<Option<U256>>,
    pub hints: Mutex<Option<u64>>,
    pub jackpot: Mutex<Option<U256>>,
    pub core_reads: AtomicUsize,
    pub jackpot_reads: AtomicUsize,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            head: Mutex::new(Some(100)),
            events: Mutex::new(Vec::new()),
            core: Mutex::new(Some(CoreStats {
                total_guesses: 156,
                unique_players: 42,
                total_winners: 3,
                jackpot_wei: U256::from(5 * ETHER),
            })),
            liquidity: Mutex::new(Some(U256::from(1_000 * ETHER))),
            price: Mutex::new(Some(U256::from(125_000_000_000_000u128))),
            hints: Mutex::new(Some(4)),
            jackpot: Mutex::new(Some(U256::from(5 * ETHER))),
            core_reads: AtomicUsize::new(0),
            jackpot_reads: AtomicUsize::new(0),
        }
    }
}

impl MockChain {
    pub fn core_reads(&self) -> usize {
        self.core_reads.load(Ordering::SeqCst)
    }

    pub fn jackpot_reads(&self) -> usize {
        self.jackpot_reads.load(Ordering::SeqCst)
    }
}

fn unavailable() -> ChainError {
    ChainError::Transport("connection refused".into())
}

#[async_trait]
impl ChainReader for MockChain {
    async fn head_block(&self) -> Result<u64, ChainError> {
        self.head.lock().unwrap().ok_or_else(unavailable)
    }

    async fn fetch_events(
        &self,
        kind: EventKind,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<ChainEvent>, ChainError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| {
                e.event.kind() == kind && e.block_number >= from_block && e.block_number <= to_block
            })
            .cloned()
            .collect())
    }

    async fn game_stats(&self) -> Result<CoreStats, ChainError> {
        self.core_reads.fetch_add(1, Ordering::SeqCst);
        self.core.lock().unwrap().ok_or_else(unavailable)
    }

    async fn pool_liquidity(&self) -> Result<U256, ChainError> {
        self.liquidity.lock().unwrap().ok_or_else(unavailable)
    }

    async fn current_price(&self) -> Result<U256, ChainError> {
        self.price.lock().unwrap().ok_or_else(unavailable)
    }

    async fn hint_count(&self) -> Result<u64, ChainError> {
        self.hints.lock().unwrap().ok_or_else(unavailable)
    }

    async fn jackpot_amount(&self) -> Result<U256, ChainError> {
        self.jackpot_reads.fetch_add(1, Ordering::SeqCst);
        self.jackpot.lock().unwrap().ok_or_else(unavailable)
    }
}

/// Records every post; fails all of them when `fail` is set.
#[derive(Default)]
pub struct MockSocial {
    pub posts: Mutex<Vec<String>>,
    pub fail: bool,
}

impl MockSocial {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn posts(&self) -> Vec<String> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SocialPoster for MockSocial {
    async fn create_post(&self, text: &str) -> Result<String, SocialError> {
        self.posts.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(SocialError::RateLimited);
        }
        Ok(format!("post-{}", self.posts.lock().unwrap().len()))
    }
}

/// Records every announcement; fails all of them when `fail` is set.
#[derive(Default)]
pub struct MockWriter {
    pub messages: Mutex<Vec<String>>,
    pub fail: bool,
}

impl MockWriter {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainWriter for MockWriter {
    async fn announce(&self, message: &str) -> Result<TxHash, ChainError> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail {
            return Err(ChainError::ContractCall("execution reverted".into()));
        }
        Ok(TxHash::with_last_byte(1))
    }
}

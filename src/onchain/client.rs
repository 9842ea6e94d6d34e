//! Chain collaborators: the read/write traits and their alloy implementations.
//!
//! Everything outside this module talks to the chain through `ChainReader`
//! (logs + view calls) and `ChainWriter` (the optional `emitGameUpdate`
//! announcement). `ChainClient` and `Announcer` back them with an alloy HTTP
//! provider.

use crate::config::{ChainConfig, ConfigError};
use crate::onchain::abi::{self, IBondingCurve, IJackpotGame};
use crate::onchain::types::{ChainEvent, CoreStats, EventKind, GameEvent};

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::TransportError;
use async_trait::async_trait;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ChainError {
    /// RPC endpoint unreachable or returned a JSON-RPC error.
    #[error("transport error: {0}")]
    Transport(String),
    /// Call reverted or returned data that did not match the ABI.
    #[error("contract call failed: {0}")]
    ContractCall(String),
    #[error("failed to decode {kind} log: {reason}")]
    Decode { kind: EventKind, reason: String },
    #[error("value out of range: {0}")]
    Overflow(String),
}

impl From<TransportError> for ChainError {
    fn from(e: TransportError) -> Self {
        ChainError::Transport(e.to_string())
    }
}

impl From<alloy::contract::Error> for ChainError {
    fn from(e: alloy::contract::Error) -> Self {
        match e {
            alloy::contract::Error::TransportError(t) => ChainError::Transport(t.to_string()),
            other => ChainError::ContractCall(other.to_string()),
        }
    }
}

/// Read side of the chain: log polling and view calls.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Latest block number.
    async fn head_block(&self) -> Result<u64, ChainError>;

    /// All decodable `kind` logs in `[from_block, to_block]`, in chain order.
    async fn fetch_events(
        &self,
        kind: EventKind,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<ChainEvent>, ChainError>;

    async fn game_stats(&self) -> Result<CoreStats, ChainError>;

    /// Real (non-virtual) native-currency reserve of the bonding curve, in wei.
    async fn pool_liquidity(&self) -> Result<U256, ChainError>;

    /// Current token price in wei.
    async fn current_price(&self) -> Result<U256, ChainError>;

    async fn hint_count(&self) -> Result<u64, ChainError>;

    /// Current jackpot in wei.
    async fn jackpot_amount(&self) -> Result<U256, ChainError>;
}

/// Write side: the on-chain announcement call.
#[async_trait]
pub trait ChainWriter: Send + Sync {
    async fn announce(&self, message: &str) -> Result<TxHash, ChainError>;
}

/// Read-only client for the JackpotGame and BondingCurve contracts.
pub struct ChainClient {
    provider: DynProvider,
    jackpot: Address,
    bonding_curve: Address,
}

impl ChainClient {
    pub async fn connect(config: &ChainConfig) -> Result<Self, ConfigError> {
        let jackpot = parse_address("jackpot_address", &config.jackpot_address)?;
        let bonding_curve = parse_address("bonding_curve_address", &config.bonding_curve_address)?;

        let provider = ProviderBuilder::new()
            .connect(&config.rpc_url)
            .await
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.rpc_url, e)))?
            .erased();

        Ok(Self {
            provider,
            jackpot,
            bonding_curve,
        })
    }

    fn game(&self) -> IJackpotGame::IJackpotGameInstance<DynProvider> {
        IJackpotGame::new(self.jackpot, self.provider.clone())
    }

    fn curve(&self) -> IBondingCurve::IBondingCurveInstance<DynProvider> {
        IBondingCurve::new(self.bonding_curve, self.provider.clone())
    }
}

#[async_trait]
impl ChainReader for ChainClient {
    async fn head_block(&self) -> Result<u64, ChainError> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn fetch_events(
        &self,
        kind: EventKind,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<ChainEvent>, ChainError> {
        let filter = Filter::new()
            .address(self.jackpot)
            .event_signature(abi::topic_for(kind))
            .from_block(from_block)
            .to_block(to_block);

        let logs = self.provider.get_logs(&filter).await?;
        debug!(
            kind = %kind,
            from = from_block,
            to = to_block,
            logs = logs.len(),
            "fetched logs"
        );

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            match decode_log(kind, log) {
                Ok(event) => events.push(event),
                Err(e) => warn!(
                    error = %e,
                    block = ?log.block_number,
                    tx = ?log.transaction_hash,
                    "skipping undecodable log"
                ),
            }
        }
        Ok(events)
    }

    async fn game_stats(&self) -> Result<CoreStats, ChainError> {
        let stats = self.game().getGameStats().call().await?;
        Ok(CoreStats {
            total_guesses: to_u64(stats.totalGuesses)?,
            unique_players: to_u64(stats.uniquePlayers)?,
            total_winners: to_u64(stats.totalWinners)?,
            jackpot_wei: stats.currentJackpot,
        })
    }

    async fn pool_liquidity(&self) -> Result<U256, ChainError> {
        Ok(self.curve().getPoolInfo().call().await?.actualS)
    }

    async fn current_price(&self) -> Result<U256, ChainError> {
        Ok(self.curve().getCurrentPrice().call().await?)
    }

    async fn hint_count(&self) -> Result<u64, ChainError> {
        to_u64(self.game().hintCount().call().await?)
    }

    async fn jackpot_amount(&self) -> Result<U256, ChainError> {
        Ok(self.game().jackpotAmount().call().await?)
    }
}

/// Signs and submits `emitGameUpdate` from the agent account.
pub struct Announcer {
    provider: DynProvider,
    jackpot: Address,
    account: Address,
    gas_limit: u64,
}

impl Announcer {
    pub async fn connect(config: &ChainConfig) -> Result<Self, ConfigError> {
        let jackpot = parse_address("jackpot_address", &config.jackpot_address)?;
        let signer = PrivateKeySigner::from_str(config.private_key.trim())
            .map_err(|e| ConfigError::InvalidKey(e.to_string()))?;
        let account = signer.address();

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect(&config.rpc_url)
            .await
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.rpc_url, e)))?
            .erased();

        Ok(Self {
            provider,
            jackpot,
            account,
            gas_limit: config.gas_limit,
        })
    }

    pub fn account(&self) -> Address {
        self.account
    }
}

#[async_trait]
impl ChainWriter for Announcer {
    async fn announce(&self, message: &str) -> Result<TxHash, ChainError> {
        let nonce = self.provider.get_transaction_count(self.account).await?;
        let gas_price = self.provider.get_gas_price().await?;

        let game = IJackpotGame::new(self.jackpot, self.provider.clone());
        let pending = game
            .emitGameUpdate(message.to_string())
            .from(self.account)
            .nonce(nonce)
            .gas(self.gas_limit)
            .gas_price(gas_price)
            .send()
            .await?;

        Ok(*pending.tx_hash())
    }
}

/// Decode one log of a known kind into a `ChainEvent`.
pub fn decode_log(kind: EventKind, log: &Log) -> Result<ChainEvent, ChainError> {
    let decode_err = |e: alloy::sol_types::Error| ChainError::Decode {
        kind,
        reason: e.to_string(),
    };

    let event = match kind {
        EventKind::JackpotWon => {
            let e = log
                .log_decode::<IJackpotGame::JackpotWon>()
                .map_err(decode_err)?
                .inner
                .data;
            GameEvent::JackpotWon {
                winner: e.winner,
                amount: e.amount,
                guess: e.guess,
            }
        }
        EventKind::SocialAnnouncement => {
            let e = log
                .log_decode::<IJackpotGame::SocialAnnouncement>()
                .map_err(decode_err)?
                .inner
                .data;
            GameEvent::SocialAnnouncement {
                kind: e.announcementType,
                message: e.message,
            }
        }
        EventKind::NewPlayer => {
            let e = log
                .log_decode::<IJackpotGame::NewPlayer>()
                .map_err(decode_err)?
                .inner
                .data;
            GameEvent::NewPlayer { player: e.player }
        }
        EventKind::HintRequested => {
            let e = log
                .log_decode::<IJackpotGame::HintRequested>()
                .map_err(decode_err)?
                .inner
                .data;
            GameEvent::HintRequested {
                player: e.player,
                hint_index: to_u64(e.hintIndex)?,
            }
        }
        EventKind::HintAdded => {
            let e = log
                .log_decode::<IJackpotGame::HintAdded>()
                .map_err(decode_err)?
                .inner
                .data;
            GameEvent::HintAdded {
                index: to_u64(e.index)?,
            }
        }
    };

    Ok(ChainEvent {
        block_number: log.block_number.unwrap_or_default(),
        log_index: log.log_index.unwrap_or_default(),
        event,
    })
}

fn to_u64(value: U256) -> Result<u64, ChainError> {
    value
        .try_into()
        .map_err(|_| ChainError::Overflow(format!("{} does not fit in u64", value)))
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, ConfigError> {
    Address::from_str(value.trim()).map_err(|_| ConfigError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

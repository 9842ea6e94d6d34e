//! Fan-out of one message to the social feed and the on-chain announcement.
//!
//! Both sides are optional and independent: a failure on one never stops the
//! other, and nothing is retried.

use crate::onchain::ChainWriter;
use crate::social::SocialPoster;

use alloy::primitives::TxHash;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};

/// `emitGameUpdate` receives at most this many characters.
pub const ONCHAIN_MESSAGE_CHARS: usize = 100;

/// What each side of a post produced. `None` means disabled or failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostOutcome {
    pub post_id: Option<String>,
    pub tx_hash: Option<TxHash>,
}

pub struct Notifier {
    social: Option<Arc<dyn SocialPoster>>,
    announcer: Option<Arc<dyn ChainWriter>>,
    last_post: Option<DateTime<Utc>>,
}

impl Notifier {
    pub fn new(
        social: Option<Arc<dyn SocialPoster>>,
        announcer: Option<Arc<dyn ChainWriter>>,
    ) -> Self {
        Self {
            social,
            announcer,
            last_post: None,
        }
    }

    /// Time of the last `post` call, successful or not.
    pub fn last_post(&self) -> Option<DateTime<Utc>> {
        self.last_post
    }

    pub async fn post(&mut self, text: &str) -> PostOutcome {
        let mut outcome = PostOutcome::default();

        if let Some(social) = &self.social {
            match social.create_post(text).await {
                Ok(id) => {
                    info!(post_id = %id, "posted to social feed");
                    outcome.post_id = Some(id);
                }
                Err(e) => error!(error = %e, "social post failed"),
            }
        }

        match &self.announcer {
            Some(announcer) => {
                let short = truncate_chars(text, ONCHAIN_MESSAGE_CHARS);
                match announcer.announce(short).await {
                    Ok(hash) => {
                        info!(tx = %hash, "on-chain announcement sent");
                        outcome.tx_hash = Some(hash);
                    }
                    Err(e) => error!(error = %e, "on-chain announcement failed"),
                }
            }
            None => debug!("no signing account configured, skipping on-chain announcement"),
        }

        self.last_post = Some(Utc::now());
        outcome
    }
}

/// First `max` characters of `s`, never splitting a character.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

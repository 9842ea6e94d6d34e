//! Cursor-based event polling.
//!
//! Each watched event kind has its own `EventFilter` holding the next block
//! to scan. A poll fetches the head once, then walks the filters in
//! registration order, fetching `[cursor, head]` and advancing the cursor
//! past what was returned. A filter whose fetch fails keeps its cursor, so
//! the same range is retried on the next tick.
//!
//! Ordering is per filter only: all JackpotWon entries of a tick come before
//! all SocialAnnouncement entries, regardless of block numbers.

use crate::onchain::client::ChainReader;
use crate::onchain::types::{ChainEvent, EventKind};

use std::sync::Arc;
use tracing::{debug, warn};

/// Cursor for one event kind. The cursor never moves backwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    kind: EventKind,
    next_block: u64,
}

impl EventFilter {
    pub fn new(kind: EventKind, next_block: u64) -> Self {
        Self { kind, next_block }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// First block not yet scanned.
    pub fn next_block(&self) -> u64 {
        self.next_block
    }

    /// Block range to scan against `head`, capped at `max_range` blocks.
    /// `None` when the filter is already caught up.
    fn range(&self, head: u64, max_range: u64) -> Option<(u64, u64)> {
        if head < self.next_block {
            return None;
        }
        let span = max_range.max(1);
        let to = head.min(self.next_block.saturating_add(span - 1));
        Some((self.next_block, to))
    }

    fn advance_past(&mut self, block: u64) {
        let next = block.saturating_add(1);
        if next > self.next_block {
            self.next_block = next;
        }
    }
}

/// Polls the five game event filters.
pub struct Poller {
    chain: Arc<dyn ChainReader>,
    filters: Vec<EventFilter>,
    max_block_range: u64,
}

impl Poller {
    /// One filter per kind, all starting at `start_block`.
    pub fn new(chain: Arc<dyn ChainReader>, start_block: u64, max_block_range: u64) -> Self {
        let filters = EventKind::ALL
            .iter()
            .map(|kind| EventFilter::new(*kind, start_block))
            .collect();
        Self {
            chain,
            filters,
            max_block_range,
        }
    }

    /// Start every filter just past the current head, so only events mined
    /// after startup are delivered.
    pub async fn from_head(
        chain: Arc<dyn ChainReader>,
        max_block_range: u64,
    ) -> Result<Self, crate::onchain::ChainError> {
        let head = chain.head_block().await?;
        debug!(head = head, "event filters start after head");
        Ok(Self::new(chain, head.saturating_add(1), max_block_range))
    }

    pub fn filters(&self) -> &[EventFilter] {
        &self.filters
    }

    /// New entries since the previous poll, in filter-registration order.
    pub async fn poll(&mut self) -> Vec<ChainEvent> {
        let head = match self.chain.head_block().await {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, "failed to fetch head block, skipping poll");
                return Vec::new();
            }
        };

        let mut out = Vec::new();
        for filter in &mut self.filters {
            let Some((from, to)) = filter.range(head, self.max_block_range) else {
                continue;
            };

            match self.chain.fetch_events(filter.kind, from, to).await {
                Ok(mut events) => {
                    events.sort_by_key(|e| (e.block_number, e.log_index));
                    if !events.is_empty() {
                        debug!(
                            kind = %filter.kind,
                            from = from,
                            to = to,
                            count = events.len(),
                            "new events"
                        );
                    }
                    filter.advance_past(to);
                    out.extend(events);
                }
                Err(e) => {
                    warn!(
                        kind = %filter.kind,
                        from = from,
                        to = to,
                        error = %e,
                        "event filter poll failed, will retry next tick"
                    );
                }
            }
        }
        out
    }
}

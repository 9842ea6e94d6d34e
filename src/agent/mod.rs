//! The herald's main loop.
//!
//! `Starting → Running → Stopped`. Starting registers the event filters at
//! the current head, refreshes stats and posts the startup message. Each
//! Running iteration polls and dispatches new events, then runs the stats
//! refresh and summary timers, then sleeps. Shutdown is observed between
//! iterations and cuts the sleep short.

use crate::config::{AgentConfig, ChainConfig, ConfigError};
use crate::handlers::Dispatcher;
use crate::messages::{self, SummaryView};
use crate::notifier::Notifier;
use crate::onchain::{ChainError, ChainReader, Poller};
use crate::stats::GameStats;

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// Activities logged alongside each summary.
const SUMMARY_ACTIVITIES: usize = 10;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Starting,
    Running,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub poll_interval: Duration,
    pub stats_refresh_interval: Duration,
    pub summary_interval: Duration,
    pub max_block_range: u64,
}

impl AgentSettings {
    pub fn from_config(agent: &AgentConfig, chain: &ChainConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(agent.poll_interval_secs),
            stats_refresh_interval: Duration::from_secs(agent.stats_refresh_secs),
            summary_interval: Duration::from_secs(agent.summary_interval_secs),
            max_block_range: chain.max_block_range,
        }
    }
}

pub struct Agent {
    settings: AgentSettings,
    chain: Arc<dyn ChainReader>,
    dispatcher: Dispatcher,
    notifier: Notifier,
    stats: GameStats,
    poller: Option<Poller>,
    state: AgentState,
    last_stats_refresh: Instant,
}

impl Agent {
    pub fn new(settings: AgentSettings, chain: Arc<dyn ChainReader>, notifier: Notifier) -> Self {
        let now = Instant::now();
        Self {
            settings,
            dispatcher: Dispatcher::new(chain.clone()),
            chain,
            notifier,
            stats: GameStats::default(),
            poller: None,
            state: AgentState::Starting,
            last_stats_refresh: now,
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    /// Register filters, refresh stats and post the startup message.
    pub async fn start(&mut self) -> Result<(), AgentError> {
        let poller = match Poller::from_head(self.chain.clone(), self.settings.max_block_range).await
        {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "failed to register event filters");
                self.state = AgentState::Stopped;
                return Err(e.into());
            }
        };
        self.poller = Some(poller);

        self.stats.refresh(self.chain.as_ref()).await;
        self.notifier
            .post(&messages::startup(self.stats.jackpot_amount))
            .await;

        self.last_stats_refresh = Instant::now();
        self.state = AgentState::Running;
        info!(
            poll_secs = self.settings.poll_interval.as_secs(),
            refresh_secs = self.settings.stats_refresh_interval.as_secs(),
            summary_secs = self.settings.summary_interval.as_secs(),
            "agent running"
        );
        Ok(())
    }

    /// One iteration: poll and dispatch, then the periodic timers.
    pub async fn tick(&mut self) {
        let Some(poller) = self.poller.as_mut() else {
            return;
        };

        let events = poller.poll().await;
        if !events.is_empty() {
            debug!(count = events.len(), "dispatching new events");
        }
        for entry in &events {
            self.dispatcher
                .dispatch(&mut self.stats, &mut self.notifier, entry)
                .await;
        }

        if self.last_stats_refresh.elapsed() >= self.settings.stats_refresh_interval {
            self.stats.refresh(self.chain.as_ref()).await;
            self.last_stats_refresh = Instant::now();
        }

        if self.summary_due() && !self.stats.activities.is_empty() {
            self.post_summary().await;
        }
    }

    /// A summary goes out only after `summary_interval` without any post.
    fn summary_due(&self) -> bool {
        let Some(last_post) = self.notifier.last_post() else {
            return true;
        };
        let quiet = (Utc::now() - last_post).to_std().unwrap_or_default();
        quiet >= self.settings.summary_interval
    }

    async fn post_summary(&mut self) {
        let text = {
            let recent = self.stats.activities.most_recent(SUMMARY_ACTIVITIES);
            for activity in &recent {
                info!(
                    kind = activity.kind().as_str(),
                    at = %activity.timestamp(),
                    message = activity.message(),
                    "recent activity"
                );
            }

            let view = SummaryView {
                jackpot: self.stats.jackpot_amount,
                unique_players: self.stats.unique_players,
                total_guesses: self.stats.total_guesses,
                token_price: self.stats.token_price,
                last_win: self.stats.last_win_time,
            };
            messages::summary(&view, Utc::now())
        };

        info!("posting periodic summary");
        self.notifier.post(&text).await;
    }

    /// Start, then loop until `shutdown` flips to `true` or its sender drops.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), AgentError> {
        self.start().await?;

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.tick().await;

            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        self.state = AgentState::Stopped;
        info!("agent stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onchain::{ChainEvent, GameEvent};
    use crate::stats::ActivityKind;
    use crate::testing::{MockChain, MockSocial};
    use alloy::primitives::Address;

    fn settings(refresh: Duration, summary: Duration) -> AgentSettings {
        AgentSettings {
            poll_interval: Duration::from_secs(3_600),
            stats_refresh_interval: refresh,
            summary_interval: summary,
            max_block_range: 2_000,
        }
    }

    fn agent(chain: &Arc<MockChain>, social: &Arc<MockSocial>, settings: AgentSettings) -> Agent {
        Agent::new(
            settings,
            chain.clone(),
            Notifier::new(Some(social.clone()), None),
        )
    }

    fn new_player(block: u64) -> ChainEvent {
        ChainEvent {
            block_number: block,
            log_index: 0,
            event: GameEvent::NewPlayer {
                player: Address::with_last_byte(block as u8),
            },
        }
    }

    const NEVER: Duration = Duration::from_secs(86_400);

    #[test]
    fn test_settings_from_config() {
        let s = AgentSettings::from_config(&AgentConfig::default(), &ChainConfig::default());
        assert_eq!(s.poll_interval, Duration::from_secs(15));
        assert_eq!(s.stats_refresh_interval, Duration::from_secs(300));
        assert_eq!(s.summary_interval, Duration::from_secs(14_400));
        assert_eq!(s.max_block_range, 2_000);
    }

    #[tokio::test]
    async fn test_start_refreshes_then_posts() {
        let chain = Arc::new(MockChain::default());
        let social = Arc::new(MockSocial::default());
        let mut agent = agent(&chain, &social, settings(NEVER, NEVER));
        assert_eq!(agent.state(), AgentState::Starting);

        agent.start().await.unwrap();

        assert_eq!(agent.state(), AgentState::Running);
        assert_eq!(chain.core_reads(), 1);
        let posts = social.posts();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].starts_with("🚀"));
        assert!(posts[0].contains("Current jackpot: 5.00 S"));
    }

    #[tokio::test]
    async fn test_start_failure_stops() {
        let chain = Arc::new(MockChain::default());
        *chain.head.lock().unwrap() = None;
        let social = Arc::new(MockSocial::default());
        let mut agent = agent(&chain, &social, settings(NEVER, NEVER));

        let (_tx, rx) = watch::channel(false);
        let result = agent.run(rx).await;

        assert!(matches!(result, Err(AgentError::Chain(_))));
        assert_eq!(agent.state(), AgentState::Stopped);
        assert!(social.posts().is_empty());
    }

    #[tokio::test]
    async fn test_tick_dispatches_events_after_startup() {
        let chain = Arc::new(MockChain::default());
        let social = Arc::new(MockSocial::default());
        let mut agent = agent(&chain, &social, settings(NEVER, NEVER));
        // mined before startup, never delivered
        chain.events.lock().unwrap().push(new_player(100));

        agent.start().await.unwrap();
        chain.events.lock().unwrap().push(new_player(101));
        *chain.head.lock().unwrap() = Some(101);
        agent.tick().await;

        let activities: Vec<ActivityKind> =
            agent.stats().activities.iter().map(|a| a.kind()).collect();
        assert_eq!(activities, vec![ActivityKind::NewPlayer]);
        assert_eq!(agent.stats().unique_players, 43);

        agent.tick().await;
        assert_eq!(agent.stats().activities.len(), 1);
    }

    #[tokio::test]
    async fn test_periodic_refresh_timer() {
        let chain = Arc::new(MockChain::default());
        let social = Arc::new(MockSocial::default());

        let mut due = agent(&chain, &social, settings(Duration::ZERO, NEVER));
        due.start().await.unwrap();
        due.tick().await;
        due.tick().await;
        assert_eq!(chain.core_reads(), 3);

        let idle_chain = Arc::new(MockChain::default());
        let mut idle = agent(&idle_chain, &social, settings(NEVER, NEVER));
        idle.start().await.unwrap();
        idle.tick().await;
        assert_eq!(idle_chain.core_reads(), 1);
    }

    #[tokio::test]
    async fn test_summary_requires_activity() {
        let chain = Arc::new(MockChain::default());
        let social = Arc::new(MockSocial::default());
        let mut agent = agent(&chain, &social, settings(NEVER, Duration::ZERO));

        agent.start().await.unwrap();
        agent.tick().await;
        assert_eq!(social.posts().len(), 1, "no summary without activity");

        chain.events.lock().unwrap().push(new_player(101));
        *chain.head.lock().unwrap() = Some(101);
        agent.tick().await;

        let posts = social.posts();
        assert_eq!(posts.len(), 2);
        assert!(posts[1].starts_with("📊 100x Jackpot Game Update 📊"));
        assert!(posts[1].contains("Total Players: 43"));
        assert!(posts[1].contains("Last Win: Never"));
    }

    #[tokio::test]
    async fn test_event_post_postpones_summary() {
        let chain = Arc::new(MockChain::default());
        let social = Arc::new(MockSocial::default());
        let mut agent = agent(&chain, &social, settings(NEVER, Duration::from_millis(100)));

        agent.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        chain.events.lock().unwrap().push(ChainEvent {
            block_number: 101,
            log_index: 0,
            event: GameEvent::HintAdded { index: 1 },
        });
        *chain.head.lock().unwrap() = Some(101);
        agent.tick().await;

        let posts = social.posts();
        assert_eq!(posts.len(), 2);
        assert!(posts[0].starts_with("🚀"));
        assert!(posts[1].starts_with("🔍 New hint added"));
    }

    #[tokio::test]
    async fn test_summary_resets_quiet_period() {
        let chain = Arc::new(MockChain::default());
        let social = Arc::new(MockSocial::default());
        let mut agent = agent(&chain, &social, settings(NEVER, Duration::from_millis(100)));

        agent.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        // 43rd player: recorded but no milestone post
        chain.events.lock().unwrap().push(new_player(101));
        *chain.head.lock().unwrap() = Some(101);
        agent.tick().await;
        assert_eq!(social.posts().len(), 2);
        assert!(social.posts()[1].starts_with("📊"));

        agent.tick().await;
        assert_eq!(social.posts().len(), 2, "summary repeated without a quiet period");
    }

    #[tokio::test]
    async fn test_shutdown_cuts_sleep_short() {
        let chain = Arc::new(MockChain::default());
        let social = Arc::new(MockSocial::default());
        let mut agent = agent(&chain, &social, settings(NEVER, NEVER));
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let result = agent.run(rx).await;
            (result, agent.state())
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        let (result, state) = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("agent did not stop")
            .unwrap();
        assert!(result.is_ok());
        assert_eq!(state, AgentState::Stopped);
        assert_eq!(social.posts().len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_before_first_tick() {
        let chain = Arc::new(MockChain::default());
        let social = Arc::new(MockSocial::default());
        let mut agent = agent(&chain, &social, settings(NEVER, NEVER));
        let (_tx, rx) = watch::channel(true);

        agent.run(rx).await.unwrap();
        assert_eq!(agent.state(), AgentState::Stopped);
    }
}

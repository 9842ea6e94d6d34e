use jackpot_herald::agent::{Agent, AgentError, AgentSettings};
use jackpot_herald::config::Config;
use jackpot_herald::notifier::Notifier;
use jackpot_herald::onchain::{Announcer, ChainClient, ChainReader, ChainWriter};
use jackpot_herald::social::{SocialPoster, TwitterClient};

use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

const CONFIG_FILE: &str = "herald.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = if Path::new(CONFIG_FILE).exists() {
        Config::load(Path::new(CONFIG_FILE))?
    } else {
        Config::from_env()
    };

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .init();
    }

    info!("jackpot-herald v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        rpc = %config.chain.rpc_url,
        jackpot = %config.chain.jackpot_address,
        token = %config.chain.token_address,
        bonding_curve = %config.chain.bonding_curve_address,
        "chain config"
    );

    // --- Chain ---
    let chain: Arc<dyn ChainReader> = Arc::new(
        ChainClient::connect(&config.chain)
            .await
            .map_err(AgentError::Config)?,
    );

    let announcer: Option<Arc<dyn ChainWriter>> = if config.has_signing_key() {
        let announcer = Announcer::connect(&config.chain)
            .await
            .map_err(AgentError::Config)?;
        info!(account = %announcer.account(), "on-chain announcements enabled");
        Some(Arc::new(announcer))
    } else {
        warn!("no AGENT_PRIVATE_KEY configured - on-chain announcements disabled");
        None
    };

    // --- Social ---
    let social: Option<Arc<dyn SocialPoster>> = match TwitterClient::from_config(&config.twitter) {
        Some(client) => {
            info!(api = %config.twitter.api_url, "social posting enabled");
            Some(Arc::new(client))
        }
        None => {
            warn!(
                "social credentials incomplete - posting disabled \
                 (set TWITTER_API_KEY, TWITTER_API_SECRET, TWITTER_ACCESS_TOKEN, TWITTER_ACCESS_SECRET)"
            );
            None
        }
    };

    // --- Shutdown ---
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            // hold the sender so the agent keeps running
            shutdown_tx.closed().await;
            return;
        }
        info!("shutting down...");
        let _ = shutdown_tx.send(true);
    });

    let settings = AgentSettings::from_config(&config.agent, &config.chain);
    let mut agent = Agent::new(settings, chain, Notifier::new(social, announcer));

    if let Err(e) = agent.run(shutdown_rx).await {
        error!(error = ?e, "agent stopped with error");
        return Err(e.into());
    }

    info!("jackpot-herald stopped");
    Ok(())
}

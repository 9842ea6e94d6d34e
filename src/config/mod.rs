use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid contract address for {field}: {value}")]
    InvalidAddress { field: &'static str, value: String },
    #[error("invalid RPC url: {0}")]
    InvalidUrl(String),
    #[error("invalid agent private key: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub twitter: TwitterConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    /// JSON-RPC endpoint (HTTP).
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// JackpotGame contract - the event source and announce target.
    #[serde(default = "default_jackpot_address")]
    pub jackpot_address: String,
    /// 100X token contract.
    #[serde(default = "default_token_address")]
    pub token_address: String,
    /// Bonding curve contract (price + liquidity).
    #[serde(default = "default_bonding_curve_address")]
    pub bonding_curve_address: String,
    /// Signing key for on-chain announcements - loaded from env AGENT_PRIVATE_KEY
    #[serde(default)]
    pub private_key: String,
    /// Gas limit for the emitGameUpdate transaction.
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    /// Max blocks one event filter scans per poll.
    #[serde(default = "default_max_block_range")]
    pub max_block_range: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwitterConfig {
    /// API base URL (v2 endpoints are appended)
    #[serde(default = "default_twitter_api_url")]
    pub api_url: String,
    /// Consumer key - loaded from env TWITTER_API_KEY
    #[serde(default)]
    pub api_key: String,
    /// Consumer secret - loaded from env TWITTER_API_SECRET
    #[serde(default)]
    pub api_secret: String,
    /// User access token - loaded from env TWITTER_ACCESS_TOKEN
    #[serde(default)]
    pub access_token: String,
    /// User access secret - loaded from env TWITTER_ACCESS_SECRET
    #[serde(default)]
    pub access_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Sleep between poll iterations.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Full stats refresh cadence.
    #[serde(default = "default_stats_refresh")]
    pub stats_refresh_secs: u64,
    /// Periodic summary post cadence.
    #[serde(default = "default_summary_interval")]
    pub summary_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_rpc_url() -> String {
    "https://rpc.sonic.fantom.network".to_string()
}
fn default_jackpot_address() -> String {
    "0x1bCb1B4474b636874E1C35B0CC32ADb408bb43e0".to_string()
}
fn default_token_address() -> String {
    "0x0755fb9917419a08c90a0Fd245F119202844ec3D".to_string()
}
fn default_bonding_curve_address() -> String {
    "0x2ECA93adD34C533008b947B2Ed02e4974122D525".to_string()
}
fn default_gas_limit() -> u64 {
    200_000
}
fn default_max_block_range() -> u64 {
    2_000
}
fn default_twitter_api_url() -> String {
    "https://api.twitter.com".to_string()
}
fn default_poll_interval() -> u64 {
    15
}
fn default_stats_refresh() -> u64 {
    300
}
fn default_summary_interval() -> u64 {
    14_400
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            jackpot_address: default_jackpot_address(),
            token_address: default_token_address(),
            bonding_curve_address: default_bonding_curve_address(),
            private_key: String::new(),
            gas_limit: default_gas_limit(),
            max_block_range: default_max_block_range(),
        }
    }
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            api_url: default_twitter_api_url(),
            api_key: String::new(),
            api_secret: String::new(),
            access_token: String::new(),
            access_secret: String::new(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            stats_refresh_secs: default_stats_refresh(),
            summary_interval_secs: default_summary_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl TwitterConfig {
    /// All four OAuth credentials present.
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty()
            && !self.api_secret.is_empty()
            && !self.access_token.is_empty()
            && !self.access_secret.is_empty()
    }
}

impl Config {
    /// Load config from a TOML file, then overlay environment variables for secrets.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.overlay_env();
        Ok(config)
    }

    /// Load a default config with env-only settings (no file needed).
    pub fn from_env() -> Self {
        let mut config = Config {
            chain: ChainConfig::default(),
            twitter: TwitterConfig::default(),
            agent: AgentConfig::default(),
            logging: LoggingConfig::default(),
        };
        config.overlay_env();
        config
    }

    /// Endpoints, addresses and secrets may always come from the environment
    /// (secrets never need to live in the config file).
    fn overlay_env(&mut self) {
        overlay(&mut self.chain.rpc_url, "RPC_URL");
        overlay(&mut self.chain.jackpot_address, "JACKPOT_ADDRESS");
        overlay(&mut self.chain.token_address, "TOKEN_ADDRESS");
        overlay(&mut self.chain.bonding_curve_address, "BONDING_CURVE_ADDRESS");
        overlay(&mut self.chain.private_key, "AGENT_PRIVATE_KEY");
        overlay(&mut self.twitter.api_url, "TWITTER_API_URL");
        overlay(&mut self.twitter.api_key, "TWITTER_API_KEY");
        overlay(&mut self.twitter.api_secret, "TWITTER_API_SECRET");
        overlay(&mut self.twitter.access_token, "TWITTER_ACCESS_TOKEN");
        overlay(&mut self.twitter.access_secret, "TWITTER_ACCESS_SECRET");
    }

    pub fn has_signing_key(&self) -> bool {
        !self.chain.private_key.is_empty()
    }
}

fn overlay(field: &mut String, var: &str) {
    if let Ok(value) = std::env::var(var) {
        if !value.is_empty() {
            *field = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[agent]
poll_interval_secs = 5

[logging]
json = true
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.agent.poll_interval_secs, 5);
        assert_eq!(config.agent.stats_refresh_secs, 300);
        assert_eq!(config.agent.summary_interval_secs, 14_400);
        assert_eq!(config.chain.gas_limit, 200_000);
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agent\npoll_interval_secs = ").unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_credential_checks() {
        let mut config = Config {
            chain: ChainConfig::default(),
            twitter: TwitterConfig::default(),
            agent: AgentConfig::default(),
            logging: LoggingConfig::default(),
        };
        assert!(!config.has_signing_key());
        assert!(!config.twitter.has_credentials());

        config.twitter.api_key = "k".into();
        config.twitter.api_secret = "s".into();
        config.twitter.access_token = "t".into();
        assert!(!config.twitter.has_credentials());

        config.twitter.access_secret = "ts".into();
        assert!(config.twitter.has_credentials());

        config.chain.private_key = "0x01".into();
        assert!(config.has_signing_key());
    }

    #[test]
    fn test_overlay_ignores_empty_values() {
        let mut field = "original".to_string();
        overlay(&mut field, "HERALD_TEST_VAR_THAT_IS_NEVER_SET");
        assert_eq!(field, "original");
    }
}

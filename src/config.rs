use std::{str::FromStr, time::Duration};

use config::ConfigError;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;

/// RPC endpoints tried in order when `SOLANA_RPC_ENDPOINTS` is not set
pub const DEFAULT_RPC_ENDPOINTS: [&str; 4] = [
    "https://api.mainnet-beta.solana.com",
    "https://solana-api.projectserum.com",
    "https://rpc.ankr.com/solana",
    "https://ssc-dao.genesysgo.net",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_endpoints: Vec<String>,
    pub webhook_url: String,
    pub wallet_address: String,
    pub poll_interval: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub notify_on_balance_change: bool,
    pub rpc_timeout: Duration,
    pub webhook_timeout: Duration,
    pub commitment: CommitmentConfig,
    pub explorer_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let rpc_endpoints = match get("SOLANA_RPC_ENDPOINTS") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_RPC_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
        };

        let webhook_url = get("DISCORD_WEBHOOK_URL")
            .ok_or_else(|| ConfigError::NotFound("DISCORD_WEBHOOK_URL".into()))?;

        let wallet_address = get("WALLET_ADDRESS")
            .ok_or_else(|| ConfigError::NotFound("WALLET_ADDRESS".into()))?;
        Pubkey::from_str(&wallet_address).map_err(|e| {
            ConfigError::Message(format!("WALLET_ADDRESS is not a valid pubkey: {}", e))
        })?;

        let config = Self {
            rpc_endpoints,
            webhook_url,
            wallet_address,
            poll_interval: Duration::from_secs(parse_or(&get, "POLL_INTERVAL_SECS", 60)?),
            retry_attempts: parse_or(&get, "RETRY_ATTEMPTS", 3)?,
            retry_delay: Duration::from_millis(parse_or(&get, "RETRY_DELAY_MS", 2000)?),
            notify_on_balance_change: parse_or(&get, "NOTIFY_ON_BALANCE_CHANGE", false)?,
            rpc_timeout: Duration::from_secs(parse_or(&get, "RPC_TIMEOUT_SECS", 30)?),
            webhook_timeout: Duration::from_secs(parse_or(&get, "WEBHOOK_TIMEOUT_SECS", 10)?),
            commitment: parse_commitment(get("SOLANA_COMMITMENT").as_deref())?,
            explorer_base_url: get("EXPLORER_BASE_URL")
                .unwrap_or_else(|| "https://solscan.io".to_string())
                .trim_end_matches('/')
                .to_string(),
        };

        if config.rpc_endpoints.is_empty() {
            return Err(ConfigError::Message(
                "SOLANA_RPC_ENDPOINTS must list at least one endpoint".into(),
            ));
        }
        if config.poll_interval.is_zero() {
            return Err(ConfigError::Message("POLL_INTERVAL_SECS must be positive".into()));
        }
        if config.retry_attempts == 0 {
            return Err(ConfigError::Message("RETRY_ATTEMPTS must be at least 1".into()));
        }

        Ok(config)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::Message(format!("{} has invalid value {:?}: {}", key, raw, e))),
        None => Ok(default),
    }
}

fn parse_commitment(raw: Option<&str>) -> Result<CommitmentConfig, ConfigError> {
    match raw.map(|s| s.to_ascii_lowercase()).as_deref() {
        None | Some("confirmed") => Ok(CommitmentConfig::confirmed()),
        Some("processed") => Ok(CommitmentConfig::processed()),
        Some("finalized") => Ok(CommitmentConfig::finalized()),
        Some(other) => Err(ConfigError::Message(format!(
            "SOLANA_COMMITMENT must be processed, confirmed or finalized, got {:?}",
            other
        ))),
    }
}

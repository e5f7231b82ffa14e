use crate::auth::session::DEFAULT_SESSION_TTL_SECS;
use crate::auth::verify::{signing_key_from_hex, DEFAULT_CHALLENGE_MESSAGE};
use crate::models::Address;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Minimum length of the session signing secret.
const MIN_SESSION_SECRET_BYTES: usize = 32;

#[derive(Clone)]
pub struct Config {
    // Sessions
    pub session_secret: String,
    pub session_ttl_secs: u64,
    pub challenge_message: String,

    // Server
    pub bind_addr: SocketAddr,
    pub max_body_bytes: usize,
    pub cors_allowed_origins: Vec<String>,

    // Storage (None = in-memory)
    pub redis_url: Option<String>,

    // Ledger
    pub ledger_rpc_url: String,
    pub membership_nft_address: Address,
    pub proof_of_location_address: Address,
    /// Hex private key that signs location verification transactions.
    pub backend_wallet_key: String,
    pub ledger_timeout_ms: u64,

    // Feed
    pub feed_default_limit: u32,
    pub feed_max_limit: u32,
    pub max_post_chars: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("session_secret", &"[REDACTED]")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("challenge_message", &self.challenge_message)
            .field("bind_addr", &self.bind_addr)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("redis_url", &self.redis_url.as_ref().map(|_| "[REDACTED]"))
            .field("ledger_rpc_url", &"[REDACTED]")
            .field("membership_nft_address", &self.membership_nft_address)
            .field("proof_of_location_address", &self.proof_of_location_address)
            .field("backend_wallet_key", &"[REDACTED]")
            .field("ledger_timeout_ms", &self.ledger_timeout_ms)
            .field("feed_default_limit", &self.feed_default_limit)
            .field("feed_max_limit", &self.feed_max_limit)
            .field("max_post_chars", &self.max_post_chars)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        // (env vars may be set directly in production)
        let _ = dotenvy::dotenv();

        // Sessions
        let session_secret = required_var("SESSION_SECRET")?;
        if session_secret.len() < MIN_SESSION_SECRET_BYTES {
            return Err(ConfigError::InvalidValue(
                "SESSION_SECRET".to_string(),
                format!("must be at least {} bytes", MIN_SESSION_SECRET_BYTES),
            ));
        }
        let session_ttl_secs = parse_env_or_default("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        if session_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let challenge_message = env::var("CHALLENGE_MESSAGE")
            .unwrap_or_else(|_| DEFAULT_CHALLENGE_MESSAGE.to_string());
        if challenge_message.is_empty() {
            return Err(ConfigError::InvalidValue(
                "CHALLENGE_MESSAGE".to_string(),
                "cannot be empty".to_string(),
            ));
        }

        // Server
        let bind_addr_str = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;
        let max_body_bytes = parse_env_or_default("MAX_BODY_BYTES", 16_384)?;
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Storage
        let redis_url = env::var("REDIS_URL").ok().filter(|s| !s.is_empty());

        // Ledger
        let ledger_rpc_url = required_var("LEDGER_RPC_URL")?;
        let membership_nft_address = address_var("MEMBERSHIP_NFT_ADDRESS")?;
        let proof_of_location_address = address_var("PROOF_OF_LOCATION_ADDRESS")?;
        let backend_wallet_key = required_var("BACKEND_WALLET_PRIVATE_KEY")?;
        signing_key_from_hex(&backend_wallet_key).map_err(|e| {
            ConfigError::InvalidValue("BACKEND_WALLET_PRIVATE_KEY".to_string(), e.to_string())
        })?;
        let ledger_timeout_ms = parse_env_or_default("LEDGER_TIMEOUT_MS", 5_000)?;
        if ledger_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "LEDGER_TIMEOUT_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        // Feed
        let feed_default_limit = parse_env_or_default("FEED_DEFAULT_LIMIT", 10)?;
        let feed_max_limit = parse_env_or_default("FEED_MAX_LIMIT", 50)?;
        if feed_default_limit == 0 || feed_max_limit < feed_default_limit {
            return Err(ConfigError::InvalidValue(
                "FEED_MAX_LIMIT".to_string(),
                format!(
                    "need 0 < FEED_DEFAULT_LIMIT ({}) <= FEED_MAX_LIMIT ({})",
                    feed_default_limit, feed_max_limit
                ),
            ));
        }
        let max_post_chars = parse_env_or_default("MAX_POST_CHARS", 2_000)?;

        Ok(Config {
            session_secret,
            session_ttl_secs,
            challenge_message,
            bind_addr,
            max_body_bytes,
            cors_allowed_origins,
            redis_url,
            ledger_rpc_url,
            membership_nft_address,
            proof_of_location_address,
            backend_wallet_key,
            ledger_timeout_ms,
            feed_default_limit,
            feed_max_limit,
            max_post_chars,
        })
    }

    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_timeout_ms)
    }
}

fn required_var(key: &str) -> Result<String, ConfigError> {
    let value = env::var(key).map_err(|_| ConfigError::MissingVar(key.to_string()))?;
    if value.is_empty() {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "cannot be empty".to_string(),
        ));
    }
    Ok(value)
}

fn address_var(key: &str) -> Result<Address, ConfigError> {
    required_var(key)?
        .parse::<Address>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}

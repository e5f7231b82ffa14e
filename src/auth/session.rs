//! Stateless session tokens (HS256 JWT) bound to a wallet address.

use crate::models::Address;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default session lifetime: 7 days.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Error type for session operations.
///
/// Expired, malformed and forged tokens are deliberately indistinguishable.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid session token")]
    Invalid,

    #[error("failed to encode session token: {0}")]
    Encode(String),
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Wallet address, lowercase hex.
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
}

/// A validated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub address: Address,
    pub issued_at: u64,
    pub expires_at: u64,
}

/// Issues and validates session tokens with a server-held secret.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("secret", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl SessionIssuer {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Mint a token for `address`, valid from now for the configured TTL.
    pub fn issue(&self, address: &Address) -> Result<String, SessionError> {
        self.issue_at(address, now_secs())
    }

    /// Mint a token as if issued at `issued_at` (unix seconds).
    pub fn issue_at(&self, address: &Address, issued_at: u64) -> Result<String, SessionError> {
        let claims = Claims {
            sub: address.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(self.ttl_secs),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| SessionError::Encode(e.to_string()))
    }

    /// Verify signature and expiry, returning the bound session.
    pub fn validate(&self, token: &str) -> Result<Session, SessionError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Session token rejected");
            SessionError::Invalid
        })?;

        let address = data
            .claims
            .sub
            .parse::<Address>()
            .map_err(|_| SessionError::Invalid)?;

        Ok(Session {
            address,
            issued_at: data.claims.iat,
            expires_at: data.claims.exp,
        })
    }
}

//! Request and response models for the API.
//!
//! All models use serde for serialization/deserialization.
//! Storage models are serialized as JSON in Redis.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Ledger Identifiers
// ============================================================================

/// Error returned when parsing an address or hash from hex text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], HexParseError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let bytes = hex::decode(digits).map_err(|e| HexParseError::InvalidHex(e.to_string()))?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| HexParseError::InvalidLength {
        expected: N,
        actual,
    })
}

/// 20-byte wallet address.
///
/// Parsing accepts any hex case (with or without `0x`), so comparing two
/// parsed addresses is case-insensitive on their text form. Always rendered
/// as lowercase `0x`-prefixed hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = HexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<20>(s.trim()).map(Address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 32-byte neighborhood key as recorded by the proof-of-location contract.
///
/// The all-zero value is the "unset" sentinel: the contract returns it for
/// addresses that never verified a location.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NeighborhoodHash(pub [u8; 32]);

impl NeighborhoodHash {
    pub const UNSET: NeighborhoodHash = NeighborhoodHash([0u8; 32]);

    pub fn is_unset(&self) -> bool {
        *self == Self::UNSET
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for NeighborhoodHash {
    type Err = HexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<32>(s.trim()).map(NeighborhoodHash)
    }
}

impl fmt::Display for NeighborhoodHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for NeighborhoodHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NeighborhoodHash({})", self)
    }
}

impl Serialize for NeighborhoodHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NeighborhoodHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Feed Models
// ============================================================================

/// A feed post. Also the stored representation in Redis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub content: String,
    pub author_address: Address,
    pub neighborhood_hash: NeighborhoodHash,
    /// Unix milliseconds.
    pub created_at: u64,
}

/// A validated post that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub content: String,
    pub author_address: Address,
    pub neighborhood_hash: NeighborhoodHash,
}

/// Rejected post content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostValidationError {
    #[error("Post content is required.")]
    Empty,

    #[error("Post content exceeds {max} characters.")]
    TooLong { max: usize },
}

impl NewPost {
    /// Validate content before it reaches any store.
    pub fn new(
        content: String,
        author_address: Address,
        neighborhood_hash: NeighborhoodHash,
        max_chars: usize,
    ) -> Result<Self, PostValidationError> {
        if content.trim().is_empty() {
            return Err(PostValidationError::Empty);
        }
        if content.chars().count() > max_chars {
            return Err(PostValidationError::TooLong { max: max_chars });
        }
        Ok(Self {
            content,
            author_address,
            neighborhood_hash,
        })
    }
}

/// Request body for `POST /feed`.
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub content: Option<String>,
}

/// Query string for `GET /feed`.
///
/// Kept as raw text so that empty or junk values fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Leading decimal digits of `raw` as a positive number.
///
/// `"3"` and `"3abc"` give 3. Empty, signed, non-numeric and zero give `None`.
fn positive_prefix(raw: Option<&str>) -> Option<u32> {
    let raw = raw?.trim();
    let end = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    raw[..end].parse::<u32>().ok().filter(|n| *n > 0)
}

/// Normalized pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
}

impl Page {
    /// Missing or unusable values take the defaults, then `limit` is capped
    /// at `max_limit`.
    pub fn from_query(query: &FeedQuery, default_limit: u32, max_limit: u32) -> Self {
        let page = positive_prefix(query.page.as_deref()).unwrap_or(1);
        let limit = positive_prefix(query.limit.as_deref())
            .unwrap_or(default_limit)
            .clamp(1, max_limit.max(1));
        Self { page, limit }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

// ============================================================================
// Auth Models
// ============================================================================

/// Request to exchange a signed challenge for a session token.
#[derive(Debug, Deserialize)]
pub struct VerifySignatureRequest {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

/// Response after successful verification.
#[derive(Debug, Serialize)]
pub struct VerifySignatureResponse {
    pub token: String,
}

// ============================================================================
// Location Models
// ============================================================================

/// Request to record a location verification for the caller.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyLocationRequest {
    #[serde(default)]
    pub neighborhood_id: Option<String>,
}

/// Response after the ledger accepted the verification transaction.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyLocationResponse {
    pub message: String,
    pub transaction_hash: String,
}

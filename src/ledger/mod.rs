//! Ledger access: the on-chain state the gate reads and location
//! verification writes.
//!
//! Handlers only see the [`Ledger`] trait. Production uses
//! [`rpc::RpcLedger`]; tests substitute an in-process mock.

pub mod abi;
pub mod rpc;
pub mod tx;

use crate::models::{Address, NeighborhoodHash};
use async_trait::async_trait;

pub use rpc::{RpcLedger, RpcLedgerConfig};

/// Error type for ledger calls.
///
/// Any of these means "could not find out", never "not a member".
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger call timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("transaction signing failed: {0}")]
    Signing(String),
}

/// Read/write access to the membership and proof-of-location contracts.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Membership NFT balance (`balanceOf`), saturating at `u128::MAX`.
    async fn nft_balance(&self, address: &Address) -> Result<u128, LedgerError>;

    /// Recorded location hash (`locationVerifications`); all-zero when unset.
    async fn location_hash(&self, address: &Address) -> Result<NeighborhoodHash, LedgerError>;

    /// Record `location` for `address`. Returns the transaction hash.
    async fn verify_location(
        &self,
        address: &Address,
        location: &NeighborhoodHash,
    ) -> Result<String, LedgerError>;
}

/// Location hash recorded for a neighborhood identifier.
pub fn neighborhood_hash_for(neighborhood_id: &str) -> NeighborhoodHash {
    NeighborhoodHash(abi::keccak256(neighborhood_id.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighborhood_hash_is_stable_and_set() {
        let a = neighborhood_hash_for("downtown-123");
        let b = neighborhood_hash_for("downtown-123");
        let c = neighborhood_hash_for("uptown-7");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!a.is_unset());
    }
}

//! Membership gate: NFT ownership plus a verified location, read live from
//! the ledger on every gated request.

use crate::ledger::{Ledger, LedgerError};
use crate::models::{Address, NeighborhoodHash};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Why a caller with a valid session was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotMember,
    NoLocation,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::NotMember => write!(f, "Access denied. You are not a verified member."),
            DenyReason::NoLocation => write!(f, "Could not find user location verification."),
        }
    }
}

/// Gate outcome other than "allowed".
///
/// `Ledger` means the decision could not be made and must surface as a
/// server error, never as a denial.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("denied: {0}")]
    Denied(DenyReason),

    #[error("ledger unavailable: {0}")]
    Ledger(#[from] LedgerError),
}

/// Membership resolved for an address that passed the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    pub address: Address,
    pub nft_balance: u128,
    pub neighborhood_hash: NeighborhoodHash,
}

/// Decides access from live ledger reads. Holds no per-address state.
#[derive(Clone)]
pub struct MembershipGate {
    ledger: Arc<dyn Ledger>,
    timeout: Duration,
}

impl MembershipGate {
    pub fn new(ledger: Arc<dyn Ledger>, timeout: Duration) -> Self {
        Self { ledger, timeout }
    }

    /// Check balance, then location. The location is only read for holders.
    pub async fn check(&self, address: &Address) -> Result<Membership, GateError> {
        let nft_balance = self.bounded(self.ledger.nft_balance(address)).await?;
        if nft_balance == 0 {
            tracing::info!(action = "gate_denied", address = %address, reason = "not_member", "Access denied");
            return Err(GateError::Denied(DenyReason::NotMember));
        }

        let neighborhood_hash = self.bounded(self.ledger.location_hash(address)).await?;
        if neighborhood_hash.is_unset() {
            tracing::info!(action = "gate_denied", address = %address, reason = "no_location", "Access denied");
            return Err(GateError::Denied(DenyReason::NoLocation));
        }

        tracing::debug!(
            action = "gate_granted",
            address = %address,
            neighborhood = %neighborhood_hash,
            "Access granted"
        );

        Ok(Membership {
            address: *address,
            nft_balance,
            neighborhood_hash,
        })
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, LedgerError>
    where
        F: Future<Output = Result<T, LedgerError>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| LedgerError::Timeout)?
    }
}

//! Wallet signature verification (EIP-191 personal-sign over secp256k1).

use crate::ledger::abi::keccak256;
use crate::models::Address;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};

/// Challenge text clients sign to prove key ownership.
pub const DEFAULT_CHALLENGE_MESSAGE: &str =
    "Welcome to GRID! Sign this message to prove you own this wallet.";

/// Error type for producing signatures.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),
}

/// Digest a wallet signs for `personal_sign`:
/// `keccak256("\x19Ethereum Signed Message:\n" || len || message)`.
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut data = Vec::with_capacity(prefix.len() + message.len());
    data.extend_from_slice(prefix.as_bytes());
    data.extend_from_slice(message);
    keccak256(&data)
}

/// Derive the account address for a public key: last 20 bytes of
/// keccak256 over the uncompressed point without its 0x04 tag.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    Address(out)
}

/// Recover the signing address from a 65-byte hex signature (`r || s || v`).
///
/// Returns `None` for anything malformed: bad hex, wrong length, unknown
/// `v`, or a signature no key could have produced.
pub fn recover_address(message: &[u8], signature_hex: &str) -> Option<Address> {
    let digits = signature_hex
        .trim()
        .strip_prefix("0x")
        .unwrap_or(signature_hex.trim());
    let bytes = hex::decode(digits).ok()?;
    if bytes.len() != 65 {
        return None;
    }

    let v = match bytes[64] {
        v @ (0 | 1) => v,
        v @ (27 | 28) => v - 27,
        _ => return None,
    };

    let mut signature = Signature::from_slice(&bytes[..64]).ok()?;
    let mut recovery_id = RecoveryId::from_byte(v)?;

    // Wallets emit low-S, but older signers may not. Flipping S flips the
    // parity of R's y coordinate.
    if let Some(normalized) = signature.normalize_s() {
        signature = normalized;
        recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
    }

    let digest = personal_message_hash(message);
    let key = VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id).ok()?;
    Some(address_of(&key))
}

/// Verify that `signature_hex` over `message` was produced by `address`.
///
/// Never fails: malformed input is simply not a valid signature.
pub fn verify_signature(address: &Address, message: &str, signature_hex: &str) -> bool {
    match recover_address(message.as_bytes(), signature_hex) {
        Some(recovered) => recovered == *address,
        None => false,
    }
}

/// Sign `message` the way a wallet's `personal_sign` does.
///
/// Returns `0x`-prefixed hex of `r || s || v` with `v` in {27, 28}.
pub fn sign_message(key: &SigningKey, message: &str) -> Result<String, SignError> {
    let digest = personal_message_hash(message.as_bytes());
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(&digest)
        .map_err(|e| SignError::Signing(e.to_string()))?;

    let mut bytes = Vec::with_capacity(65);
    bytes.extend_from_slice(&signature.to_bytes());
    bytes.push(recovery_id.to_byte() + 27);
    Ok(format!("0x{}", hex::encode(bytes)))
}

/// Parse a hex private key (with or without `0x`).
pub fn signing_key_from_hex(private_key_hex: &str) -> Result<SigningKey, SignError> {
    let digits = private_key_hex
        .trim()
        .strip_prefix("0x")
        .unwrap_or(private_key_hex.trim());
    let bytes = hex::decode(digits).map_err(|e| SignError::InvalidKey(e.to_string()))?;
    SigningKey::from_slice(&bytes).map_err(|e| SignError::InvalidKey(e.to_string()))
}

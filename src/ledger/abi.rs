//! Minimal Solidity ABI encoding for the handful of calls the gate makes.

use crate::ledger::LedgerError;
use crate::models::Address;
use sha3::{Digest, Keccak256};

/// Keccak-256 (the pre-standard SHA-3 variant used by Ethereum).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// First four bytes of keccak256 over a canonical function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// A static ABI argument.
#[derive(Debug, Clone, Copy)]
pub enum Token {
    Address(Address),
    Bytes32([u8; 32]),
}

impl Token {
    fn encode_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        match self {
            Token::Address(address) => word[12..].copy_from_slice(address.as_bytes()),
            Token::Bytes32(bytes) => word.copy_from_slice(bytes),
        }
        word
    }
}

/// Encode calldata: selector followed by one 32-byte word per argument.
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 32 * args.len());
    data.extend_from_slice(&selector(signature));
    for arg in args {
        data.extend_from_slice(&arg.encode_word());
    }
    data
}

fn first_word(data: &[u8]) -> Result<[u8; 32], LedgerError> {
    if data.len() < 32 {
        return Err(LedgerError::InvalidResponse(format!(
            "expected at least 32 bytes of return data, got {}",
            data.len()
        )));
    }
    let mut word = [0u8; 32];
    word.copy_from_slice(&data[..32]);
    Ok(word)
}

/// Decode a `uint256` return value, saturating at `u128::MAX`.
pub fn decode_uint(data: &[u8]) -> Result<u128, LedgerError> {
    let word = first_word(data)?;
    if word[..16].iter().any(|b| *b != 0) {
        return Ok(u128::MAX);
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(low))
}

/// Decode a `bytes32` return value.
pub fn decode_bytes32(data: &[u8]) -> Result<[u8; 32], LedgerError> {
    first_word(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_known_selectors() {
        assert_eq!(selector("balanceOf(address)"), [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(
            selector("transfer(address,uint256)"),
            [0xa9, 0x05, 0x9c, 0xbb]
        );
    }

    #[test]
    fn test_encode_call_layout() {
        let address = Address([0xaa; 20]);
        let data = encode_call(
            "verifyLocation(address,bytes32)",
            &[Token::Address(address), Token::Bytes32([0x11; 32])],
        );

        assert_eq!(data.len(), 4 + 64);
        assert_eq!(&data[..4], &selector("verifyLocation(address,bytes32)"));
        assert_eq!(&data[4..16], &[0u8; 12]);
        assert_eq!(&data[16..36], &[0xaa; 20]);
        assert_eq!(&data[36..68], &[0x11; 32]);
    }

    #[test]
    fn test_decode_uint() {
        let mut word = [0u8; 32];
        word[31] = 3;
        assert_eq!(decode_uint(&word).unwrap(), 3);

        assert_eq!(decode_uint(&[0u8; 32]).unwrap(), 0);

        let mut huge = [0u8; 32];
        huge[0] = 1;
        assert_eq!(decode_uint(&huge).unwrap(), u128::MAX);
    }

    #[test]
    fn test_decode_short_data_is_error() {
        assert!(matches!(
            decode_uint(&[0u8; 4]),
            Err(LedgerError::InvalidResponse(_))
        ));
        assert!(matches!(
            decode_bytes32(&[]),
            Err(LedgerError::InvalidResponse(_))
        ));
    }
}

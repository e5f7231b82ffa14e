//! Legacy (EIP-155) transaction encoding and signing.
//!
//! The backend wallet signs locally and submits with
//! `eth_sendRawTransaction`, so the node never holds the key.

use crate::ledger::abi::keccak256;
use crate::ledger::LedgerError;
use crate::models::Address;
use k256::ecdsa::SigningKey;

/// Unsigned legacy transaction with replay protection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u128,
    pub gas_price: u128,
    pub gas_limit: u128,
    pub to: Address,
    pub value: u128,
    pub data: Vec<u8>,
    pub chain_id: u128,
}

impl LegacyTransaction {
    fn encode_fields(&self, out: &mut Vec<u8>) {
        rlp_uint(out, self.nonce);
        rlp_uint(out, self.gas_price);
        rlp_uint(out, self.gas_limit);
        rlp_bytes(out, self.to.as_bytes());
        rlp_uint(out, self.value);
        rlp_bytes(out, &self.data);
    }

    /// RLP of `[nonce, gasPrice, gas, to, value, data, chainId, 0, 0]`.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut fields = Vec::new();
        self.encode_fields(&mut fields);
        rlp_uint(&mut fields, self.chain_id);
        rlp_uint(&mut fields, 0);
        rlp_uint(&mut fields, 0);
        rlp_list(fields)
    }

    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.signing_payload())
    }

    /// Sign and return the raw transaction bytes ready for broadcast.
    pub fn sign(&self, key: &SigningKey) -> Result<Vec<u8>, LedgerError> {
        let (signature, recovery_id) = key
            .sign_prehash_recoverable(&self.signing_hash())
            .map_err(|e| LedgerError::Signing(e.to_string()))?;

        let v = self
            .chain_id
            .checked_mul(2)
            .and_then(|n| n.checked_add(35 + recovery_id.to_byte() as u128))
            .ok_or_else(|| LedgerError::Signing(format!("chain id {} too large", self.chain_id)))?;

        let rs = signature.to_bytes();
        let mut fields = Vec::new();
        self.encode_fields(&mut fields);
        rlp_uint(&mut fields, v);
        rlp_bytes(&mut fields, strip_leading_zeros(&rs[..32]));
        rlp_bytes(&mut fields, strip_leading_zeros(&rs[32..]));
        Ok(rlp_list(fields))
    }
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

fn rlp_length_prefix(out: &mut Vec<u8>, len: usize, short_base: u8) {
    if len <= 55 {
        out.push(short_base + len as u8);
    } else {
        let len_bytes = len.to_be_bytes();
        let len_bytes = strip_leading_zeros(&len_bytes);
        out.push(short_base + 55 + len_bytes.len() as u8);
        out.extend_from_slice(len_bytes);
    }
}

fn rlp_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    if bytes.len() == 1 && bytes[0] < 0x80 {
        out.push(bytes[0]);
        return;
    }
    rlp_length_prefix(out, bytes.len(), 0x80);
    out.extend_from_slice(bytes);
}

/// Integers are big-endian with no leading zeros; zero is the empty string.
fn rlp_uint(out: &mut Vec<u8>, value: u128) {
    let bytes = value.to_be_bytes();
    rlp_bytes(out, strip_leading_zeros(&bytes));
}

fn rlp_list(payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 9);
    rlp_length_prefix(&mut out, payload.len(), 0xc0);
    out.extend_from_slice(&payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eip155_example() -> (LegacyTransaction, SigningKey) {
        let tx = LegacyTransaction {
            nonce: 9,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: Address([0x35; 20]),
            value: 1_000_000_000_000_000_000,
            data: Vec::new(),
            chain_id: 1,
        };
        let key = SigningKey::from_slice(&[0x46; 32]).unwrap();
        (tx, key)
    }

    // Worked example published with EIP-155.
    #[test]
    fn test_eip155_example_payload_and_hash() {
        let (tx, _) = eip155_example();
        assert_eq!(
            hex::encode(tx.signing_payload()),
            "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080"
        );
        assert_eq!(
            hex::encode(tx.signing_hash()),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn test_eip155_example_signed() {
        let (tx, key) = eip155_example();
        let raw = tx.sign(&key).unwrap();
        assert_eq!(
            hex::encode(raw),
            "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a7640000\
             8025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f\
             761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
    }

    #[test]
    fn test_rlp_primitives() {
        let mut out = Vec::new();
        rlp_uint(&mut out, 0);
        assert_eq!(out, [0x80]);

        let mut out = Vec::new();
        rlp_uint(&mut out, 0x7f);
        assert_eq!(out, [0x7f]);

        let mut out = Vec::new();
        rlp_uint(&mut out, 0x80);
        assert_eq!(out, [0x81, 0x80]);

        let mut out = Vec::new();
        rlp_bytes(&mut out, &[0xaa; 56]);
        assert_eq!(&out[..2], &[0xb8, 56]);
        assert_eq!(out.len(), 58);

        assert_eq!(rlp_list(Vec::new()), [0xc0]);
        let long = rlp_list(vec![0x01; 60]);
        assert_eq!(&long[..2], &[0xf8, 60]);
    }

    #[test]
    fn test_calldata_longer_than_short_form() {
        let (mut tx, key) = eip155_example();
        // verifyLocation calldata: 4-byte selector + two words.
        tx.data = vec![0xab; 68];
        let raw = tx.sign(&key).unwrap();
        assert_eq!(raw[0], 0xf8);
        assert_eq!(raw[1] as usize, raw.len() - 2);
    }
}

//! JSON-RPC ledger client (`eth_call` reads, locally signed `eth_sendRawTransaction` writes).

use crate::auth::verify::address_of;
use crate::ledger::abi::{self, Token};
use crate::ledger::tx::LegacyTransaction;
use crate::ledger::{Ledger, LedgerError};
use crate::models::{Address, NeighborhoodHash};
use async_trait::async_trait;
use k256::ecdsa::SigningKey;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};

const BALANCE_OF: &str = "balanceOf(address)";
const LOCATION_VERIFICATIONS: &str = "locationVerifications(address)";
const VERIFY_LOCATION: &str = "verifyLocation(address,bytes32)";

/// Gas estimate headroom, in percent of the node's estimate.
const GAS_HEADROOM_PERCENT: u128 = 120;

/// Connection settings for [`RpcLedger`].
#[derive(Clone)]
pub struct RpcLedgerConfig {
    pub rpc_url: String,
    /// Membership NFT contract (`balanceOf`).
    pub membership_nft: Address,
    /// Proof-of-location contract (`locationVerifications`, `verifyLocation`).
    pub proof_of_location: Address,
    /// Key that signs verification transactions.
    pub backend_key: SigningKey,
    pub timeout: Duration,
}

impl std::fmt::Debug for RpcLedgerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcLedgerConfig")
            .field("rpc_url", &self.rpc_url)
            .field("membership_nft", &self.membership_nft)
            .field("proof_of_location", &self.proof_of_location)
            .field("backend_address", &address_of(self.backend_key.verifying_key()))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Ledger backed by an Ethereum-compatible JSON-RPC endpoint.
pub struct RpcLedger {
    client: reqwest::Client,
    config: RpcLedgerConfig,
    backend_address: Address,
    next_id: AtomicU64,
    chain_id: OnceCell<u128>,
    /// Held from nonce lookup to broadcast so concurrent writes get distinct nonces.
    send_lock: Mutex<()>,
}

impl std::fmt::Debug for RpcLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcLedger")
            .field("client", &"reqwest::Client")
            .field("config", &self.config)
            .field("chain_id", &self.chain_id.get())
            .finish()
    }
}

impl RpcLedger {
    pub fn new(config: RpcLedgerConfig) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LedgerError::Transport(format!("failed to build HTTP client: {}", e)))?;

        let backend_address = address_of(config.backend_key.verifying_key());

        Ok(Self {
            client,
            config,
            backend_address,
            next_id: AtomicU64::new(1),
            chain_id: OnceCell::new(),
            send_lock: Mutex::new(()),
        })
    }

    /// Address of the backend signing key.
    pub fn backend_address(&self) -> Address {
        self.backend_address
    }

    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, LedgerError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .client
            .post(&self.config.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::Transport(format!("HTTP status {}", status)));
        }

        let body: JsonRpcResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LedgerError::Timeout
            } else {
                LedgerError::InvalidResponse(e.to_string())
            }
        })?;

        if let Some(error) = body.error {
            return Err(LedgerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        body.result
            .ok_or_else(|| LedgerError::InvalidResponse(format!("{} returned no result", method)))
    }

    async fn eth_call(&self, to: &Address, data: Vec<u8>) -> Result<Vec<u8>, LedgerError> {
        let result = self
            .request(
                "eth_call",
                vec![
                    json!({ "to": to.to_string(), "data": to_hex(&data) }),
                    json!("latest"),
                ],
            )
            .await?;

        let text = result
            .as_str()
            .ok_or_else(|| LedgerError::InvalidResponse("eth_call result is not a string".into()))?;
        from_hex(text)
    }

    /// Call a method whose result is a hex quantity.
    async fn quantity(&self, method: &str, params: Vec<Value>) -> Result<u128, LedgerError> {
        let result = self.request(method, params).await?;
        parse_quantity(&result)
            .ok_or_else(|| LedgerError::InvalidResponse(format!("{} returned {}", method, result)))
    }

    async fn chain_id(&self) -> Result<u128, LedgerError> {
        self.chain_id
            .get_or_try_init(|| self.quantity("eth_chainId", Vec::new()))
            .await
            .copied()
    }
}

fn parse_quantity(value: &Value) -> Option<u128> {
    let digits = value.as_str()?.strip_prefix("0x")?;
    if digits.is_empty() {
        return None;
    }
    u128::from_str_radix(digits, 16).ok()
}

fn map_transport_error(err: reqwest::Error) -> LedgerError {
    if err.is_timeout() {
        LedgerError::Timeout
    } else if err.is_connect() {
        LedgerError::Transport(format!("connection failed: {}", err))
    } else {
        LedgerError::Transport(err.to_string())
    }
}

fn to_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn from_hex(text: &str) -> Result<Vec<u8>, LedgerError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(digits).map_err(|e| LedgerError::InvalidResponse(format!("bad hex: {}", e)))
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn nft_balance(&self, address: &Address) -> Result<u128, LedgerError> {
        let data = abi::encode_call(BALANCE_OF, &[Token::Address(*address)]);
        let output = self.eth_call(&self.config.membership_nft, data).await?;
        abi::decode_uint(&output)
    }

    async fn location_hash(&self, address: &Address) -> Result<NeighborhoodHash, LedgerError> {
        let data = abi::encode_call(LOCATION_VERIFICATIONS, &[Token::Address(*address)]);
        let output = self.eth_call(&self.config.proof_of_location, data).await?;
        abi::decode_bytes32(&output).map(NeighborhoodHash)
    }

    async fn verify_location(
        &self,
        address: &Address,
        location: &NeighborhoodHash,
    ) -> Result<String, LedgerError> {
        let data = abi::encode_call(
            VERIFY_LOCATION,
            &[Token::Address(*address), Token::Bytes32(*location.as_bytes())],
        );

        let to = self.config.proof_of_location;
        let from = self.backend_address.to_string();
        let chain_id = self.chain_id().await?;

        let _guard = self.send_lock.lock().await;
        let nonce = self
            .quantity("eth_getTransactionCount", vec![json!(from), json!("pending")])
            .await?;
        let gas_price = self.quantity("eth_gasPrice", Vec::new()).await?;
        let gas_estimate = self
            .quantity(
                "eth_estimateGas",
                vec![json!({ "from": from, "to": to.to_string(), "data": to_hex(&data) })],
            )
            .await?;

        let tx = LegacyTransaction {
            nonce,
            gas_price,
            gas_limit: gas_estimate.saturating_mul(GAS_HEADROOM_PERCENT) / 100,
            to,
            value: 0,
            data,
            chain_id,
        };
        let raw = tx.sign(&self.config.backend_key)?;

        let result = self
            .request("eth_sendRawTransaction", vec![json!(to_hex(&raw))])
            .await?;

        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LedgerError::InvalidResponse("transaction hash is not a string".into()))
    }
}

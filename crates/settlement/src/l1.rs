//! The [L1Client] interface and its JSON-RPC implementation.

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// An error returned by an [L1Client].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct L1ClientError(pub String);

impl From<reqwest::Error> for L1ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

/// A [Result] type for the [L1ClientError] struct.
pub type L1ClientResult<T> = Result<T, L1ClientError>;

/// The slice of an Ethereum L1 node the relayer needs.
///
/// Any error fails the whole submission; the batch is not recorded and the
/// range is retried on the next tick.
#[async_trait]
pub trait L1Client: std::fmt::Debug + Send + Sync {
    /// The chain id of the L1 network.
    async fn chain_id(&self) -> L1ClientResult<u64>;

    /// The pending-pool nonce of an address.
    async fn pending_nonce_at(&self, addr: Address) -> L1ClientResult<u64>;

    /// The node's suggested gas price.
    async fn suggest_gas_price(&self) -> L1ClientResult<U256>;

    /// Broadcasts a raw signed transaction, returning its hash.
    async fn send_raw_transaction(&self, raw: Bytes) -> L1ClientResult<B256>;
}

/// An [L1Client] over plain JSON-RPC via [reqwest].
#[derive(Debug, Clone)]
pub struct HttpL1Client {
    /// The L1 JSON-RPC endpoint.
    endpoint: String,
    /// The inner reqwest client.
    inner: reqwest::Client,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<serde_json::Value>,
    error: Option<JsonRpcErrorObject>,
}

#[derive(Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

impl HttpL1Client {
    /// Creates a new [HttpL1Client] for the given endpoint URL.
    pub fn new(endpoint: String) -> Self {
        Self { endpoint, inner: reqwest::Client::new() }
    }

    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> L1ClientResult<serde_json::Value> {
        let body = json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params });
        let response = self
            .inner
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .json::<JsonRpcResponse>()
            .await?;

        if let Some(err) = response.error {
            return Err(L1ClientError(format!("{method}: {} (code {})", err.message, err.code)));
        }
        response.result.ok_or_else(|| L1ClientError(format!("{method}: empty result")))
    }

    async fn call_quantity(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> L1ClientResult<U256> {
        let result = self.call(method, params).await?;
        let quantity = result
            .as_str()
            .ok_or_else(|| L1ClientError(format!("{method}: non-string quantity")))?;
        quantity
            .parse::<U256>()
            .map_err(|err| L1ClientError(format!("{method}: bad quantity: {err}")))
    }
}

#[async_trait]
impl L1Client for HttpL1Client {
    async fn chain_id(&self) -> L1ClientResult<u64> {
        Ok(self.call_quantity("eth_chainId", json!([])).await?.saturating_to())
    }

    async fn pending_nonce_at(&self, addr: Address) -> L1ClientResult<u64> {
        Ok(self
            .call_quantity("eth_getTransactionCount", json!([addr, "pending"]))
            .await?
            .saturating_to())
    }

    async fn suggest_gas_price(&self) -> L1ClientResult<U256> {
        self.call_quantity("eth_gasPrice", json!([])).await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> L1ClientResult<B256> {
        let result = self.call("eth_sendRawTransaction", json!([raw])).await?;
        let hash = result
            .as_str()
            .ok_or_else(|| L1ClientError("eth_sendRawTransaction: non-string hash".to_string()))?;
        hash.parse::<B256>()
            .map_err(|err| L1ClientError(format!("eth_sendRawTransaction: bad hash: {err}")))
    }
}

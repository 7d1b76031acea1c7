//! JSON-RPC client for the exchange node.

use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// JSON-RPC client for querying chain state and node-held accounts.
#[derive(Debug, Clone)]
pub struct ChainClient {
    rpc_url: String,
    http_client: reqwest::Client,
}

impl ChainClient {
    /// Create a new client for the given RPC endpoint.
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Create a client with a preconfigured HTTP client (timeouts, proxies).
    pub fn with_http_client(rpc_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            http_client,
        }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Network id reported by `net_version`.
    pub async fn network_id(&self) -> Result<u64> {
        let response: JsonRpcResponse<String> =
            self.rpc_call("net_version", serde_json::json!([])).await?;
        parse_quantity(&response.into_result()?)
    }

    /// Chain id reported by `eth_chainId`.
    pub async fn chain_id(&self) -> Result<u64> {
        let response: JsonRpcResponse<String> =
            self.rpc_call("eth_chainId", serde_json::json!([])).await?;
        parse_quantity(&response.into_result()?)
    }

    /// Accounts the node can sign for.
    pub async fn accounts(&self) -> Result<Vec<Address>> {
        let response: JsonRpcResponse<Vec<Address>> =
            self.rpc_call("eth_accounts", serde_json::json!([])).await?;
        response.into_result()
    }

    /// Ask the node to sign `data` with `account` (`eth_sign`).
    ///
    /// The node applies the EIP-191 personal-message prefix before signing.
    pub async fn sign(&self, account: Address, data: &[u8]) -> Result<Bytes> {
        let params = serde_json::json!([account, format!("0x{}", hex::encode(data))]);
        let response: JsonRpcResponse<Bytes> = self.rpc_call("eth_sign", params).await?;
        response.into_result()
    }

    async fn rpc_call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<JsonRpcResponse<T>> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        debug!(method, url = %self.rpc_url, "JSON-RPC call");

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Rpc {
                message: format!("RPC request failed: {}", response.status()),
                code: None,
            });
        }

        Ok(response.json().await?)
    }
}

/// Parse a quantity returned either as `0x`-hex or as a decimal string.
fn parse_quantity(raw: &str) -> Result<u64> {
    let parsed = match raw.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|e| Error::Rpc {
        message: format!("Failed to parse quantity {:?}: {}", raw, e),
        code: None,
    })
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

impl<T> JsonRpcResponse<T> {
    fn into_result(self) -> Result<T> {
        if let Some(error) = self.error {
            return Err(Error::Rpc {
                message: error.message,
                code: Some(error.code),
            });
        }
        self.result.ok_or_else(|| Error::Rpc {
            message: "No result in response".to_string(),
            code: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

use crate::error::RpcClientError;
use crate::types::{BlockIdentifier, CallFrame, CallRequest, RpcBlock, RpcLog};
use ethereum_types::{Address, H256, U256};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Bounded retry/backoff policy for transient RPC failures, the same
/// shape as the teacher's watcher retry loop: a small number of attempts
/// with linearly growing delay rather than an unbounded spin.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
        }
    }
}

/// A plain JSON-RPC 2.0 client over HTTP, used for both the L1 and L2
/// roles (§4.5, §6). Neither side embeds an EVM; every read and write
/// goes over this client to an external node.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    url: Url,
    retry: RetryPolicy,
}

impl RpcClient {
    pub fn new(url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub(crate) async fn rpc_call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T, RpcClientError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_call(method, &body).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.retry.max_attempts && err.kind().is_retriable() => {
                    let delay = self.retry.base_delay * attempt;
                    warn!(%method, attempt, ?delay, %err, "retrying rpc call");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        body: &Value,
    ) -> Result<T, RpcClientError> {
        let response = self
            .http
            .post(self.url.clone())
            .json(body)
            .send()
            .await
            .map_err(|source| RpcClientError::Transport { method, source })?;

        let envelope: Value = response
            .json()
            .await
            .map_err(|source| RpcClientError::Transport { method, source })?;

        if let Some(error) = envelope.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(RpcClientError::JsonRpc {
                method,
                code,
                message,
            });
        }

        let result = envelope
            .get("result")
            .cloned()
            .ok_or_else(|| RpcClientError::Decode {
                method,
                reason: "missing result field".to_string(),
            })?;

        serde_json::from_value(result).map_err(|e| RpcClientError::Decode {
            method,
            reason: e.to_string(),
        })
    }

    pub async fn block_number(&self) -> Result<u64, RpcClientError> {
        let hex: String = self.rpc_call("eth_blockNumber", json!([])).await?;
        decode_hex_u64(hex)
    }

    pub async fn chain_id(&self) -> Result<u64, RpcClientError> {
        let hex: String = self.rpc_call("eth_chainId", json!([])).await?;
        decode_hex_u64(hex)
    }

    pub async fn get_block_by_number(
        &self,
        block: BlockIdentifier,
    ) -> Result<Option<RpcBlock>, RpcClientError> {
        self.rpc_call("eth_getBlockByNumber", json!([block.to_param(), false]))
            .await
    }

    /// Fetches logs in `[from, to]` inclusive, matching any topic in
    /// `topics` at position 0. The caller is responsible for chunking
    /// wide ranges (§4.2.1); this method issues exactly one request.
    pub async fn get_logs(
        &self,
        from: u64,
        to: u64,
        address: Address,
        topics: Vec<H256>,
    ) -> Result<Vec<RpcLog>, RpcClientError> {
        let filter = json!({
            "fromBlock": format!("0x{from:x}"),
            "toBlock": format!("0x{to:x}"),
            "address": address,
            "topics": [topics],
        });
        debug!(from, to, ?address, "fetching logs");
        self.rpc_call("eth_getLogs", json!([filter])).await
    }

    pub async fn get_balance(
        &self,
        address: Address,
        block: BlockIdentifier,
    ) -> Result<U256, RpcClientError> {
        let hex: String = self
            .rpc_call("eth_getBalance", json!([address, block.to_param()]))
            .await?;
        decode_hex_u256(hex)
    }

    pub async fn get_transaction_count(
        &self,
        address: Address,
        block: BlockIdentifier,
    ) -> Result<u64, RpcClientError> {
        let hex: String = self
            .rpc_call(
                "eth_getTransactionCount",
                json!([address, block.to_param()]),
            )
            .await?;
        decode_hex_u64(hex)
    }

    pub async fn get_code(
        &self,
        address: Address,
        block: BlockIdentifier,
    ) -> Result<Vec<u8>, RpcClientError> {
        let hex: String = self
            .rpc_call("eth_getCode", json!([address, block.to_param()]))
            .await?;
        hex::decode(hex.trim_start_matches("0x")).map_err(|e| RpcClientError::Decode {
            method: "eth_getCode",
            reason: e.to_string(),
        })
    }

    pub async fn get_storage_at(
        &self,
        address: Address,
        slot: H256,
        block: BlockIdentifier,
    ) -> Result<H256, RpcClientError> {
        self.rpc_call(
            "eth_getStorageAt",
            json!([address, slot, block.to_param()]),
        )
        .await
    }

    pub async fn call(
        &self,
        request: CallRequest,
        block: BlockIdentifier,
    ) -> Result<Vec<u8>, RpcClientError> {
        let hex: String = RpcClient::rpc_call(self, "eth_call", json!([request, block.to_param()]))
            .await?;
        hex::decode(hex.trim_start_matches("0x")).map_err(|e| RpcClientError::Decode {
            method: "eth_call",
            reason: e.to_string(),
        })
    }

    pub async fn trace_call(
        &self,
        request: CallRequest,
        block: BlockIdentifier,
    ) -> Result<CallFrame, RpcClientError> {
        self.rpc_call(
            "debug_traceCall",
            json!([request, block.to_param(), {"tracer": "callTracer"}]),
        )
        .await
    }

    pub async fn send_raw_transaction(&self, raw_tx: &[u8]) -> Result<H256, RpcClientError> {
        let encoded = format!("0x{}", hex::encode(raw_tx));
        self.rpc_call("eth_sendRawTransaction", json!([encoded])).await
    }

    pub async fn gas_price(&self) -> Result<U256, RpcClientError> {
        let hex: String = self.rpc_call("eth_gasPrice", json!([])).await?;
        decode_hex_u256(hex)
    }
}

fn decode_hex_u64(hex: String) -> Result<u64, RpcClientError> {
    u64::from_str_radix(hex.trim_start_matches("0x"), 16).map_err(|e| RpcClientError::Decode {
        method: "<u64 decode>",
        reason: e.to_string(),
    })
}

fn decode_hex_u256(hex: String) -> Result<U256, RpcClientError> {
    U256::from_str_radix(hex.trim_start_matches("0x"), 16).map_err(|e| RpcClientError::Decode {
        method: "<u256 decode>",
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_hex_u64_with_prefix() {
        assert_eq!(decode_hex_u64("0x2a".to_string()).unwrap(), 42);
    }

    #[test]
    fn decodes_hex_u256_with_prefix() {
        assert_eq!(decode_hex_u256("0xff".to_string()).unwrap(), U256::from(255));
    }

    #[test]
    fn block_identifier_renders_number_as_hex() {
        let param = BlockIdentifier::Number(255).to_param();
        assert_eq!(param, serde_json::Value::String("0xff".to_string()));
    }

    #[test]
    fn retry_policy_default_is_bounded() {
        let policy = RetryPolicy::default();
        assert!(policy.max_attempts > 0);
    }
}

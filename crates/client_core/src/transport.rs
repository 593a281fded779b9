//! JSON-RPC 2.0 over HTTP wallet provider (EIP-1193 request semantics).

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared::{
    domain::{Address, TxHash},
    error::ProviderError,
    protocol::{CallRequest, HexBytes, RpcRequest, RpcResponse, TransactionReceipt, TransactionRequest},
};
use tracing::{debug, info};
use url::Url;

use crate::WalletProvider;

pub struct JsonRpcProvider {
    http: Client,
    endpoint: Url,
    next_id: AtomicU64,
}

impl JsonRpcProvider {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: Client::new(),
            endpoint,
            next_id: AtomicU64::new(1),
        }
    }

    /// Capability probe: no configured endpoint means no wallet.
    pub fn detect(endpoint: Option<&str>) -> Result<Option<Self>> {
        let Some(raw) = endpoint.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Ok(None);
        };
        let endpoint =
            Url::parse(raw).with_context(|| format!("invalid wallet endpoint url '{raw}'"))?;
        info!(%endpoint, "wallet provider detected");
        Ok(Some(Self::new(endpoint)))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> std::result::Result<Option<T>, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, method, "json-rpc request");

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&RpcRequest::new(id, method, params))
            .send()
            .await
            .map_err(classify_transport_error)?
            .error_for_status()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(format!("malformed {method} response: {e}")))?;
        body.into_result()
    }

    async fn request_required<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> std::result::Result<T, ProviderError> {
        self.request(method, params)
            .await?
            .ok_or_else(|| ProviderError::Transport(format!("{method} returned no result")))
    }
}

fn classify_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_connect() || err.is_timeout() {
        ProviderError::Unavailable(err.to_string())
    } else {
        ProviderError::Transport(err.to_string())
    }
}

#[async_trait]
impl WalletProvider for JsonRpcProvider {
    async fn request_accounts(&self) -> std::result::Result<Vec<Address>, ProviderError> {
        match self
            .request_required("eth_requestAccounts", json!([]))
            .await
        {
            Err(err) if err.is_method_not_found() => {
                debug!("eth_requestAccounts unsupported; falling back to eth_accounts");
                self.request_required("eth_accounts", json!([])).await
            }
            other => other,
        }
    }

    async fn call(&self, request: CallRequest) -> std::result::Result<Vec<u8>, ProviderError> {
        let output: HexBytes = self
            .request_required("eth_call", json!([request, "latest"]))
            .await?;
        Ok(output.0)
    }

    async fn send_transaction(
        &self,
        request: TransactionRequest,
    ) -> std::result::Result<TxHash, ProviderError> {
        self.request_required("eth_sendTransaction", json!([request]))
            .await
    }

    async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> std::result::Result<Option<TransactionReceipt>, ProviderError> {
        self.request("eth_getTransactionReceipt", json!([tx_hash]))
            .await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;

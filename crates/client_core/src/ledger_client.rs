use std::{sync::Arc, time::Duration};

use shared::{
    abi,
    domain::{Address, Identity, TxHash, WriteReceipt},
    error::{LedgerError, ProviderError},
    protocol::{CallRequest, HexBytes, TransactionRequest},
};
use tracing::{debug, info, warn};

use crate::WalletProvider;

const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_RECEIPT_MAX_ATTEMPTS: u32 = 120;

/// How long to watch for a submitted transaction to be mined. Observation
/// only: a transaction is never re-sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptPolicy {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for ReceiptPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
            max_attempts: DEFAULT_RECEIPT_MAX_ATTEMPTS,
        }
    }
}

/// Typed proxy for the contract's getter and setter. Stateless.
pub struct LedgerClient {
    provider: Arc<dyn WalletProvider>,
    contract: Address,
    receipts: ReceiptPolicy,
}

impl LedgerClient {
    pub fn new(provider: Arc<dyn WalletProvider>, contract: Address) -> Self {
        Self::with_receipt_policy(provider, contract, ReceiptPolicy::default())
    }

    pub fn with_receipt_policy(
        provider: Arc<dyn WalletProvider>,
        contract: Address,
        receipts: ReceiptPolicy,
    ) -> Self {
        Self {
            provider,
            contract,
            receipts,
        }
    }

    pub async fn read_value(&self) -> Result<String, LedgerError> {
        let request = CallRequest {
            to: self.contract,
            data: HexBytes(abi::encode_get_message()),
        };
        let output = self
            .provider
            .call(request)
            .await
            .map_err(|e| LedgerError::ReadFailed(e.to_string()))?;
        let value =
            abi::decode_string(&output).map_err(|e| LedgerError::ReadFailed(e.to_string()))?;
        debug!(contract = %self.contract, len = value.len(), "read shared value");
        Ok(value)
    }

    pub async fn write_value(
        &self,
        new_value: &str,
        signer: Identity,
    ) -> Result<WriteReceipt, LedgerError> {
        if new_value.is_empty() {
            return Err(LedgerError::EmptyPayload);
        }

        let request = TransactionRequest {
            from: signer.address(),
            to: self.contract,
            data: HexBytes(abi::encode_set_message(new_value)),
        };
        let tx_hash = self
            .provider
            .send_transaction(request)
            .await
            .map_err(classify_submission_error)?;
        info!(%tx_hash, %signer, "write submitted; awaiting receipt");

        self.await_confirmation(tx_hash, signer).await
    }

    async fn await_confirmation(
        &self,
        tx_hash: TxHash,
        signer: Identity,
    ) -> Result<WriteReceipt, LedgerError> {
        for attempt in 1..=self.receipts.max_attempts.max(1) {
            let receipt = self
                .provider
                .transaction_receipt(tx_hash)
                .await
                .map_err(|e| LedgerError::ConfirmationFailed(e.to_string()))?;

            if let Some(receipt) = receipt {
                if !receipt.succeeded() {
                    warn!(%tx_hash, "transaction reverted");
                    return Err(LedgerError::ConfirmationFailed(
                        "transaction reverted".to_string(),
                    ));
                }
                let block_number = receipt.block_number.map(|n| n.0);
                info!(%tx_hash, ?block_number, attempt, "write confirmed");
                return Ok(WriteReceipt {
                    tx_hash,
                    block_number,
                    signer,
                });
            }

            debug!(%tx_hash, attempt, "receipt not yet available");
            if attempt < self.receipts.max_attempts {
                tokio::time::sleep(self.receipts.poll_interval).await;
            }
        }

        Err(LedgerError::ConfirmationFailed(format!(
            "transaction {tx_hash} not confirmed after {} receipt checks",
            self.receipts.max_attempts.max(1)
        )))
    }
}

fn classify_submission_error(err: ProviderError) -> LedgerError {
    match err {
        ProviderError::Rejected | ProviderError::Unauthorized => LedgerError::SigningRejected,
        other => LedgerError::SubmissionFailed(other.to_string()),
    }
}

#[cfg(test)]
#[path = "tests/ledger_client_tests.rs"]
mod tests;

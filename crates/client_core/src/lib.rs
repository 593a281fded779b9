use async_trait::async_trait;
use shared::{
    domain::{Address, TxHash},
    error::ProviderError,
    protocol::{CallRequest, TransactionReceipt, TransactionRequest},
};

pub mod controller;
pub mod ledger_client;
pub mod presentation;
pub mod transport;
pub mod wallet_session;

pub use controller::{
    ControllerError, ControllerEvent, ControllerHandle, ControllerUpdate, Effect,
    InteractionController, InteractionDriver, InteractionState, Phase,
};
pub use ledger_client::{LedgerClient, ReceiptPolicy};
pub use presentation::{render, Display, View};
pub use transport::JsonRpcProvider;
pub use wallet_session::WalletSession;

/// The signing agent. Holds the user's keys, may prompt the user, and is the
/// only path to the ledger.
///
/// Every method is a suspension point with unbounded latency: a wallet
/// prompt waits on a human.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;
    async fn call(&self, request: CallRequest) -> Result<Vec<u8>, ProviderError>;
    async fn send_transaction(&self, request: TransactionRequest)
        -> Result<TxHash, ProviderError>;
    async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, ProviderError>;
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

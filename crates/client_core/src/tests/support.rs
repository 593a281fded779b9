//! In-memory wallet + ledger used across the client_core tests.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU32, AtomicU8, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use shared::{
    abi,
    domain::{Address, Identity, TxHash},
    error::ProviderError,
    protocol::{CallRequest, Quantity, TransactionReceipt, TransactionRequest},
};
use tokio::sync::oneshot;

use crate::WalletProvider;

pub(crate) const CONTRACT: Address = Address([0xc0; 20]);
pub(crate) const ALICE: Address = Address([0xa1; 20]);
pub(crate) const BOB: Address = Address([0xb0; 20]);

pub(crate) fn alice() -> Identity {
    Identity(ALICE)
}

pub(crate) struct FakeProvider {
    stored: Mutex<String>,
    accounts: Mutex<Result<Vec<Address>, ProviderError>>,
    read_error: Mutex<Option<ProviderError>>,
    raw_call_output: Mutex<Option<Vec<u8>>>,
    send_error: Mutex<Option<ProviderError>>,
    revert: Mutex<bool>,
    pending_receipt_polls: AtomicU32,
    gate_reads: Mutex<bool>,
    gated_reads: Mutex<VecDeque<oneshot::Sender<String>>>,
    next_hash: AtomicU8,
    pub(crate) calls: Mutex<Vec<&'static str>>,
    pub(crate) sent: Mutex<Vec<TransactionRequest>>,
}

impl FakeProvider {
    pub(crate) fn new(initial: &str) -> Self {
        Self {
            stored: Mutex::new(initial.to_string()),
            accounts: Mutex::new(Ok(vec![ALICE])),
            read_error: Mutex::new(None),
            raw_call_output: Mutex::new(None),
            send_error: Mutex::new(None),
            revert: Mutex::new(false),
            pending_receipt_polls: AtomicU32::new(0),
            gate_reads: Mutex::new(false),
            gated_reads: Mutex::new(VecDeque::new()),
            next_hash: AtomicU8::new(1),
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub(crate) fn with_accounts(self, accounts: Result<Vec<Address>, ProviderError>) -> Self {
        *self.accounts.lock().unwrap() = accounts;
        self
    }

    pub(crate) fn set_accounts(&self, accounts: Result<Vec<Address>, ProviderError>) {
        *self.accounts.lock().unwrap() = accounts;
    }

    pub(crate) fn fail_reads(&self, err: Option<ProviderError>) {
        *self.read_error.lock().unwrap() = err;
    }

    pub(crate) fn with_raw_call_output(self, output: Vec<u8>) -> Self {
        *self.raw_call_output.lock().unwrap() = Some(output);
        self
    }

    pub(crate) fn fail_sends(&self, err: Option<ProviderError>) {
        *self.send_error.lock().unwrap() = err;
    }

    pub(crate) fn with_revert(self) -> Self {
        *self.revert.lock().unwrap() = true;
        self
    }

    pub(crate) fn with_pending_receipt_polls(self, polls: u32) -> Self {
        self.pending_receipt_polls.store(polls, Ordering::SeqCst);
        self
    }

    /// Reads block until the test releases them through `release_read`.
    pub(crate) fn with_gated_reads(self) -> Self {
        *self.gate_reads.lock().unwrap() = true;
        self
    }

    pub(crate) fn gated_read_count(&self) -> usize {
        self.gated_reads.lock().unwrap().len()
    }

    /// Answers the `index`-th still-waiting read (0 = oldest).
    pub(crate) fn release_read(&self, index: usize, value: &str) {
        let tx = self
            .gated_reads
            .lock()
            .unwrap()
            .remove(index)
            .expect("no gated read at index");
        let _ = tx.send(value.to_string());
    }

    pub(crate) fn stored(&self) -> String {
        self.stored.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|m| **m == method)
            .count()
    }

    fn record(&self, method: &'static str) {
        self.calls.lock().unwrap().push(method);
    }
}

#[async_trait]
impl WalletProvider for FakeProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.record("request_accounts");
        self.accounts.lock().unwrap().clone()
    }

    async fn call(&self, request: CallRequest) -> Result<Vec<u8>, ProviderError> {
        self.record("call");
        assert_eq!(request.to, CONTRACT);
        assert_eq!(request.data.0, abi::encode_get_message());
        if let Some(err) = self.read_error.lock().unwrap().clone() {
            return Err(err);
        }
        if let Some(raw) = self.raw_call_output.lock().unwrap().clone() {
            return Ok(raw);
        }

        let gated = *self.gate_reads.lock().unwrap();
        let value = if gated {
            let (tx, rx) = oneshot::channel();
            self.gated_reads.lock().unwrap().push_back(tx);
            rx.await
                .map_err(|_| ProviderError::Transport("gate dropped".into()))?
        } else {
            self.stored()
        };
        Ok(abi::encode_string(&value))
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<TxHash, ProviderError> {
        self.record("send_transaction");
        if let Some(err) = self.send_error.lock().unwrap().clone() {
            return Err(err);
        }
        assert_eq!(&request.data.0[..4], &abi::SET_MESSAGE_SELECTOR);
        let value = abi::decode_string(&request.data.0[4..])
            .map_err(|e| ProviderError::Rpc {
                code: -32602,
                message: e.to_string(),
            })?;
        if !*self.revert.lock().unwrap() {
            *self.stored.lock().unwrap() = value;
        }
        self.sent.lock().unwrap().push(request);
        Ok(TxHash([self.next_hash.fetch_add(1, Ordering::SeqCst); 32]))
    }

    async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, ProviderError> {
        self.record("transaction_receipt");
        let pending = self.pending_receipt_polls.load(Ordering::SeqCst);
        if pending > 0 {
            self.pending_receipt_polls.store(pending - 1, Ordering::SeqCst);
            return Ok(None);
        }
        let status = if *self.revert.lock().unwrap() { 0 } else { 1 };
        Ok(Some(TransactionReceipt {
            transaction_hash: tx_hash,
            block_number: Some(Quantity(42)),
            status: Some(Quantity(status)),
        }))
    }
}

use thiserror::Error;

/// Failures that end the wallet session. The user has to fix the environment
/// and reload; nothing here is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no wallet provider is available in this environment")]
    NoProviderAvailable,
    #[error("wallet authorization was denied")]
    AuthorizationDenied,
    #[error("wallet session is not connected")]
    NotConnected,
}

/// Failures of a single read or write. All of them are recoverable: the
/// controller surfaces them and hands control back to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("read failed: {0}")]
    ReadFailed(String),
    #[error("signer declined to authorize the transaction")]
    SigningRejected,
    #[error("transaction submission failed: {0}")]
    SubmissionFailed(String),
    #[error("transaction confirmation failed: {0}")]
    ConfirmationFailed(String),
    #[error("refusing to write an empty value")]
    EmptyPayload,
}

/// EIP-1193 style classification of wallet/provider failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("user rejected the request")]
    Rejected,
    #[error("requested account or method is not authorized")]
    Unauthorized,
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("transport error: {0}")]
    Transport(String),
}

impl ProviderError {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const DISCONNECTED: i64 = 4900;
    pub const CHAIN_DISCONNECTED: i64 = 4901;
    pub const METHOD_NOT_FOUND: i64 = -32601;

    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            Self::USER_REJECTED => Self::Rejected,
            Self::UNAUTHORIZED => Self::Unauthorized,
            Self::DISCONNECTED | Self::CHAIN_DISCONNECTED => Self::Unavailable(message),
            _ => Self::Rpc { code, message },
        }
    }

    pub fn is_method_not_found(&self) -> bool {
        matches!(self, Self::Rpc { code, .. } if *code == Self::METHOD_NOT_FOUND)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("empty return data (is a contract deployed at this address?)")]
    Empty,
    #[error("return data truncated: need {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },
    #[error("word does not fit in usize")]
    Overflow,
    #[error("string payload is not valid utf-8")]
    NotUtf8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseHexError {
    #[error("missing 0x prefix")]
    MissingPrefix,
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("invalid hex digits: {0}")]
    Digits(String),
}

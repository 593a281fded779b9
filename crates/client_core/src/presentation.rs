//! State to UI projection. Pure: the same state always renders the same view.

use shared::error::{LedgerError, SessionError};

use crate::controller::InteractionState;

pub const LABEL_SUBMIT: &str = "Update message";
pub const LABEL_SENDING: &str = "Sending...";
pub const LABEL_LOADING: &str = "Loading...";

/// What the display region shows. Errors are never carried as `Value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Display {
    Value(String),
    Error(String),
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub display: Display,
    pub button_label: &'static str,
    pub button_enabled: bool,
}

pub fn render(state: &InteractionState) -> View {
    match state {
        InteractionState::Idle => View {
            display: Display::Placeholder("Connecting to wallet...".to_string()),
            button_label: LABEL_LOADING,
            button_enabled: false,
        },
        InteractionState::Loading => View {
            display: Display::Placeholder("Loading message...".to_string()),
            button_label: LABEL_LOADING,
            button_enabled: false,
        },
        InteractionState::Ready(value) => View {
            display: Display::Value(value.clone()),
            button_label: LABEL_SUBMIT,
            button_enabled: true,
        },
        InteractionState::Submitting => View {
            display: Display::Placeholder("Waiting for the transaction...".to_string()),
            button_label: LABEL_SENDING,
            button_enabled: false,
        },
        InteractionState::Failed(err) => View {
            display: Display::Error(describe_ledger_error(err)),
            button_label: LABEL_SUBMIT,
            button_enabled: true,
        },
    }
}

pub fn describe_ledger_error(err: &LedgerError) -> String {
    match err {
        LedgerError::ReadFailed(cause) => format!("Could not load the message: {cause}"),
        LedgerError::SigningRejected => "The wallet did not authorize the transaction.".to_string(),
        LedgerError::SubmissionFailed(cause) => {
            format!("Error sending the message: {cause}")
        }
        LedgerError::ConfirmationFailed(cause) => {
            format!("The network did not apply the message: {cause}")
        }
        LedgerError::EmptyPayload => "Please enter a message.".to_string(),
    }
}

pub fn describe_session_error(err: &SessionError) -> String {
    match err {
        SessionError::NoProviderAvailable => {
            "Install a wallet such as MetaMask to interact with this app.".to_string()
        }
        SessionError::AuthorizationDenied => {
            "The wallet refused the connection. Approve it and reload.".to_string()
        }
        SessionError::NotConnected => "The wallet is not connected. Reload to retry.".to_string(),
    }
}

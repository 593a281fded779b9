//! Inputs to and outputs from the interaction reducer.

use shared::{
    domain::WriteReceipt,
    error::{LedgerError, SessionError},
};

use super::reducer::{ControllerError, InteractionState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    SessionStarted,
    ReadSucceeded(String),
    ReadFailed(LedgerError),
    SubmitRequested(String),
    WriteSucceeded(WriteReceipt),
    WriteFailed(LedgerError),
    RefreshRequested,
    Dismissed,
}

impl ControllerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionStarted => "session_started",
            Self::ReadSucceeded(_) => "read_succeeded",
            Self::ReadFailed(_) => "read_failed",
            Self::SubmitRequested(_) => "submit_requested",
            Self::WriteSucceeded(_) => "write_succeeded",
            Self::WriteFailed(_) => "write_failed",
            Self::RefreshRequested => "refresh_requested",
            Self::Dismissed => "dismissed",
        }
    }
}

/// Work the reducer asks its driver to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    IssueRead,
    IssueWrite(String),
}

/// Published by the driver for every accepted transition and every rejected
/// event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerUpdate {
    Transition {
        from: InteractionState,
        to: InteractionState,
    },
    Rejected(ControllerError),
    /// The wallet session is gone. This is the last update; the driver stops
    /// and the front end has to reconnect.
    SessionEnded(SessionError),
}

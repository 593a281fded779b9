//! The interaction state machine.
//!
//! `Idle -> Loading -> Ready(v) <-> Submitting -> Loading | Failed(e)`, with
//! `Failed` returning to `Ready` on the next user action. Every transition is
//! a single synchronous call to [`InteractionController::handle`]; the network
//! lives in the driver.

use std::fmt;

use shared::error::LedgerError;
use thiserror::Error;
use tracing::debug;

use super::events::{ControllerEvent, Effect};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Loading,
    Ready(String),
    Submitting,
    Failed(LedgerError),
}

impl InteractionState {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Loading => Phase::Loading,
            Self::Ready(_) => Phase::Ready,
            Self::Submitting => Phase::Submitting,
            Self::Failed(_) => Phase::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Submitting,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Submitting => "submitting",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("a write is already pending")]
    WritePending,
    #[error("cannot accept {event} while {phase}")]
    NotReady { event: &'static str, phase: Phase },
    #[error("unexpected {event} while {phase}")]
    UnexpectedEvent { event: &'static str, phase: Phase },
}

/// The in-flight submission. At most one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    pub value: String,
}

#[derive(Debug)]
pub struct InteractionController {
    state: InteractionState,
    last_good: Option<String>,
    pending: Option<PendingWrite>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            state: InteractionState::Idle,
            last_good: None,
            pending: None,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// The value the most recent successful read produced.
    pub fn last_good(&self) -> Option<&str> {
        self.last_good.as_deref()
    }

    pub fn pending_write(&self) -> Option<&PendingWrite> {
        self.pending.as_ref()
    }

    /// Applies one event. A rejected event leaves the controller untouched.
    pub fn handle(&mut self, event: ControllerEvent) -> Result<Effect, ControllerError> {
        let phase = self.state.phase();
        let name = event.name();
        let unexpected = ControllerError::UnexpectedEvent { event: name, phase };

        let effect = match event {
            ControllerEvent::SessionStarted => match phase {
                Phase::Idle => self.enter(InteractionState::Loading, Effect::IssueRead),
                _ => return Err(unexpected),
            },

            ControllerEvent::ReadSucceeded(value) => match phase {
                Phase::Loading | Phase::Ready => {
                    self.last_good = Some(value.clone());
                    self.enter(InteractionState::Ready(value), Effect::None)
                }
                // A read issued before the write landed late. It is still a
                // genuine snapshot, but the displayed state stays put.
                Phase::Submitting | Phase::Failed => {
                    debug!(%phase, "read landed outside loading; recorded as last known value");
                    self.last_good = Some(value);
                    Effect::None
                }
                Phase::Idle => return Err(unexpected),
            },

            ControllerEvent::ReadFailed(err) => match phase {
                Phase::Loading | Phase::Ready => {
                    self.enter(InteractionState::Failed(err), Effect::None)
                }
                Phase::Submitting | Phase::Failed => {
                    debug!(%phase, error = %err, "dropping read failure outside loading");
                    Effect::None
                }
                Phase::Idle => return Err(unexpected),
            },

            ControllerEvent::SubmitRequested(value) => {
                if self.pending.is_some() {
                    return Err(ControllerError::WritePending);
                }
                match phase {
                    Phase::Ready if value.is_empty() => self.enter(
                        InteractionState::Failed(LedgerError::EmptyPayload),
                        Effect::None,
                    ),
                    Phase::Ready => {
                        self.pending = Some(PendingWrite {
                            value: value.clone(),
                        });
                        self.enter(InteractionState::Submitting, Effect::IssueWrite(value))
                    }
                    Phase::Failed => self.recover(),
                    Phase::Idle | Phase::Loading | Phase::Submitting => {
                        return Err(ControllerError::NotReady { event: name, phase })
                    }
                }
            }

            ControllerEvent::WriteSucceeded(receipt) => match phase {
                Phase::Submitting => {
                    debug!(tx_hash = %receipt.tx_hash, "write settled; reconciling");
                    self.pending = None;
                    self.enter(InteractionState::Loading, Effect::IssueRead)
                }
                _ => return Err(unexpected),
            },

            ControllerEvent::WriteFailed(err) => match phase {
                Phase::Submitting => {
                    self.pending = None;
                    self.enter(InteractionState::Failed(err), Effect::None)
                }
                _ => return Err(unexpected),
            },

            ControllerEvent::RefreshRequested => match phase {
                Phase::Ready | Phase::Loading => Effect::IssueRead,
                Phase::Failed => self.recover(),
                Phase::Submitting => return Err(ControllerError::WritePending),
                Phase::Idle => return Err(ControllerError::NotReady { event: name, phase }),
            },

            ControllerEvent::Dismissed => match phase {
                Phase::Failed => self.recover(),
                _ => Effect::None,
            },
        };

        Ok(effect)
    }

    fn enter(&mut self, next: InteractionState, effect: Effect) -> Effect {
        self.state = next;
        effect
    }

    /// `Failed` back to the last good value; never a re-read unless no read
    /// has ever succeeded.
    fn recover(&mut self) -> Effect {
        match self.last_good.clone() {
            Some(value) => self.enter(InteractionState::Ready(value), Effect::None),
            None => self.enter(InteractionState::Loading, Effect::IssueRead),
        }
    }
}

#[cfg(test)]
#[path = "../tests/reducer_tests.rs"]
mod tests;

//! Event loop that owns the reducer and runs its effects.
//!
//! One event is applied at a time. Reads and writes run as spawned tasks and
//! post their outcome back into the loop, so a slow wallet prompt never blocks
//! event intake. Nothing in flight can be cancelled; overlapping reads settle
//! in arrival order.

use std::{sync::Arc, time::Duration};

use shared::{
    domain::WriteReceipt,
    error::{LedgerError, SessionError},
};
use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc, watch, Mutex},
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, error, info, warn};

use super::{
    events::{ControllerEvent, ControllerUpdate, Effect},
    reducer::{InteractionController, InteractionState},
};
use crate::{ledger_client::LedgerClient, wallet_session::WalletSession};

/// Shortest time the submitting state stays visible.
pub const DEFAULT_SUBMIT_FLOOR: Duration = Duration::from_millis(1000);

const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// What the loop applies next: a reducer event or the end of the session.
enum TaskOutcome {
    Event(ControllerEvent),
    /// The write could not be signed because the session is over.
    SessionEnded(SessionError),
}

enum WriteFailure {
    Ledger(LedgerError),
    SessionEnded(SessionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("interaction controller has shut down")]
pub struct HandleClosed;

/// Cloneable command surface for the front end.
#[derive(Clone)]
pub struct ControllerHandle {
    commands: mpsc::UnboundedSender<ControllerEvent>,
    state: watch::Receiver<InteractionState>,
    updates: broadcast::Sender<ControllerUpdate>,
}

impl ControllerHandle {
    pub fn submit(&self, value: impl Into<String>) -> Result<(), HandleClosed> {
        self.send(ControllerEvent::SubmitRequested(value.into()))
    }

    pub fn refresh(&self) -> Result<(), HandleClosed> {
        self.send(ControllerEvent::RefreshRequested)
    }

    pub fn dismiss(&self) -> Result<(), HandleClosed> {
        self.send(ControllerEvent::Dismissed)
    }

    pub fn current(&self) -> InteractionState {
        self.state.borrow().clone()
    }

    /// Latest-state stream for rendering.
    pub fn subscribe(&self) -> watch::Receiver<InteractionState> {
        self.state.clone()
    }

    /// Every transition and rejection, in order.
    pub fn updates(&self) -> broadcast::Receiver<ControllerUpdate> {
        self.updates.subscribe()
    }

    fn send(&self, event: ControllerEvent) -> Result<(), HandleClosed> {
        self.commands.send(event).map_err(|_| HandleClosed)
    }
}

pub struct InteractionDriver {
    controller: InteractionController,
    ledger: Arc<LedgerClient>,
    session: Arc<Mutex<WalletSession>>,
    submit_floor: Duration,
    commands: mpsc::UnboundedReceiver<ControllerEvent>,
    results_tx: mpsc::UnboundedSender<TaskOutcome>,
    results_rx: mpsc::UnboundedReceiver<TaskOutcome>,
    state_tx: watch::Sender<InteractionState>,
    updates: broadcast::Sender<ControllerUpdate>,
}

impl InteractionDriver {
    /// Requires a connected session; the loop never starts without one.
    pub fn new(
        session: WalletSession,
        ledger: LedgerClient,
        submit_floor: Duration,
    ) -> Result<(Self, ControllerHandle), SessionError> {
        session.active_identity()?;

        let controller = InteractionController::new();
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(controller.state().clone());
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        let handle = ControllerHandle {
            commands: commands_tx,
            state: state_rx,
            updates: updates.clone(),
        };
        let driver = Self {
            controller,
            ledger: Arc::new(ledger),
            session: Arc::new(Mutex::new(session)),
            submit_floor,
            commands,
            results_tx,
            results_rx,
            state_tx,
            updates,
        };
        Ok((driver, handle))
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until every [`ControllerHandle`] has been dropped or the wallet
    /// session ends.
    pub async fn run(mut self) {
        self.dispatch(ControllerEvent::SessionStarted);

        loop {
            let outcome = tokio::select! {
                biased;
                Some(outcome) = self.results_rx.recv() => outcome,
                command = self.commands.recv() => match command {
                    Some(event) => TaskOutcome::Event(event),
                    None => break,
                },
            };
            match outcome {
                TaskOutcome::Event(event) => self.dispatch(event),
                TaskOutcome::SessionEnded(cause) => {
                    self.end_session(cause);
                    break;
                }
            }
        }

        info!("interaction controller stopped");
    }

    /// Settles the pending write, then announces that no further write can
    /// be signed.
    fn end_session(&mut self, cause: SessionError) {
        error!(error = %cause, "wallet session ended");
        self.dispatch(ControllerEvent::WriteFailed(LedgerError::SigningRejected));
        let _ = self.updates.send(ControllerUpdate::SessionEnded(cause));
    }

    fn dispatch(&mut self, event: ControllerEvent) {
        let from = self.controller.state().clone();
        let name = event.name();

        match self.controller.handle(event) {
            Ok(effect) => {
                let to = self.controller.state().clone();
                if to != from {
                    debug!(event = name, from = %from.phase(), to = %to.phase(), "transition");
                    self.state_tx.send_replace(to.clone());
                    let _ = self.updates.send(ControllerUpdate::Transition { from, to });
                }
                self.execute(effect);
            }
            Err(err) => {
                warn!(event = name, error = %err, "event rejected");
                let _ = self.updates.send(ControllerUpdate::Rejected(err));
            }
        }
    }

    fn execute(&self, effect: Effect) {
        match effect {
            Effect::None => {}
            Effect::IssueRead => {
                let ledger = self.ledger.clone();
                let results = self.results_tx.clone();
                tokio::spawn(async move {
                    let event = match ledger.read_value().await {
                        Ok(value) => ControllerEvent::ReadSucceeded(value),
                        Err(err) => {
                            warn!(error = %err, "read failed");
                            ControllerEvent::ReadFailed(err)
                        }
                    };
                    let _ = results.send(TaskOutcome::Event(event));
                });
            }
            Effect::IssueWrite(value) => {
                let ledger = self.ledger.clone();
                let session = self.session.clone();
                let results = self.results_tx.clone();
                let floor = self.submit_floor;
                tokio::spawn(async move {
                    let started = Instant::now();
                    let outcome = write_with_current_identity(&session, &ledger, &value).await;

                    let remaining = floor.saturating_sub(started.elapsed());
                    if !remaining.is_zero() {
                        tokio::time::sleep(remaining).await;
                    }

                    let outcome = match outcome {
                        Ok(receipt) => TaskOutcome::Event(ControllerEvent::WriteSucceeded(receipt)),
                        Err(WriteFailure::Ledger(err)) => {
                            warn!(error = %err, "write failed");
                            TaskOutcome::Event(ControllerEvent::WriteFailed(err))
                        }
                        Err(WriteFailure::SessionEnded(cause)) => TaskOutcome::SessionEnded(cause),
                    };
                    let _ = results.send(outcome);
                });
            }
        }
    }
}

/// Re-confirms the active account, then writes as it. An unreachable wallet
/// fails only this write; a withdrawn authorization ends the session.
async fn write_with_current_identity(
    session: &Mutex<WalletSession>,
    ledger: &LedgerClient,
    value: &str,
) -> Result<WriteReceipt, WriteFailure> {
    if value.is_empty() {
        return Err(WriteFailure::Ledger(LedgerError::EmptyPayload));
    }
    let signer = session
        .lock()
        .await
        .refresh_identity()
        .await
        .map_err(|err| match err {
            SessionError::NoProviderAvailable => {
                WriteFailure::Ledger(LedgerError::SubmissionFailed(err.to_string()))
            }
            SessionError::AuthorizationDenied | SessionError::NotConnected => {
                WriteFailure::SessionEnded(err)
            }
        })?;
    ledger
        .write_value(value, signer)
        .await
        .map_err(WriteFailure::Ledger)
}

#[cfg(test)]
#[path = "../tests/orchestration_tests.rs"]
mod tests;

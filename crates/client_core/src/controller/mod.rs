//! Controller layer: events, the reducer that owns interaction state, and the
//! event loop that runs effects against the ledger.

pub mod events;
pub mod orchestration;
pub mod reducer;

pub use events::{ControllerEvent, ControllerUpdate, Effect};
pub use orchestration::{ControllerHandle, HandleClosed, InteractionDriver};
pub use reducer::{ControllerError, InteractionController, InteractionState, PendingWrite, Phase};

//! Drag/reorder controller
//!
//! A device-independent state machine. Pointer and keyboard drivers both
//! translate their input into [`DragEvent`]s and feed them to
//! [`DragController::handle`] together with the current [`BoardSession`].

mod controller;
mod session;
mod state;

pub use controller::{DragController, DragOutcome};
pub use session::BoardSession;
pub use state::{Cell, DragEvent, DragState, DropAction, DropIntent};

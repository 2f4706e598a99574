//! UI event types.
//!
//! Everything the reducer reacts to arrives as a `UiEvent`: terminal input,
//! the render tick, and results of async work sent back through the inbox.

use eventzen_core::identity::SessionUser;
use eventzen_core::location::{DetectedLocation, LocationFailure};

use crate::common::{TaskCompleted, TaskKind, TaskStarted};

#[derive(Debug)]
pub enum UiEvent {
    /// Periodic tick (spinner animation, render cadence).
    Tick,

    /// Raw terminal event (key, resize, paste).
    Terminal(crossterm::event::Event),

    /// An async task was spawned by the runtime.
    TaskStarted {
        kind: TaskKind,
        started: TaskStarted,
    },

    /// An async task finished. The inner event is applied only if the task
    /// is still the active attempt of its kind.
    TaskCompleted {
        kind: TaskKind,
        completed: TaskCompleted<Box<UiEvent>>,
    },

    /// Location detection finished.
    LocationResolved(Result<DetectedLocation, LocationFailure>),

    /// Sign-in attempt finished. Errors carry the user-facing message.
    SignInFinished {
        method: &'static str,
        result: Result<SessionUser, String>,
    },

    /// Gateway sign-out finished.
    SignedOut(Result<(), String>),
}

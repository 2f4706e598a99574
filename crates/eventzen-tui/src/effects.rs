//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent I/O and task spawning only; the reducer never performs
//! I/O itself.
//!
//! Task-spawning effects leave `task` as `None`. The reducer assigns a fresh
//! id before handing them to the runtime, so every attempt is distinguishable.

use eventzen_core::identity::SignInMethod;
use tokio_util::sync::CancellationToken;

use crate::common::{TaskId, TaskKind};

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Query the position and reverse-geocode it.
    DetectLocation { task: Option<TaskId> },

    /// Sign in through the identity gateway.
    SignIn {
        task: Option<TaskId>,
        method: SignInMethod,
    },

    /// Discard the gateway session.
    SignOut { task: Option<TaskId> },

    /// Cancel an in-progress task. The reducer fills `token` from the task
    /// state; the runtime calls `cancel()` on it.
    CancelTask {
        kind: TaskKind,
        token: Option<CancellationToken>,
    },
}

//! Application state composition.
//!
//! ```text
//! AppState
//! ├── shell: ShellState
//! │   ├── focus: Focus            (focused element of the main screen)
//! │   ├── search: SearchState     (query text)
//! │   ├── location: LocationState (detected place, last error)
//! │   ├── auth: AuthState         (session user)
//! │   ├── task_seq: TaskSeq       (async task id generator)
//! │   └── tasks: Tasks            (task lifecycle state)
//! └── overlay: Option<Overlay>    (login dialog, alert)
//! ```
//!
//! State is split between `ShellState` and `Option<Overlay>` so overlay
//! handlers can hold `&mut Overlay` and `&ShellState` at the same time. The
//! credentials draft lives inside the login overlay and is dropped with it.

use crate::auth::AuthState;
use crate::common::{TaskSeq, Tasks};
use crate::location::LocationState;
use crate::nav::Focus;
use crate::overlays::Overlay;
use crate::search::SearchState;

#[derive(Debug, Default)]
pub struct AppState {
    pub shell: ShellState,
    pub overlay: Option<Overlay>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Shell state (everything except the active overlay).
#[derive(Debug, Default)]
pub struct ShellState {
    /// Flag indicating the app should quit.
    pub should_quit: bool,
    pub focus: Focus,
    pub search: SearchState,
    pub location: LocationState,
    pub auth: AuthState,
    /// Task id sequence for async operations.
    pub task_seq: TaskSeq,
    /// Task lifecycle state for async operations.
    pub tasks: Tasks,
    /// Spinner animation frame counter.
    pub spinner_frame: usize,
}

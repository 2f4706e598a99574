//! Effect handlers for the shell runtime.
//!
//! Handlers are pure async functions that perform I/O and return a `UiEvent`.
//! They never touch state; the runtime spawns them and forwards the result
//! to the inbox.
//!
//! ```ignore
//! // Handler: pure async, returns UiEvent
//! pub async fn detect_location(g: &G, r: &R) -> UiEvent { ... }
//!
//! // Runtime: spawns and sends to inbox
//! self.spawn_task(TaskKind::DetectLocation, id, false, move |_| async move { ... });
//! ```

pub mod auth;
pub mod location;

pub use auth::*;
pub use location::*;

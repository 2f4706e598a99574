//! Overlay modules for the shell.
//!
//! Overlays are modal UI components that temporarily take over keyboard input.
//! Each overlay owns its state, key handler and render function.
//!
//! - `login.rs`: login dialog (federated providers, email/password form)
//! - `alert.rs`: modal message box (search acknowledgment)
//! - `render_utils.rs`: shared rendering helpers

pub mod alert;
pub mod login;
pub mod render_utils;

pub use alert::AlertState;
use crossterm::event::KeyEvent;
pub use login::{LoginField, LoginState};
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::effects::UiEffect;
use crate::state::ShellState;

/// Transition returned by overlay key handlers.
#[derive(Debug)]
pub enum OverlayTransition {
    Stay,
    Close,
}

/// Update returned by overlay key handlers.
#[derive(Debug)]
pub struct OverlayUpdate {
    pub transition: OverlayTransition,
    pub effects: Vec<UiEffect>,
}

impl OverlayUpdate {
    fn new(transition: OverlayTransition) -> Self {
        Self {
            transition,
            effects: Vec::new(),
        }
    }

    pub fn stay() -> Self {
        Self::new(OverlayTransition::Stay)
    }

    pub fn close() -> Self {
        Self::new(OverlayTransition::Close)
    }

    #[must_use]
    pub fn with_ui_effects(mut self, effects: Vec<UiEffect>) -> Self {
        self.effects = effects;
        self
    }
}

#[derive(Debug)]
pub enum Overlay {
    Login(LoginState),
    Alert(AlertState),
}

impl Overlay {
    pub fn render(&self, frame: &mut Frame, area: Rect, shell: &ShellState) {
        match self {
            Overlay::Login(l) => l.render(frame, area, shell),
            Overlay::Alert(a) => a.render(frame, area),
        }
    }

    pub fn handle_key(&mut self, shell: &ShellState, key: KeyEvent) -> OverlayUpdate {
        match self {
            Overlay::Login(l) => l.handle_key(shell, key),
            Overlay::Alert(a) => a.handle_key(key),
        }
    }

    pub fn as_login_mut(&mut self) -> Option<&mut LoginState> {
        match self {
            Overlay::Login(l) => Some(l),
            Overlay::Alert(_) => None,
        }
    }
}

/// Extension trait for `Option<Overlay>` providing convenience render helpers.
pub trait OverlayExt {
    /// Renders the overlay if one is active.
    fn render(&self, frame: &mut Frame, area: Rect, shell: &ShellState);
}

impl OverlayExt for Option<Overlay> {
    fn render(&self, frame: &mut Frame, area: Rect, shell: &ShellState) {
        if let Some(overlay) = self {
            overlay.render(frame, area, shell);
        }
    }
}

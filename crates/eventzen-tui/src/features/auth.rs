//! Auth feature: session identity, sign-in results and logout.

use eventzen_core::identity::SessionUser;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use tracing::{info, warn};

use crate::effects::UiEffect;
use crate::features::nav::button_style;

#[derive(Debug, Default, Clone)]
pub struct AuthState {
    pub user: Option<SessionUser>,
}

impl AuthState {
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn account_label(&self) -> &'static str {
        if self.is_signed_in() { "Logout" } else { "Login" }
    }
}

/// What the login dialog should do after a sign-in result.
#[derive(Debug, PartialEq, Eq)]
pub enum LoginOverlayAction {
    Close,
    ShowError(String),
}

pub fn handle_sign_in_result(
    auth: &mut AuthState,
    method: &str,
    result: Result<SessionUser, String>,
) -> LoginOverlayAction {
    match result {
        Ok(user) => {
            info!(method, user = user.label(), "session started");
            auth.user = Some(user);
            LoginOverlayAction::Close
        }
        Err(message) => {
            warn!(method, "Error signing in: {message}");
            LoginOverlayAction::ShowError(message)
        }
    }
}

/// Clears the session right away; the gateway call runs afterwards and its
/// outcome does not restore the session.
pub fn begin_logout(auth: &mut AuthState) -> Vec<UiEffect> {
    if let Some(user) = auth.user.take() {
        info!(user = user.label(), "logging out");
    }
    vec![UiEffect::SignOut { task: None }]
}

pub fn handle_signed_out(result: Result<(), String>) {
    match result {
        Ok(()) => info!("signed out"),
        Err(message) => warn!("Error signing out: {message}"),
    }
}

/// Renders the title bar: app name, signed-in identity and the account button.
pub fn render_title_bar(frame: &mut Frame, area: Rect, auth: &AuthState, account_focused: bool) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(" EventZen ", Style::default().fg(Color::Cyan)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut spans = Vec::new();
    if let Some(user) = &auth.user {
        spans.push(Span::styled(
            format!("{} ", user.label()),
            Style::default().fg(Color::Gray),
        ));
    }
    spans.push(Span::styled(
        format!(" {} ", auth.account_label()),
        button_style(account_focused, Color::Cyan),
    ));
    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Right),
        inner,
    );
}

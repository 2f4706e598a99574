//! Pure view functions for the shell.
//!
//! Functions here take `&AppState`, draw to a ratatui `Frame`, and never
//! mutate state or return effects.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::auth;
use crate::common::TaskKind;
use crate::common::text::truncate_with_ellipsis;
use crate::location::{LocationView, render_location};
use crate::nav::{Focus, render_nav};
use crate::overlays::OverlayExt;
use crate::search::render_search;
use crate::state::{AppState, ShellState};

/// Spinner frames for pending tasks.
const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

const TITLE_HEIGHT: u16 = 3;
const NAV_HEIGHT: u16 = 3;
const HINTS_HEIGHT: u16 = 1;

/// Width of the account area in the title bar.
const ACCOUNT_WIDTH: u16 = 36;

pub fn spinner(frame: usize) -> &'static str {
    SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
}

/// Renders the entire shell to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();
    let shell = &app.shell;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(TITLE_HEIGHT),
            Constraint::Length(NAV_HEIGHT),
            Constraint::Min(4),
            Constraint::Length(HINTS_HEIGHT),
        ])
        .split(area);

    let title = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(ACCOUNT_WIDTH)])
        .split(rows[0]);
    render_search(
        frame,
        title[0],
        &shell.search,
        shell.focus == Focus::Search && app.overlay.is_none(),
    );
    auth::render_title_bar(frame, title[1], &shell.auth, shell.focus == Focus::Account);

    render_nav(frame, rows[1], shell.focus);

    let detecting = shell.tasks.state(TaskKind::DetectLocation).is_running();
    render_location(
        frame,
        rows[2],
        &LocationView {
            state: &shell.location,
            focused: shell.focus == Focus::DetectLocation,
            spinner: detecting.then(|| spinner(shell.spinner_frame)),
        },
    );

    render_hints(frame, rows[3], shell);

    app.overlay.render(frame, area, shell);
}

fn render_hints(frame: &mut Frame, area: Rect, shell: &ShellState) {
    let quit = if shell.focus == Focus::Search {
        "Ctrl+C quit"
    } else {
        "q quit"
    };
    let text = format!(
        "Tab/Shift+Tab move • Enter {} • {quit}",
        action_label(shell)
    );
    let line = Line::from(Span::styled(
        truncate_with_ellipsis(&text, area.width as usize),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

fn action_label(shell: &ShellState) -> &'static str {
    match shell.focus {
        Focus::Search => "search",
        Focus::Account => {
            if shell.auth.is_signed_in() {
                "logout"
            } else {
                "login"
            }
        }
        Focus::DetectLocation => "detect location",
        Focus::Category(_) | Focus::GiftCards | Focus::Offers => "open",
    }
}

#[cfg(test)]
mod tests {
    use eventzen_core::location::DetectedLocation;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::overlays::{AlertState, LoginState, Overlay};

    fn draw(app: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_renders_shell_layout() {
        let screen = draw(&AppState::new());
        assert!(screen.contains("EventZen"));
        assert!(screen.contains("Login"));
        assert!(screen.contains("Business"));
        assert!(screen.contains("Gift Cards"));
        assert!(screen.contains("Detect Location"));
        assert!(screen.contains("Location not detected yet."));
    }

    #[test]
    fn test_renders_location_and_error() {
        let mut app = AppState::new();
        app.shell.location.detected = Some(DetectedLocation {
            city: "Springfield".into(),
            state: Some("IL".into()),
            country: None,
        });
        app.shell.location.error = Some("Unable to retrieve location.".into());
        let screen = draw(&app);
        assert!(screen.contains("Your location: Springfield, IL"));
        assert!(screen.contains("Unable to retrieve location."));
    }

    #[test]
    fn test_renders_overlays() {
        let mut app = AppState::new();
        app.overlay = Some(Overlay::Login(LoginState::open()));
        let screen = draw(&app);
        assert!(screen.contains("Login with Google"));
        assert!(screen.contains("Login with Apple"));
        assert!(screen.contains("Login with Email"));

        app.overlay = Some(Overlay::Alert(AlertState::new(
            "Search",
            "You searched for: jazz",
        )));
        assert!(draw(&app).contains("You searched for: jazz"));
    }

    #[test]
    fn test_spinner_cycles() {
        assert_eq!(spinner(0), spinner(SPINNER_FRAMES.len()));
    }

    #[test]
    fn test_password_is_masked() {
        let mut app = AppState::new();
        let mut login = LoginState::open();
        login.password = "hunter2".into();
        app.overlay = Some(Overlay::Login(login));
        let screen = draw(&app);
        assert!(!screen.contains("hunter2"));
        assert!(screen.contains("•••••••"));
    }
}

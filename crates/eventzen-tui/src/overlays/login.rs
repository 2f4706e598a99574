//! Login dialog: federated providers plus an email/password form.
//!
//! The dialog owns the credentials draft. Closing it drops the draft and
//! cancels any sign-in still waiting on the browser.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use eventzen_core::identity::{FederatedProvider, SignInMethod};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::OverlayUpdate;
use super::render_utils::{
    FieldLine, InputHint, OverlayConfig, render_field_line, render_overlay, render_separator,
};
use crate::common::TaskKind;
use crate::effects::UiEffect;
use crate::features::nav::button_style;
use crate::render::spinner;
use crate::state::ShellState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Google,
    Apple,
    Email,
    Password,
    Submit,
    Close,
}

const FIELD_RING: &[LoginField] = &[
    LoginField::Google,
    LoginField::Apple,
    LoginField::Email,
    LoginField::Password,
    LoginField::Submit,
    LoginField::Close,
];

impl LoginField {
    fn step(self, forward: bool) -> Self {
        let len = FIELD_RING.len();
        let pos = FIELD_RING.iter().position(|f| *f == self).unwrap_or(0);
        let next = if forward { pos + 1 } else { pos + len - 1 };
        FIELD_RING[next % len]
    }

    fn is_text(self) -> bool {
        matches!(self, LoginField::Email | LoginField::Password)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginState {
    pub focus: LoginField,
    pub email: String,
    pub password: String,
    /// Last sign-in failure, shown under the form.
    pub error: Option<String>,
}

impl LoginState {
    pub fn open() -> Self {
        Self::default()
    }

    /// Builds the sign-in request for the focused control, if it submits one.
    fn submission(&mut self) -> Option<SignInMethod> {
        match self.focus {
            LoginField::Google => Some(SignInMethod::Federated(FederatedProvider::Google)),
            LoginField::Apple => Some(SignInMethod::Federated(FederatedProvider::Apple)),
            LoginField::Password | LoginField::Submit => {
                let email = self.email.trim();
                if email.is_empty() || self.password.is_empty() {
                    self.error = Some("Enter your email and password.".to_string());
                    return None;
                }
                Some(SignInMethod::EmailPassword {
                    email: email.to_string(),
                    password: self.password.clone(),
                })
            }
            LoginField::Email | LoginField::Close => None,
        }
    }

    pub fn handle_key(&mut self, shell: &ShellState, key: KeyEvent) -> OverlayUpdate {
        let signing_in = shell.tasks.state(TaskKind::SignIn).is_running();
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => close_dialog(),
            KeyCode::Tab | KeyCode::Down => {
                self.focus = self.focus.step(true);
                OverlayUpdate::stay()
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = self.focus.step(false);
                OverlayUpdate::stay()
            }
            KeyCode::Enter => match self.focus {
                LoginField::Close => close_dialog(),
                LoginField::Email => {
                    self.focus = LoginField::Password;
                    OverlayUpdate::stay()
                }
                _ if signing_in => OverlayUpdate::stay(),
                _ => match self.submission() {
                    Some(method) => {
                        self.error = None;
                        OverlayUpdate::stay()
                            .with_ui_effects(vec![UiEffect::SignIn { task: None, method }])
                    }
                    None => OverlayUpdate::stay(),
                },
            },
            KeyCode::Backspace if self.focus.is_text() => {
                self.field_mut().pop();
                OverlayUpdate::stay()
            }
            KeyCode::Char(c) if self.focus.is_text() && !ctrl => {
                self.field_mut().push(c);
                self.error = None;
                OverlayUpdate::stay()
            }
            _ => OverlayUpdate::stay(),
        }
    }

    /// Inserts pasted text into the focused text field.
    pub fn paste(&mut self, text: &str) {
        if self.focus.is_text() {
            self.field_mut().push_str(text);
            self.error = None;
        }
    }

    fn field_mut(&mut self) -> &mut String {
        if self.focus == LoginField::Password {
            &mut self.password
        } else {
            &mut self.email
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, shell: &ShellState) {
        let hints = [
            InputHint::new("Tab", "next"),
            InputHint::new("Enter", "select"),
            InputHint::new("Esc", "close"),
        ];
        let layout = render_overlay(
            frame,
            area,
            area.height,
            &OverlayConfig {
                title: "Login",
                border_color: Color::Cyan,
                width: 56,
                height: 13,
                hints: &hints,
            },
        );
        let body = Rect::new(
            layout.body.x + 1,
            layout.body.y,
            layout.body.width.saturating_sub(2),
            layout.body.height,
        );
        let row = |offset: u16| Rect::new(body.x, body.y + offset, body.width, 1);

        let providers = Line::from(vec![
            Span::styled(
                " Login with Google ",
                button_style(self.focus == LoginField::Google, Color::Cyan),
            ),
            Span::raw("  "),
            Span::styled(
                " Login with Apple ",
                button_style(self.focus == LoginField::Apple, Color::Cyan),
            ),
        ]);
        frame.render_widget(Paragraph::new(providers), row(0));
        render_separator(frame, body, 1);

        render_field_line(
            frame,
            row(2),
            &FieldLine {
                label: "Email",
                value: &self.email,
                placeholder: "you@example.com",
                masked: false,
                focused: self.focus == LoginField::Email,
                accent: Color::Yellow,
            },
        );
        render_field_line(
            frame,
            row(3),
            &FieldLine {
                label: "Password",
                value: &self.password,
                placeholder: "password",
                masked: true,
                focused: self.focus == LoginField::Password,
                accent: Color::Yellow,
            },
        );

        let actions = Line::from(vec![
            Span::styled(
                " Login with Email ",
                button_style(self.focus == LoginField::Submit, Color::Green),
            ),
            Span::raw("  "),
            Span::styled(
                " Close ",
                button_style(self.focus == LoginField::Close, Color::Gray),
            ),
        ]);
        frame.render_widget(Paragraph::new(actions), row(5));
        render_separator(frame, body, 6);

        let status = if shell.tasks.state(TaskKind::SignIn).is_running() {
            Line::from(Span::styled(
                format!("{} Signing in...", spinner(shell.spinner_frame)),
                Style::default().fg(Color::Yellow),
            ))
        } else if let Some(error) = &self.error {
            Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red)))
        } else {
            Line::default()
        };
        frame.render_widget(Paragraph::new(status), row(7));
    }
}

fn close_dialog() -> OverlayUpdate {
    OverlayUpdate::close().with_ui_effects(vec![UiEffect::CancelTask {
        kind: TaskKind::SignIn,
        token: None,
    }])
}

//! Modal message box.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Wrap};

use super::OverlayUpdate;
use super::render_utils::{InputHint, OverlayConfig, render_overlay};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertState {
    pub title: String,
    pub message: String,
}

impl AlertState {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let hints = [InputHint::new("Enter", "ok")];
        let width = (self.message.chars().count() as u16 + 6).clamp(30, 70);
        let layout = render_overlay(
            frame,
            area,
            area.height,
            &OverlayConfig {
                title: &self.title,
                border_color: Color::Yellow,
                width,
                height: 6,
                hints: &hints,
            },
        );
        let body = Rect::new(
            layout.body.x + 1,
            layout.body.y + 1,
            layout.body.width.saturating_sub(2),
            layout.body.height.saturating_sub(1),
        );
        frame.render_widget(
            Paragraph::new(Line::from(self.message.as_str())).wrap(Wrap { trim: true }),
            body,
        );
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> OverlayUpdate {
        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => OverlayUpdate::close(),
            _ => OverlayUpdate::stay(),
        }
    }
}

//! Search feature: query editing and the placeholder acknowledgment.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::common::truncate_start_with_ellipsis;

const PLACEHOLDER: &str = "Search events...";

#[derive(Debug, Default, Clone)]
pub struct SearchState {
    pub query: String,
}

/// Outcome of a key routed to the focused search field.
#[derive(Debug, PartialEq, Eq)]
pub enum SearchAction {
    Edited,
    Submit(String),
    Ignored,
}

pub fn handle_search_key(search: &mut SearchState, key: KeyEvent) -> SearchAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => SearchAction::Submit(acknowledgment(&search.query)),
        KeyCode::Backspace => {
            search.query.pop();
            SearchAction::Edited
        }
        KeyCode::Char('u') if ctrl => {
            search.query.clear();
            SearchAction::Edited
        }
        KeyCode::Char(c) if !ctrl => {
            search.query.push(c);
            SearchAction::Edited
        }
        _ => SearchAction::Ignored,
    }
}

/// Text shown when a search is triggered. No search backend exists.
pub fn acknowledgment(query: &str) -> String {
    format!("You searched for: {query}")
}

pub fn render_search(frame: &mut Frame, area: Rect, search: &SearchState, focused: bool) {
    let border = if focused { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(" Search ");

    let max_width = area.width.saturating_sub(3) as usize;
    let mut spans = Vec::new();
    if search.query.is_empty() {
        if focused {
            spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
        }
        spans.push(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)));
    } else {
        spans.push(Span::raw(truncate_start_with_ellipsis(
            &search.query,
            max_width,
        )));
        if focused {
            spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_edits_query() {
        let mut search = SearchState::default();
        for c in "jazz".chars() {
            assert_eq!(
                handle_search_key(&mut search, key(KeyCode::Char(c))),
                SearchAction::Edited
            );
        }
        handle_search_key(&mut search, key(KeyCode::Backspace));
        assert_eq!(search.query, "jaz");
    }

    #[test]
    fn test_ctrl_u_clears_query() {
        let mut search = SearchState {
            query: "concerts".into(),
        };
        handle_search_key(
            &mut search,
            KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL),
        );
        assert!(search.query.is_empty());
    }

    #[test]
    fn test_enter_submits_acknowledgment() {
        let mut search = SearchState {
            query: "concerts".into(),
        };
        assert_eq!(
            handle_search_key(&mut search, key(KeyCode::Enter)),
            SearchAction::Submit("You searched for: concerts".into())
        );
        assert_eq!(search.query, "concerts");
    }
}

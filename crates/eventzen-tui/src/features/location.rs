//! Location feature: detection results and the location/error display.

use eventzen_core::location::{DetectedLocation, LocationFailure};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use tracing::debug;

use crate::features::nav::button_style;

#[derive(Debug, Default, Clone)]
pub struct LocationState {
    /// Last successful detection. Only a fresh success replaces it.
    pub detected: Option<DetectedLocation>,
    /// Message from the most recent failed attempt.
    pub error: Option<String>,
}

pub fn handle_location_result(
    location: &mut LocationState,
    result: Result<DetectedLocation, LocationFailure>,
) {
    match result {
        Ok(detected) => {
            debug!(location = %detected, "location applied");
            location.detected = Some(detected);
            location.error = None;
        }
        Err(failure) => {
            location.error = Some(failure.message().to_string());
        }
    }
}

/// `Your location: City, ST`
pub fn location_line(detected: &DetectedLocation) -> String {
    format!("Your location: {detected}")
}

pub struct LocationView<'a> {
    pub state: &'a LocationState,
    pub focused: bool,
    pub spinner: Option<&'a str>,
}

pub fn render_location(frame: &mut Frame, area: Rect, view: &LocationView<'_>) {
    let mut lines = Vec::new();

    let mut button = vec![Span::styled(
        " Detect Location ",
        button_style(view.focused, Color::Green),
    )];
    if let Some(spinner) = view.spinner {
        button.push(Span::styled(
            format!("  {spinner} Detecting..."),
            Style::default().fg(Color::Yellow),
        ));
    }
    lines.push(Line::from(button));
    lines.push(Line::default());

    match &view.state.detected {
        Some(detected) => lines.push(Line::from(Span::styled(
            location_line(detected),
            Style::default().add_modifier(Modifier::BOLD),
        ))),
        None => lines.push(Line::from(Span::styled(
            "Location not detected yet.",
            Style::default().fg(Color::DarkGray),
        ))),
    }

    if let Some(error) = &view.state.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Location ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

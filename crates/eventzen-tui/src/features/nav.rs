//! Navigation feature: focus ring across the shell and the category row.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use tracing::info;

/// Event categories shown in the navigation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Business,
    Social,
    Community,
    Virtual,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Business,
            Category::Social,
            Category::Community,
            Category::Virtual,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Business => "Business",
            Category::Social => "Social",
            Category::Community => "Community",
            Category::Virtual => "Virtual",
        }
    }
}

/// Focusable elements of the main screen, in Tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Focus {
    #[default]
    Search,
    Account,
    Category(Category),
    DetectLocation,
    GiftCards,
    Offers,
}

const FOCUS_RING: &[Focus] = &[
    Focus::Search,
    Focus::Account,
    Focus::Category(Category::Business),
    Focus::Category(Category::Social),
    Focus::Category(Category::Community),
    Focus::Category(Category::Virtual),
    Focus::DetectLocation,
    Focus::GiftCards,
    Focus::Offers,
];

impl Focus {
    fn position(self) -> usize {
        FOCUS_RING.iter().position(|f| *f == self).unwrap_or(0)
    }

    #[must_use]
    pub fn next(self) -> Self {
        FOCUS_RING[(self.position() + 1) % FOCUS_RING.len()]
    }

    #[must_use]
    pub fn prev(self) -> Self {
        let len = FOCUS_RING.len();
        FOCUS_RING[(self.position() + len - 1) % len]
    }
}

/// Static navigation actions have no backend; the selection is only logged.
pub fn activate_static(focus: Focus) {
    match focus {
        Focus::Category(category) => info!(category = category.label(), "category selected"),
        Focus::GiftCards => info!("gift cards selected"),
        Focus::Offers => info!("offers selected"),
        Focus::Search | Focus::Account | Focus::DetectLocation => {}
    }
}

/// Style for a button-like span.
pub fn button_style(focused: bool, accent: Color) -> Style {
    if focused {
        Style::default()
            .fg(Color::Black)
            .bg(accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(accent)
    }
}

/// Renders the category row with the Gift Cards / Offers actions.
pub fn render_nav(frame: &mut Frame, area: Rect, focus: Focus) {
    let mut spans = Vec::new();
    for category in Category::all() {
        let focused = focus == Focus::Category(*category);
        spans.push(Span::styled(
            format!(" {} ", category.label()),
            button_style(focused, Color::Cyan),
        ));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(
        " Gift Cards ",
        button_style(focus == Focus::GiftCards, Color::Magenta),
    ));
    spans.push(Span::raw(" "));
    spans.push(Span::styled(
        " Offers ",
        button_style(focus == Focus::Offers, Color::Magenta),
    ));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Categories ");
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

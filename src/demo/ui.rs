//! Sign-up screen rendering

use super::app::DemoApp;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const FIELD_HEIGHT: u16 = 4;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &DemoApp) {
    let area = frame.area();
    let mut constraints = vec![Constraint::Length(FIELD_HEIGHT); app.fields().len()];
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(1));

    let editing = app.fields().get(app.active()).map_or("", |f| f.id.as_str());
    let block = Block::default()
        .title(format!(" Sign up: {editing} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(inner);

    // Widgets are cached per field, only re-built when the field changed
    for (field, chunk) in app.fields().iter().zip(chunks.iter()) {
        if let Some(widget) = field.widget() {
            frame.render_widget(widget.clone(), *chunk);
        }
    }

    draw_status_bar(frame, chunks[chunks.len() - 1], app);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &DemoApp) {
    let mut spans = vec![Span::styled(
        " Tab/Shift+Tab: Move  Enter: Submit  F5: Reset  Esc: Quit ",
        Style::default().fg(Color::DarkGray),
    )];

    let counts = app
        .fields()
        .iter()
        .map(|f| format!("{} {}", f.id, f.renders))
        .collect::<Vec<_>>()
        .join(" ");
    spans.push(Span::raw(" | renders: "));
    spans.push(Span::styled(counts, Style::default().fg(Color::Green)));

    if let Some(status) = app.status() {
        let color = if status.starts_with("Error") {
            Color::Red
        } else {
            Color::Yellow
        };
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(status.to_string(), Style::default().fg(color)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

//! Text input bound to one form field

use form_ctrl::binding::{ControlledChildProps, ControlledFieldView, FieldCallback};
use form_ctrl::ctrl::{BlurEvent, ChangeEvent, MessageKind};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Props the screen hands to every input
#[derive(Debug, Clone, Copy)]
pub struct InputProps {
    pub label: &'static str,
    pub active: bool,
    /// Show bullets instead of the value
    pub masked: bool,
}

/// Output of one render pass: the widget plus the callbacks the screen fires on key input
pub struct RenderedInput {
    pub widget: Paragraph<'static>,
    pub on_change: FieldCallback<ChangeEvent>,
    pub on_blur: FieldCallback<BlurEvent>,
}

pub struct TextInput;

impl ControlledFieldView for TextInput {
    type Rest = InputProps;
    type Output = RenderedInput;

    fn view(&self, props: ControlledChildProps<InputProps>) -> RenderedInput {
        let required = props.required();
        let ControlledChildProps { base, data } = props;
        let InputProps {
            label,
            active,
            masked,
        } = base.rest;
        let data = data.unwrap_or_default();

        let has_error = data.error && (data.touched || data.dirty);
        let border_style = if active {
            Style::default().fg(Color::Cyan)
        } else if has_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let value_style = if active {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let value = data.display_value();
        let shown = if masked {
            "•".repeat(value.chars().count())
        } else {
            value
        };
        let shown = if shown.is_empty() && !active {
            "(empty)".to_string()
        } else {
            shown
        };
        let cursor = if active { "▌" } else { "" };

        let mut lines = vec![Line::from(vec![
            Span::styled(shown, value_style),
            Span::styled(cursor, Style::default().fg(Color::Cyan)),
        ])];
        for message in &data.messages {
            let color = match message.kind {
                MessageKind::Error => Color::Red,
                MessageKind::Warning => Color::Yellow,
                MessageKind::Info => Color::Blue,
            };
            lines.push(Line::from(Span::styled(
                message.text.clone(),
                Style::default().fg(color).add_modifier(Modifier::ITALIC),
            )));
        }

        let title = if required {
            format!(" {label} * ")
        } else {
            format!(" {label} ")
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style);

        RenderedInput {
            widget: Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .block(block),
            on_change: base.on_change,
            on_blur: base.on_blur,
        }
    }
}

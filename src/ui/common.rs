//! Common UI components.
//!
//! This module contains the header bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;

/// Format a reading for display.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Render the header bar.
///
/// Displays: topic, point count, latest value, min/max.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let (indicator_style, indicator) = if app.source_error().is_some() {
        (Style::default().fg(app.theme.error), "●")
    } else if app.series.is_empty() {
        (dim, "○")
    } else {
        (Style::default().fg(app.theme.highlight), "●")
    };

    let mut spans = vec![
        Span::styled(format!(" {} ", indicator), indicator_style),
        Span::styled("SENSORWATCH ", bold),
        Span::raw("│ "),
        Span::styled(app.topic().to_string(), Style::default().fg(app.theme.highlight)),
        Span::raw(" │ "),
        Span::styled(format!("{}", app.series.len()), bold),
        Span::raw(" points"),
    ];

    if let Some((_, latest)) = app.series.latest() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::raw(format!("{}: ", app.field())));
        spans.push(Span::styled(format_value(latest), bold));
    }

    if let Some((lo, hi)) = app.series.bounds() {
        spans.push(Span::raw(format!(
            " │ min {} max {}",
            format_value(lo),
            format_value(hi)
        )));
    }

    if app.rejected_count > 0 {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            format!("{} dropped", app.rejected_count),
            Style::default().fg(app.theme.warning),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the status bar at the bottom.
///
/// Shows: source, time since last reading, available controls.
/// Also displays temporary status messages and errors.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(err) = app.source_error() {
        let status = format!(" {} | Error: {} | q:quit", app.source_description(), err);
        let paragraph = Paragraph::new(status).style(Style::default().fg(app.theme.error));
        frame.render_widget(paragraph, area);
        return;
    }

    let updated = match app.last_updated {
        Some(at) => format!("Updated {:.1}s ago", at.elapsed().as_secs_f64()),
        None => "Waiting for data".to_string(),
    };

    let mut status = format!(" {} | {}", app.source_description(), updated);
    if let Some(ref rejection) = app.last_rejection {
        status.push_str(&format!(" | Last drop: {}", rejection));
    }
    status.push_str(" | e:export ?:help q:quit");

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the chart.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from("  e         Export series to JSON"),
        Line::from("  ?         Toggle this help"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 40u16.min(area.width.saturating_sub(4));
    let help_height = 9u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

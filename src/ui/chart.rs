//! Line chart of the accumulated series.
//!
//! X axis: reading labels `1..N`. Y axis: reading values.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::Series;

/// Minimum visible span of the Y axis, so a flat series still has height.
const MIN_Y_SPAN: f64 = 1.0;

/// Fraction of the value range added above and below the data.
const Y_PADDING: f64 = 0.1;

/// X axis bounds: first to last retained label, at least one unit wide.
pub fn x_bounds(series: &Series) -> [f64; 2] {
    match (series.labels().front(), series.labels().back()) {
        (Some(&first), Some(&last)) => {
            let first = first as f64;
            let last = (last as f64).max(first + 1.0);
            [first, last]
        }
        _ => [0.0, 1.0],
    }
}

/// Y axis bounds: value range padded on both sides.
pub fn y_bounds(series: &Series) -> [f64; 2] {
    let Some((lo, hi)) = series.bounds() else {
        return [0.0, 1.0];
    };

    let span = (hi - lo).max(MIN_Y_SPAN);
    let mid = (hi + lo) / 2.0;
    let half = span * (0.5 + Y_PADDING);
    [mid - half, mid + half]
}

/// Render the chart, or a waiting message while the series is empty.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(format!(" {} ", app.title), app.theme.header))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if app.series.is_empty() {
        let paragraph = Paragraph::new(format!("Waiting for readings on {} ...", app.topic()))
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let points = app.series.points();
    let [x_min, x_max] = x_bounds(&app.series);
    let [y_min, y_max] = y_bounds(&app.series);

    let dataset = Dataset::default()
        .name(app.field().to_string())
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(app.theme.line))
        .data(&points);

    let axis_style = Style::default().fg(app.theme.border);
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .title("reading")
                .style(axis_style)
                .bounds([x_min, x_max])
                .labels(vec![
                    Line::from(format!("{}", x_min as u64)),
                    Line::from(format!("{}", x_max as u64)),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(app.field().to_string())
                .style(axis_style)
                .bounds([y_min, y_max])
                .labels(vec![
                    Line::from(format!("{:.1}", y_min)),
                    Line::from(format!("{:.1}", (y_min + y_max) / 2.0)),
                    Line::from(format!("{:.1}", y_max)),
                ]),
        );

    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_of_empty_series() {
        let series = Series::new();
        assert_eq!(x_bounds(&series), [0.0, 1.0]);
        assert_eq!(y_bounds(&series), [0.0, 1.0]);
    }

    #[test]
    fn test_x_bounds_follow_labels() {
        let mut series = Series::new();
        series.ingest(1.0);
        assert_eq!(x_bounds(&series), [1.0, 2.0]);

        series.ingest(2.0);
        series.ingest(3.0);
        assert_eq!(x_bounds(&series), [1.0, 3.0]);
    }

    #[test]
    fn test_x_bounds_after_eviction() {
        let mut series = Series::bounded(2);
        for v in [1.0, 2.0, 3.0, 4.0] {
            series.ingest(v);
        }
        assert_eq!(x_bounds(&series), [3.0, 4.0]);
    }

    #[test]
    fn test_y_bounds_padded() {
        let mut series = Series::new();
        series.ingest(10.0);
        series.ingest(20.0);
        let [lo, hi] = y_bounds(&series);
        assert!(lo < 10.0 && lo >= 8.9);
        assert!(hi > 20.0 && hi <= 21.1);
    }

    #[test]
    fn test_y_bounds_flat_series_has_height() {
        let mut series = Series::new();
        series.ingest(42.5);
        let [lo, hi] = y_bounds(&series);
        assert!(lo < 42.5 && hi > 42.5);
        assert!(hi - lo >= MIN_Y_SPAN);
    }
}

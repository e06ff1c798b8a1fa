use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::App;

/// Default path for the `e` export key.
pub const EXPORT_PATH: &str = "series_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }

    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        KeyCode::Char('?') => app.toggle_help(),

        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_PATH);
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Series, TopicRouter};
    use crate::source::{ChannelSource, MessageSource};

    async fn test_app() -> App {
        let (_tx, mut source) = ChannelSource::create("test");
        let subscription = source.subscribe("/t").await.unwrap();
        App::new(subscription, TopicRouter::new("/t", "hmd"), Series::new())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = test_app().await;
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.running);

        let mut app = test_app().await;
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(!app.running);
    }

    #[tokio::test]
    async fn test_help_swallows_next_key() {
        let mut app = test_app().await;
        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);

        // 'q' closes help instead of quitting
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(app.running);
    }

    #[tokio::test]
    async fn test_export_empty_series_reports_failure() {
        let mut app = test_app().await;
        handle_key_event(&mut app, key(KeyCode::Char('e')));
        let msg = app.get_status_message().unwrap();
        assert!(msg.starts_with("Export failed"));
    }
}

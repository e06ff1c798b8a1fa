//! Application state and message handling.

use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::data::{Dispatch, Series, TopicRouter};
use crate::source::{InboundMessage, Subscription};
use crate::ui::Theme;

/// How long a temporary status message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Grace period for background tasks once the subscription is released.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(200);

/// Upper bound on messages handled per [`App::pump`] so input stays responsive.
const MAX_MESSAGES_PER_PUMP: usize = 1024;

/// Serialized form of the series written by [`App::export_state`].
#[derive(Debug, Serialize)]
pub struct SeriesExport<'a> {
    pub topic: &'a str,
    pub field: &'a str,
    pub labels: Vec<u64>,
    pub values: Vec<f64>,
}

/// Main application state.
///
/// The series is owned here and mutated only through [`App::dispatch`].
pub struct App {
    pub running: bool,
    pub show_help: bool,

    // Message source
    subscription: Subscription,
    router: TopicRouter,

    // Data
    pub series: Series,
    pub last_updated: Option<Instant>,
    pub last_rejection: Option<String>,
    pub unhandled_count: u64,
    pub rejected_count: u64,

    // UI
    pub title: String,
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App reading from `subscription` into `series`.
    pub fn new(subscription: Subscription, router: TopicRouter, series: Series) -> Self {
        Self {
            running: true,
            show_help: false,
            subscription,
            router,
            series,
            last_updated: None,
            last_rejection: None,
            unhandled_count: 0,
            rejected_count: 0,
            title: String::new(),
            theme: Theme::dark(),
            status_message: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// The recognized topic.
    pub fn topic(&self) -> &str {
        self.router.topic()
    }

    /// The payload field charted.
    pub fn field(&self) -> &str {
        self.router.field()
    }

    /// Returns a description of the current message source.
    pub fn source_description(&self) -> &str {
        self.subscription.description()
    }

    /// The most recent transport error, if any.
    pub fn source_error(&self) -> Option<String> {
        self.subscription.last_error()
    }

    /// True once the source has stopped and every buffered message was handled.
    pub fn source_finished(&self) -> bool {
        self.subscription.is_finished()
    }

    /// Drain buffered messages from the subscription, in arrival order.
    ///
    /// Returns the number of readings accepted into the series.
    pub fn pump(&mut self) -> usize {
        // A sink never fails to write
        self.pump_into(&mut io::sink()).unwrap_or_default()
    }

    /// Like [`App::pump`], also writing each accepted reading to `out` as
    /// `label<TAB>value` as soon as it is dispatched.
    ///
    /// Every accepted reading is written exactly once, even when a retention
    /// cap evicts it from the series within the same drain. Stops at the
    /// first write error; the message being handled is already dispatched.
    pub fn pump_into<W: Write>(&mut self, out: &mut W) -> io::Result<usize> {
        let mut accepted = 0;
        for _ in 0..MAX_MESSAGES_PER_PUMP {
            let Some(message) = self.subscription.poll() else {
                break;
            };
            if let Dispatch::Accepted { label, value } = self.dispatch(&message) {
                accepted += 1;
                writeln!(out, "{}\t{}", label, value)?;
            }
        }
        Ok(accepted)
    }

    /// Route a single message and update bookkeeping.
    pub fn dispatch(&mut self, message: &InboundMessage) -> Dispatch {
        let outcome = self.router.dispatch(message, &mut self.series);
        match &outcome {
            Dispatch::Accepted { .. } => {
                self.last_updated = Some(Instant::now());
            }
            Dispatch::UnhandledTopic => {
                self.unhandled_count += 1;
            }
            Dispatch::Rejected(e) => {
                self.rejected_count += 1;
                self.last_rejection = Some(e.to_string());
            }
        }
        outcome
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Snapshot of the series for export.
    pub fn export(&self) -> SeriesExport<'_> {
        SeriesExport {
            topic: self.router.topic(),
            field: self.router.field(),
            labels: self.series.labels().iter().copied().collect(),
            values: self.series.values().iter().copied().collect(),
        }
    }

    /// Export the current series to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        if self.series.is_empty() {
            anyhow::bail!("No data to export");
        }

        let json = serde_json::to_string_pretty(&self.export())?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    /// Give up the app and return its subscription for an orderly release.
    pub fn into_subscription(self) -> Subscription {
        self.subscription
    }

    /// Release the subscription, then stop `runtime`.
    ///
    /// A blocking read still parked on stdin cannot be cancelled, so the
    /// runtime gets a short grace period rather than being waited on.
    pub fn shutdown(self, runtime: tokio::runtime::Runtime) {
        runtime.block_on(self.into_subscription().close());
        runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ChannelSource, MessageSource};
    use tokio::sync::mpsc;

    const TOPIC: &str = "/groupname/sensor/tempandhumid";

    async fn test_app() -> (mpsc::Sender<InboundMessage>, App) {
        let (tx, mut source) = ChannelSource::create("test");
        let subscription = source.subscribe(TOPIC).await.unwrap();
        let app = App::new(subscription, TopicRouter::new(TOPIC, "hmd"), Series::new())
            .with_title("Test");
        (tx, app)
    }

    async fn send(tx: &mpsc::Sender<InboundMessage>, topic: &str, payload: &str) {
        tx.send(InboundMessage::new(topic, payload.as_bytes().to_vec()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_pump_accepts_in_order() {
        let (tx, mut app) = test_app().await;
        send(&tx, TOPIC, r#"{"hmd": 10}"#).await;
        send(&tx, TOPIC, r#"{"hmd": 20}"#).await;

        assert_eq!(app.pump(), 2);
        assert_eq!(app.series.points(), vec![(1.0, 10.0), (2.0, 20.0)]);
        assert!(app.last_updated.is_some());

        // Nothing buffered
        assert_eq!(app.pump(), 0);
    }

    #[tokio::test]
    async fn test_series_follows_arrival_order() {
        let (tx, mut app) = test_app().await;
        assert_eq!(app.pump(), 0);
        assert!(app.series.is_empty());

        send(&tx, "/other/topic", r#"{"hmd": 99}"#).await;
        for value in ["10", "20", "15"] {
            send(&tx, TOPIC, &format!(r#"{{"hmd": {}}}"#, value)).await;
        }

        assert_eq!(app.pump(), 3);
        let labels: Vec<u64> = app.series.labels().iter().copied().collect();
        let values: Vec<f64> = app.series.values().iter().copied().collect();
        assert_eq!(labels, vec![1, 2, 3]);
        assert_eq!(values, vec![10.0, 20.0, 15.0]);
        assert_eq!(app.unhandled_count, 1);
    }

    #[tokio::test]
    async fn test_pump_into_writes_every_reading_despite_eviction() {
        let (tx, mut source) = ChannelSource::create("test");
        let subscription = source.subscribe(TOPIC).await.unwrap();
        let mut app = App::new(subscription, TopicRouter::new(TOPIC, "hmd"), Series::bounded(2));

        for value in 1..=10 {
            send(&tx, TOPIC, &format!(r#"{{"hmd": {}}}"#, value)).await;
        }
        send(&tx, "/other/topic", r#"{"hmd": 99}"#).await;
        send(&tx, TOPIC, "oops").await;

        let mut out = Vec::new();
        assert_eq!(app.pump_into(&mut out).unwrap(), 10);

        let expected: String = (1..=10).map(|n| format!("{}\t{}\n", n, n)).collect();
        assert_eq!(String::from_utf8(out).unwrap(), expected);
        assert_eq!(app.series.len(), 2);
        assert_eq!(app.series.latest(), Some((10, 10.0)));
    }

    #[tokio::test]
    async fn test_pump_into_continues_labels_across_drains() {
        let (tx, mut app) = test_app().await;
        let mut out = Vec::new();

        send(&tx, TOPIC, r#"{"hmd": 1.5}"#).await;
        app.pump_into(&mut out).unwrap();
        send(&tx, TOPIC, r#"{"hmd": 2}"#).await;
        app.pump_into(&mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "1\t1.5\n2\t2\n");
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_pump_into_reports_write_error() {
        let (tx, mut app) = test_app().await;
        send(&tx, TOPIC, r#"{"hmd": 1}"#).await;

        let err = app.pump_into(&mut ClosedPipe).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        // The reading was still accepted before the write failed
        assert_eq!(app.series.latest(), Some((1, 1.0)));
    }

    #[tokio::test]
    async fn test_pump_counts_unhandled_and_rejected() {
        let (tx, mut app) = test_app().await;
        send(&tx, "/other/topic", r#"{"hmd": 1}"#).await;
        send(&tx, TOPIC, "oops").await;
        send(&tx, TOPIC, r#"{"hmd": 3}"#).await;

        assert_eq!(app.pump(), 1);
        assert_eq!(app.unhandled_count, 1);
        assert_eq!(app.rejected_count, 1);
        assert!(app.last_rejection.as_deref().unwrap().starts_with("Invalid JSON"));
        assert_eq!(app.series.latest(), Some((1, 3.0)));
    }

    #[tokio::test]
    async fn test_source_error_after_disconnect() {
        let (tx, mut app) = test_app().await;
        drop(tx);
        assert_eq!(app.pump(), 0);
        assert_eq!(app.source_error().as_deref(), Some("Source disconnected"));
        assert!(app.source_finished());
        assert_eq!(app.source_description(), "channel: test");
    }

    #[tokio::test]
    async fn test_status_message() {
        let (_tx, mut app) = test_app().await;
        assert!(app.get_status_message().is_none());
        app.set_status_message("hello".to_string());
        assert_eq!(app.get_status_message(), Some("hello"));
    }

    #[tokio::test]
    async fn test_export_state() {
        let (tx, mut app) = test_app().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.json");

        assert!(app.export_state(&path).is_err());

        send(&tx, TOPIC, r#"{"hmd": 42.5}"#).await;
        send(&tx, TOPIC, r#"{"hmd": 40}"#).await;
        app.pump();
        app.export_state(&path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            written,
            serde_json::json!({
                "topic": TOPIC,
                "field": "hmd",
                "labels": [1, 2],
                "values": [42.5, 40.0]
            })
        );
    }

    #[test]
    fn test_shutdown_does_not_wait_on_blocking_reads() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (_tx, app) = rt.block_on(test_app());

        // Stands in for a stdin read with no input pending
        rt.spawn_blocking(|| std::thread::sleep(Duration::from_secs(30)));

        let started = Instant::now();
        app.shutdown(rt);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_quit_and_help() {
        let (_tx, mut app) = test_app().await;
        assert!(app.running);
        app.toggle_help();
        assert!(app.show_help);
        app.quit();
        assert!(!app.running);
    }
}

//! Stream-based message source.
//!
//! Reads `<topic> <payload>` lines from an async byte stream. This is the
//! output format of `mosquitto_sub -v`, so a broker feed can be piped in:
//!
//! ```bash
//! mosquitto_sub -h broker.hivemq.com -t '/groupname/sensor/#' -v | sensorwatch --stdin
//! ```

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::subscription::ErrorSlot;
use super::{InboundMessage, MessageSource, SourceError, Subscription};

const CHANNEL_CAPACITY: usize = 256;

type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;

/// A message source reading topic-prefixed lines from an async reader.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use sensorwatch::StreamSource;
///
/// let data = "/sensor {\"hmd\": 42.5}\n";
/// let source = StreamSource::new(Cursor::new(data), "example");
/// ```
pub struct StreamSource {
    reader: Option<BoxedReader>,
    description: String,
}

impl StreamSource {
    pub fn new<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self {
            reader: Some(Box::new(reader)),
            description: format!("stream: {}", description),
        }
    }

    /// A source reading from the process's standard input.
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin(), "stdin")
    }
}

impl std::fmt::Debug for StreamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSource").field("description", &self.description).finish()
    }
}

/// Split a `<topic> <payload>` line into a message.
///
/// Returns `None` for blank lines and lines without a payload.
pub fn parse_line(line: &str) -> Option<InboundMessage> {
    let line = line.trim();
    let (topic, payload) = line.split_once(char::is_whitespace)?;
    let payload = payload.trim_start();
    if payload.is_empty() {
        return None;
    }
    Some(InboundMessage::new(topic, payload.as_bytes().to_vec()))
}

#[async_trait]
impl MessageSource for StreamSource {
    async fn subscribe(&mut self, topic: &str) -> Result<Subscription, SourceError> {
        let reader = self.reader.take().ok_or(SourceError::AlreadySubscribed)?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let errors = ErrorSlot::default();
        let error_handle = errors.clone();

        let task = tokio::spawn(read_lines(reader, tx, cancel_rx, error_handle));

        Ok(Subscription::new(topic, &self.description, rx, errors).with_task(cancel_tx, task))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

async fn read_lines(
    reader: BoxedReader,
    tx: mpsc::Sender<InboundMessage>,
    mut cancel: oneshot::Receiver<()>,
    errors: ErrorSlot,
) {
    let mut lines = BufReader::new(reader).lines();

    loop {
        tokio::select! {
            _ = &mut cancel => {
                debug!("Stream subscription released");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_line(&line) {
                        Some(message) => {
                            if tx.send(message).await.is_err() {
                                // Subscription dropped
                                break;
                            }
                        }
                        None => {
                            warn!("Skipping malformed line: {}", line);
                            *errors.lock() = Some(format!("Malformed line: {}", line));
                        }
                    }
                }
                Ok(None) => {
                    *errors.lock() = Some("Stream closed".to_string());
                    break;
                }
                Err(e) => {
                    *errors.lock() = Some(format!("Read error: {}", e));
                    break;
                }
            }
        }
    }
}

//! Channel-based message source.
//!
//! Receives messages via a tokio mpsc channel. This is useful for embedding
//! the dashboard behind another transport, and for tests.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::subscription::ErrorSlot;
use super::{InboundMessage, MessageSource, SourceError, Subscription};

/// Number of messages buffered between producer and subscription.
const CHANNEL_CAPACITY: usize = 256;

/// A message source fed by an in-process channel.
///
/// Every message sent on the channel is delivered to the subscription,
/// whatever its topic; topic filtering is left to the consumer, as with a
/// broker delivering on wildcard subscriptions.
///
/// # Example
///
/// ```
/// use sensorwatch::ChannelSource;
///
/// // Create a channel pair
/// let (tx, source) = ChannelSource::create("embedded");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: Option<mpsc::Receiver<InboundMessage>>,
    description: String,
}

impl ChannelSource {
    /// Create a new channel source from the receiving end of a channel.
    pub fn new(receiver: mpsc::Receiver<InboundMessage>, source_description: &str) -> Self {
        Self {
            receiver: Some(receiver),
            description: format!("channel: {}", source_description),
        }
    }

    /// Create a channel pair.
    ///
    /// Returns (sender, source) where the sender pushes messages into the
    /// subscription later obtained from the source.
    pub fn create(source_description: &str) -> (mpsc::Sender<InboundMessage>, Self) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        (tx, Self::new(rx, source_description))
    }
}

#[async_trait]
impl MessageSource for ChannelSource {
    async fn subscribe(&mut self, topic: &str) -> Result<Subscription, SourceError> {
        let receiver = self.receiver.take().ok_or(SourceError::AlreadySubscribed)?;
        Ok(Subscription::new(
            topic,
            &self.description,
            receiver,
            ErrorSlot::default(),
        ))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

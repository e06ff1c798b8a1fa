//! Message source abstraction for receiving sensor messages.
//!
//! This module provides a trait-based abstraction over publish/subscribe
//! transports. A [`MessageSource`] hands out a scoped [`Subscription`] for one
//! topic; the UI loop polls that subscription without blocking.

mod channel;
mod message;
mod mqtt;
mod stream;
mod subscription;

pub use channel::ChannelSource;
pub use message::InboundMessage;
pub use mqtt::MqttSource;
pub use stream::{parse_line, StreamSource};
pub use subscription::Subscription;

use std::fmt::Debug;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when establishing a subscription.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The MQTT client rejected the request.
    #[error("MQTT client error: {0}")]
    Client(String),

    /// The source only supports a single subscription and it is taken.
    #[error("Source already has an active subscription")]
    AlreadySubscribed,

    /// Connection settings could not be used.
    #[error("Invalid source configuration: {0}")]
    InvalidConfig(String),
}

/// Trait for publish/subscribe transports delivering sensor messages.
///
/// Implementations are constructed by the composition root and injected into
/// the application; nothing refers to a transport globally.
///
/// # Example
///
/// ```
/// use sensorwatch::{ChannelSource, InboundMessage, MessageSource};
///
/// # tokio_test::block_on(async {
/// let (tx, mut source) = ChannelSource::create("test");
/// let mut subscription = source.subscribe("/sensor").await.unwrap();
///
/// tx.send(InboundMessage::new("/sensor", br#"{"hmd": 1}"#.to_vec())).await.unwrap();
/// assert!(subscription.poll().is_some());
/// # });
/// ```
#[async_trait]
pub trait MessageSource: Send + Debug {
    /// Subscribe to `topic` and return a handle that yields inbound messages.
    ///
    /// Messages are yielded in delivery order. Releasing the handle (via
    /// [`Subscription::close`] or drop) tears the subscription down.
    async fn subscribe(&mut self, topic: &str) -> Result<Subscription, SourceError>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}

//! MQTT message source.
//!
//! Connects to a broker with `rumqttc`, subscribes to one topic, and forwards
//! every publish it receives to the subscription channel. The event loop runs
//! in a background tokio task.
//!
//! Connection failures are recorded on the subscription and end the task.
//! There is no automatic reconnection.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::subscription::ErrorSlot;
use super::{InboundMessage, MessageSource, SourceError, Subscription};
use crate::config::{BrokerSettings, Transport};

/// Capacity of the request queue between client and event loop.
const REQUEST_CAPACITY: usize = 10;

/// Number of messages buffered between event loop and subscription.
const CHANNEL_CAPACITY: usize = 256;

/// Upper bound on the time spent flushing unsubscribe/disconnect on release.
const RELEASE_TIMEOUT: Duration = Duration::from_secs(1);

/// Smallest keep-alive interval accepted by the client.
const MIN_KEEP_ALIVE_SECS: u64 = 5;

/// A message source backed by an MQTT broker.
#[derive(Debug, Clone)]
pub struct MqttSource {
    settings: BrokerSettings,
    description: String,
}

impl MqttSource {
    pub fn new(settings: BrokerSettings) -> Self {
        let description = format!("mqtt: {}", settings.url());
        Self {
            settings,
            description,
        }
    }

    /// Build client options from the broker settings.
    pub fn options(&self) -> Result<MqttOptions, SourceError> {
        let s = &self.settings;
        if s.host.trim().is_empty() {
            return Err(SourceError::InvalidConfig("broker host is empty".to_string()));
        }

        let mut options = match s.transport {
            Transport::Tcp => MqttOptions::new(&s.client_id, &s.host, s.port),
            Transport::Websocket => {
                // rumqttc takes the full websocket URL in place of the host
                let mut options = MqttOptions::new(&s.client_id, s.url(), s.port);
                options.set_transport(rumqttc::Transport::Ws);
                options
            }
        };
        options.set_keep_alive(Duration::from_secs(s.keep_alive_secs.max(MIN_KEEP_ALIVE_SECS)));
        options.set_clean_session(true);

        Ok(options)
    }
}

#[async_trait]
impl MessageSource for MqttSource {
    async fn subscribe(&mut self, topic: &str) -> Result<Subscription, SourceError> {
        let options = self.options()?;
        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);

        // Queued now, sent as soon as the connection is up
        client
            .subscribe(topic, QoS::AtMostOnce)
            .await
            .map_err(|e| SourceError::Client(e.to_string()))?;

        info!("Subscribing to {} on {}", topic, self.settings.url());

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let errors = ErrorSlot::default();

        let task = tokio::spawn(run_event_loop(
            client,
            eventloop,
            topic.to_string(),
            tx,
            cancel_rx,
            errors.clone(),
        ));

        Ok(Subscription::new(topic, &self.description, rx, errors).with_task(cancel_tx, task))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

async fn run_event_loop(
    client: AsyncClient,
    mut eventloop: EventLoop,
    topic: String,
    tx: mpsc::Sender<InboundMessage>,
    mut cancel: oneshot::Receiver<()>,
    errors: ErrorSlot,
) {
    loop {
        tokio::select! {
            _ = &mut cancel => {
                release(&client, &mut eventloop, &topic).await;
                break;
            }
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("Connected to broker");
                    *errors.lock() = None;
                }
                Ok(Event::Incoming(Packet::SubAck(_))) => {
                    info!("Subscribed to {}", topic);
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    debug!("Received {} bytes on {}", publish.payload.len(), publish.topic);
                    let message = InboundMessage::new(publish.topic, publish.payload.to_vec());
                    if tx.send(message).await.is_err() {
                        info!("Subscription dropped, releasing {}", topic);
                        release(&client, &mut eventloop, &topic).await;
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("MQTT connection error: {}", e);
                    *errors.lock() = Some(format!("Connection error: {}", e));
                    break;
                }
            }
        }
    }
}

/// Unsubscribe and disconnect, driving the event loop until both are flushed.
async fn release(client: &AsyncClient, eventloop: &mut EventLoop, topic: &str) {
    if let Err(e) = client.unsubscribe(topic).await {
        warn!("Failed to queue unsubscribe for {}: {}", topic, e);
    }
    if let Err(e) = client.disconnect().await {
        warn!("Failed to queue disconnect: {}", e);
    }

    let flush = async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    };

    if tokio::time::timeout(RELEASE_TIMEOUT, flush).await.is_err() {
        debug!("Disconnect not flushed within {:?}", RELEASE_TIMEOUT);
    } else {
        info!("Released subscription to {}", topic);
    }
}

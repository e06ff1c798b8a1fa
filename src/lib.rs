//! # sensorwatch
//!
//! A terminal dashboard that subscribes to one publish/subscribe topic
//! carrying sensor readings and renders them as a live line chart.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐  │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal│  │
//! │  │ (state) │    │ (series) │    │ (chart) │    │         │  │
//! │  └────┬────┘    └──────────┘    └─────────┘    └─────────┘  │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  ┌──────────────┐                                           │
//! │  │ Subscription │◀── MqttSource | StreamSource | ChannelSource
//! │  └──────────────┘                                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state; drains the subscription into the series
//! - **[`source`]**: [`MessageSource`] trait and transports handing out a
//!   scoped [`Subscription`]
//! - **[`data`]**: [`TopicRouter`], [`Reading`] decoding and the append-only [`Series`]
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`config`]**: Layered [`Settings`] from defaults, TOML file and environment
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Chart humidity from the public HiveMQ broker
//! sensorwatch --host broker.hivemq.com --topic /groupname/sensor/tempandhumid
//!
//! # Same broker over websockets
//! sensorwatch --host broker.hivemq.com --port 8000 --websocket
//!
//! # Pipe a feed from mosquitto_sub
//! mosquitto_sub -t '/groupname/sensor/#' -v | sensorwatch --stdin
//! ```
//!
//! ### As a library
//!
//! ```
//! use sensorwatch::{ChannelSource, InboundMessage, MessageSource, Series, TopicRouter};
//!
//! # tokio_test::block_on(async {
//! let (tx, mut source) = ChannelSource::create("embedded");
//! let mut subscription = source.subscribe("/sensor").await.unwrap();
//! let router = TopicRouter::new("/sensor", "hmd");
//! let mut series = Series::new();
//!
//! tx.send(InboundMessage::new("/sensor", br#"{"hmd": 42.5}"#.to_vec())).await.unwrap();
//! while let Some(message) = subscription.poll() {
//!     router.dispatch(&message, &mut series);
//! }
//!
//! assert_eq!(series.latest(), Some((1, 42.5)));
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod logging;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use data::{Dispatch, Reading, ReadingError, Series, TopicRouter};
pub use source::{
    ChannelSource, InboundMessage, MessageSource, MqttSource, SourceError, StreamSource,
    Subscription,
};

//! Layered settings: built-in defaults, optional TOML file, environment.
//!
//! ```toml
//! [broker]
//! host = "broker.hivemq.com"
//! port = 1883
//! transport = "tcp"        # or "websocket"
//!
//! [feed]
//! topic = "/groupname/sensor/tempandhumid"
//! field = "hmd"
//! # max_points = 500
//! ```
//!
//! Environment variables use the `SENSORWATCH` prefix and `__` as the section
//! separator, e.g. `SENSORWATCH_BROKER__HOST=localhost`.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "broker.hivemq.com";
pub const DEFAULT_PORT: u16 = 1883;
pub const DEFAULT_TOPIC: &str = "/groupname/sensor/tempandhumid";
pub const DEFAULT_FIELD: &str = "hmd";
const ENV_PREFIX: &str = "SENSORWATCH";

/// How the MQTT client reaches the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Tcp,
    Websocket,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerSettings {
    pub host: String,
    pub port: u16,
    pub transport: Transport,
    /// Request path for the websocket transport.
    pub ws_path: String,
    pub client_id: String,
    pub keep_alive_secs: u64,
}

impl BrokerSettings {
    /// Broker address for display, e.g. `mqtt://host:1883` or `ws://host:8000/mqtt`.
    pub fn url(&self) -> String {
        match self.transport {
            Transport::Tcp => format!("mqtt://{}:{}", self.host, self.port),
            Transport::Websocket => format!("ws://{}:{}{}", self.host, self.port, self.ws_path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSettings {
    /// The one topic whose messages feed the chart.
    pub topic: String,
    /// Payload field holding the measured value.
    pub field: String,
    /// Retention cap; unbounded when unset.
    #[serde(default)]
    pub max_points: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub title: String,
    /// Terminal input poll interval in milliseconds.
    pub tick_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Log file used while the terminal UI owns stdout.
    pub file: PathBuf,
    /// Default filter directive when `RUST_LOG` is unset.
    pub filter: String,
}

/// Complete application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub broker: BrokerSettings,
    pub feed: FeedSettings,
    pub display: DisplaySettings,
    pub log: LogSettings,
}

impl Settings {
    /// Load settings from defaults, an optional config file, and the environment.
    ///
    /// A config file given explicitly must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, environment())
    }

    fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("broker.host", DEFAULT_HOST)?
            .set_default("broker.port", DEFAULT_PORT as i64)?
            .set_default("broker.transport", "tcp")?
            .set_default("broker.ws_path", "/mqtt")?
            .set_default("broker.client_id", format!("sensorwatch-{}", std::process::id()))?
            .set_default("broker.keep_alive_secs", 5_i64)?
            .set_default("feed.topic", DEFAULT_TOPIC)?
            .set_default("feed.field", DEFAULT_FIELD)?
            .set_default("display.title", "Real time temperature example")?
            .set_default("display.tick_ms", 100_i64)?
            .set_default("log.file", "sensorwatch.log")?
            .set_default("log.filter", "sensorwatch=info")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.add_source(env).build()?.try_deserialize()
    }
}

/// Environment source: `SENSORWATCH_` prefix, `__` between nested keys.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            broker: BrokerSettings {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
                transport: Transport::Tcp,
                ws_path: "/mqtt".to_string(),
                client_id: format!("sensorwatch-{}", std::process::id()),
                keep_alive_secs: 5,
            },
            feed: FeedSettings {
                topic: DEFAULT_TOPIC.to_string(),
                field: DEFAULT_FIELD.to_string(),
                max_points: None,
            },
            display: DisplaySettings {
                title: "Real time temperature example".to_string(),
                tick_ms: 100,
            },
            log: LogSettings {
                file: PathBuf::from("sensorwatch.log"),
                filter: "sensorwatch=info".to_string(),
            },
        }
    }
}

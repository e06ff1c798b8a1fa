//! Routing of inbound messages to the series.

use tracing::{debug, info, warn};

use super::reading::{Reading, ReadingError};
use super::series::Series;
use crate::source::InboundMessage;

/// Outcome of dispatching a single inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// The reading was appended to the series under `label`.
    Accepted { label: u64, value: f64 },
    /// The message arrived on a topic with no handler; nothing changed.
    UnhandledTopic,
    /// The message was on the recognized topic but its payload was dropped.
    Rejected(ReadingError),
}

/// Dispatches messages on exactly one recognized topic to a [`Series`].
///
/// Messages on any other topic are logged and otherwise ignored. Payloads on
/// the recognized topic that do not carry a numeric `field` are dropped and
/// logged; the series is left unchanged.
#[derive(Debug, Clone)]
pub struct TopicRouter {
    topic: String,
    field: String,
}

impl TopicRouter {
    pub fn new(topic: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            field: field.into(),
        }
    }

    /// The recognized topic name.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The payload field holding the measured value.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Route one message, ingesting it into `series` when it is accepted.
    pub fn dispatch(&self, message: &InboundMessage, series: &mut Series) -> Dispatch {
        if message.topic != self.topic {
            info!("no handler for topic {}", message.topic);
            return Dispatch::UnhandledTopic;
        }

        match Reading::parse(&message.payload, &self.field) {
            Ok(reading) => {
                let label = series.ingest(reading.value);
                debug!(label, value = reading.value, "accepted reading");
                Dispatch::Accepted {
                    label,
                    value: reading.value,
                }
            }
            Err(e) => {
                warn!("Dropping payload on {}: {}", message.topic, e);
                Dispatch::Rejected(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPIC: &str = "/groupname/sensor/tempandhumid";

    fn router() -> TopicRouter {
        TopicRouter::new(TOPIC, "hmd")
    }

    fn msg(topic: &str, payload: &str) -> InboundMessage {
        InboundMessage::new(topic, payload.as_bytes().to_vec())
    }

    #[test]
    fn test_accepts_recognized_topic() {
        let mut series = Series::new();
        let outcome = router().dispatch(&msg(TOPIC, r#"{"hmd": 42.5}"#), &mut series);

        assert_eq!(
            outcome,
            Dispatch::Accepted {
                label: 1,
                value: 42.5
            }
        );
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_unhandled_topic_leaves_series_unchanged() {
        let mut series = Series::new();
        series.ingest(1.0);

        let outcome = router().dispatch(&msg("/other/topic", r#"{"hmd": 5}"#), &mut series);

        assert_eq!(outcome, Dispatch::UnhandledTopic);
        assert_eq!(series.len(), 1);
        assert_eq!(series.latest(), Some((1, 1.0)));
    }

    #[test]
    fn test_topic_match_is_exact() {
        let mut series = Series::new();
        let r = router();
        assert_eq!(
            r.dispatch(&msg("/groupname/sensor/tempandhumid/", r#"{"hmd": 1}"#), &mut series),
            Dispatch::UnhandledTopic
        );
        assert_eq!(
            r.dispatch(&msg("/groupname/sensor/#", r#"{"hmd": 1}"#), &mut series),
            Dispatch::UnhandledTopic
        );
        assert!(series.is_empty());
    }

    #[test]
    fn test_malformed_payload_is_rejected() {
        let mut series = Series::new();
        let outcome = router().dispatch(&msg(TOPIC, r#"{"tmp": 20}"#), &mut series);

        assert_eq!(
            outcome,
            Dispatch::Rejected(ReadingError::MissingField {
                field: "hmd".to_string()
            })
        );
        assert!(series.is_empty());
    }

    #[test]
    fn test_custom_field() {
        let mut series = Series::new();
        let r = TopicRouter::new(TOPIC, "tmp");
        r.dispatch(&msg(TOPIC, r#"{"hmd": 50, "tmp": 21.5}"#), &mut series);
        assert_eq!(series.latest(), Some((1, 21.5)));
        assert_eq!(r.field(), "tmp");
        assert_eq!(r.topic(), TOPIC);
    }
}

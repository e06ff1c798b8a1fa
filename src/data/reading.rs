//! Decoding of sensor payloads into readings.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when extracting a reading from a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadingError {
    /// Payload is not valid UTF-8 JSON.
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(String),

    /// Payload decoded, but the top-level value is not an object.
    #[error("Payload is not a JSON object")]
    NotAnObject,

    /// The configured field is absent.
    #[error("Missing field '{field}'")]
    MissingField { field: String },

    /// The configured field is present but not a number.
    #[error("Field '{field}' is not numeric")]
    NotNumeric { field: String },
}

/// One decoded sensor reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// The measured quantity.
    pub value: f64,
}

impl Reading {
    /// Decode `payload` as a JSON object and extract the numeric `field`.
    ///
    /// # Example
    ///
    /// ```
    /// use sensorwatch::Reading;
    ///
    /// let reading = Reading::parse(br#"{"hmd": 42.5, "tmp": 21.0}"#, "hmd").unwrap();
    /// assert_eq!(reading.value, 42.5);
    /// ```
    pub fn parse(payload: &[u8], field: &str) -> Result<Self, ReadingError> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| ReadingError::InvalidJson(e.to_string()))?;
        Self::from_value(&value, field)
    }

    /// Extract the numeric `field` from an already decoded JSON value.
    pub fn from_value(value: &Value, field: &str) -> Result<Self, ReadingError> {
        let object = value.as_object().ok_or(ReadingError::NotAnObject)?;

        let raw = object.get(field).ok_or_else(|| ReadingError::MissingField {
            field: field.to_string(),
        })?;

        // serde_json numbers are always finite
        let value = raw.as_f64().ok_or_else(|| ReadingError::NotNumeric {
            field: field.to_string(),
        })?;

        Ok(Self { value })
    }
}

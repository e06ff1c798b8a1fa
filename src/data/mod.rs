//! Data models and processing for sensor readings.
//!
//! This module turns raw inbound messages into an accumulated series
//! suitable for display.
//!
//! ## Submodules
//!
//! - [`reading`]: Fallible extraction of the numeric field from a JSON payload
//! - [`dispatch`]: Topic routing ([`TopicRouter`]) deciding which messages reach the series
//! - [`series`]: The append-only [`Series`] of labels and values
//!
//! ## Data Flow
//!
//! ```text
//! InboundMessage (topic + raw payload)
//!        │
//!        ▼
//! TopicRouter::dispatch()
//!        │
//!        ├──▶ other topic: logged, ignored
//!        │
//!        └──▶ Reading::parse() ──▶ Series::ingest()
//! ```

pub mod dispatch;
pub mod reading;
pub mod series;

pub use dispatch::{Dispatch, TopicRouter};
pub use reading::{Reading, ReadingError};
pub use series::Series;

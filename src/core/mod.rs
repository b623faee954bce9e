//! Core module - Metric registry, configuration, and common types

mod config;
mod error;
mod store;
mod types;

pub use config::{Config, GeneralConfig, SensorConfig, SerialConfig, DEFAULT_BAUD_RATE};
pub use error::{Error, Result};
pub use store::{MetricSnapshot, MetricStore};
pub use types::{HardwareCategory, MetricKind, Part, SensorCategory, SensorRecord};

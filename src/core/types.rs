//! Common types used across the application

use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical component a metric belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    Processor,
    GraphicsCard,
    /// Declared for the display's schema; no sensor is classified into it yet.
    Memory,
}

impl Part {
    pub const ALL: [Part; 3] = [Part::Processor, Part::GraphicsCard, Part::Memory];

    /// Metrics that always exist for this part, zero until first observed
    pub fn default_metrics(self) -> &'static [MetricKind] {
        use MetricKind::*;
        match self {
            Part::Processor => &[Temperature, UsagePercentage, FrequencyHz, PowerDrawWatts],
            Part::GraphicsCard => &[
                Temperature,
                UsagePercentage,
                FrequencyHz,
                PowerDrawWatts,
                VideoMemoryFrequencyHz,
            ],
            Part::Memory => &[Temperature, UsagePercentage, FrequencyHz],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Part::Processor => "cpu",
            Part::GraphicsCard => "gpu",
            Part::Memory => "memory",
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Category of a sampled value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Temperature,
    UsagePercentage,
    PowerDrawWatts,
    /// Core clock, in the unit the provider reports (MHz for every host backend)
    FrequencyHz,
    VideoMemoryFrequencyHz,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Temperature => "temperature",
            MetricKind::UsagePercentage => "usage",
            MetricKind::PowerDrawWatts => "power",
            MetricKind::FrequencyHz => "frequency",
            MetricKind::VideoMemoryFrequencyHz => "memory_frequency",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Hardware class reported by a sensor provider node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HardwareCategory {
    Cpu,
    GpuAti,
    GpuNvidia,
    Memory,
    Mainboard,
    Storage,
    Other,
}

/// Sensor class reported by a sensor provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorCategory {
    Temperature,
    Load,
    Power,
    Clock,
    Voltage,
    Fan,
    Data,
}

/// A single raw sensor reading as handed over by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub hardware: HardwareCategory,
    pub category: SensorCategory,
    pub name: String,
    /// Providers report `None` when the sensor exists but has no reading yet
    pub value: Option<f32>,
}

impl SensorRecord {
    pub fn new(
        hardware: HardwareCategory,
        category: SensorCategory,
        name: impl Into<String>,
        value: Option<f32>,
    ) -> Self {
        Self {
            hardware,
            category,
            name: name.into(),
            value,
        }
    }
}

//! Sensor classification
//!
//! Maps a provider's loosely named sensor to one of the metrics the display
//! understands. Names are matched as case-sensitive substrings against the
//! labels the sensor providers use, e.g. "CPU Package" or "GPU Core".

use crate::core::{HardwareCategory, MetricKind, Part, SensorCategory, SensorRecord};

/// One classification rule: sensor category plus required name fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub sensor: SensorCategory,
    /// `None` accepts any sensor name
    pub name_contains: Option<&'static str>,
    pub metric: MetricKind,
}

const fn rule(sensor: SensorCategory, name: &'static str, metric: MetricKind) -> Rule {
    Rule {
        sensor,
        name_contains: Some(name),
        metric,
    }
}

/// Processor rules, first match wins
pub const CPU_RULES: &[Rule] = &[
    rule(SensorCategory::Temperature, "CPU Package", MetricKind::Temperature),
    rule(SensorCategory::Load, "CPU Total", MetricKind::UsagePercentage),
    rule(SensorCategory::Power, "CPU Package", MetricKind::PowerDrawWatts),
    rule(SensorCategory::Clock, "CPU Core #1", MetricKind::FrequencyHz),
];

/// Graphics card rules (AMD and NVIDIA), first match wins
pub const GPU_RULES: &[Rule] = &[
    rule(SensorCategory::Temperature, "GPU Core", MetricKind::Temperature),
    rule(SensorCategory::Load, "GPU Core", MetricKind::UsagePercentage),
    rule(SensorCategory::Clock, "GPU Core", MetricKind::FrequencyHz),
    rule(SensorCategory::Clock, "GPU Memory", MetricKind::VideoMemoryFrequencyHz),
    Rule {
        sensor: SensorCategory::Power,
        name_contains: None,
        metric: MetricKind::PowerDrawWatts,
    },
];

/// Part and rule table for a hardware class, if it has any
pub fn rules_for(hardware: HardwareCategory) -> Option<(Part, &'static [Rule])> {
    match hardware {
        HardwareCategory::Cpu => Some((Part::Processor, CPU_RULES)),
        HardwareCategory::GpuAti | HardwareCategory::GpuNvidia => {
            Some((Part::GraphicsCard, GPU_RULES))
        }
        _ => None,
    }
}

impl Rule {
    pub fn matches(&self, record: &SensorRecord) -> bool {
        self.sensor == record.category
            && self
                .name_contains
                .map_or(true, |fragment| record.name.contains(fragment))
    }
}

/// Classify a raw sensor record; `None` for anything the display does not use
pub fn classify(record: &SensorRecord) -> Option<(Part, MetricKind)> {
    let (part, rules) = rules_for(record.hardware)?;
    rules
        .iter()
        .find(|rule| rule.matches(record))
        .map(|rule| (part, rule.metric))
}

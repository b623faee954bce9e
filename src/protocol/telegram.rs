//! Command bytes and the binary telegrams sent back for them

use crate::core::{MetricKind, MetricSnapshot, Part};

/// Request for the basic telegram (`'#'`)
pub const BASIC_REQUEST: u8 = b'#';
/// Request for the extended telegram (`'@'`)
pub const EXTENDED_REQUEST: u8 = b'@';

/// Metrics in the basic telegram, in wire order
pub const BASIC_LAYOUT: [(Part, MetricKind); 4] = [
    (Part::Processor, MetricKind::UsagePercentage),
    (Part::Processor, MetricKind::Temperature),
    (Part::GraphicsCard, MetricKind::UsagePercentage),
    (Part::GraphicsCard, MetricKind::Temperature),
];

/// Metrics in the extended telegram, in wire order
pub const EXTENDED_LAYOUT: [(Part, MetricKind); 2] = [
    (Part::Processor, MetricKind::FrequencyHz),
    (Part::GraphicsCard, MetricKind::FrequencyHz),
];

/// A recognised single-byte command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Basic,
    Extended,
}

impl Command {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            BASIC_REQUEST => Some(Command::Basic),
            EXTENDED_REQUEST => Some(Command::Extended),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Command::Basic => "basic",
            Command::Extended => "extended",
        }
    }
}

/// Fixed-size reply: little-endian f32 values, no header or checksum
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Telegram {
    Basic([f32; 4]),
    Extended([f32; 2]),
}

impl Telegram {
    /// Assemble the reply to `command` from one snapshot
    pub fn build(command: Command, snapshot: &MetricSnapshot) -> Self {
        let read = |(part, metric): (Part, MetricKind)| snapshot.get(part, metric);
        match command {
            Command::Basic => Telegram::Basic(BASIC_LAYOUT.map(read)),
            Command::Extended => Telegram::Extended(EXTENDED_LAYOUT.map(read)),
        }
    }

    pub fn values(&self) -> &[f32] {
        match self {
            Telegram::Basic(values) => values,
            Telegram::Extended(values) => values,
        }
    }

    /// Wire bytes, little-endian regardless of host byte order
    pub fn encode(&self) -> Vec<u8> {
        self.values()
            .iter()
            .flat_map(|value| value.to_le_bytes())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values().len() * 4
    }

    /// The display waits on the full basic telegram, so it is flushed explicitly
    pub fn needs_flush(&self) -> bool {
        matches!(self, Telegram::Basic(_))
    }
}

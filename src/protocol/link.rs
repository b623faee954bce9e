//! Byte streams the protocol server can talk over

use crate::core::{Result, SerialConfig};
use std::io::{self, Read, Write};
use std::time::Duration;

/// A bidirectional byte stream that can report how many bytes are waiting
pub trait Link: Read + Write + Send {
    /// Number of inbound bytes that can be read without blocking
    fn bytes_available(&mut self) -> io::Result<usize>;
}

/// An open serial port (8-N-1)
pub struct SerialSession {
    name: String,
    port: Box<dyn serialport::SerialPort>,
}

impl SerialSession {
    pub fn open(name: &str, config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(name, config.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .open()?;

        log::info!("Opened {} at {} baud", name, config.baud_rate);
        Ok(Self {
            name: name.to_string(),
            port,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Read for SerialSession {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialSession {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl Link for SerialSession {
    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }
}

impl Drop for SerialSession {
    fn drop(&mut self) {
        log::info!("Closed {}", self.name);
    }
}

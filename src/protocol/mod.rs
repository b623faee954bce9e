//! Serial command protocol
//!
//! The display drives the exchange. Whenever bytes arrive:
//! - exactly one byte waiting: it is a command (`'#'` basic, `'@'` extended,
//!   anything else ignored) answered with a fixed-size telegram;
//! - more than one byte waiting: the whole buffer is diagnostic text from the
//!   device and goes to the log sink.
//!
//! There is no framing beyond that, so the embedded side must not send a
//! command while a text line is still being transmitted.

pub mod fake;
mod link;
mod ports;
mod telegram;

pub use link::{Link, SerialSession};
pub use ports::{available_ports, choose_port, probe_port};
pub use telegram::{Command, Telegram, BASIC_LAYOUT, BASIC_REQUEST, EXTENDED_LAYOUT, EXTENDED_REQUEST};

use crate::core::{Error, MetricStore, Result};
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Receiver for text the device sends over the link
pub trait LogSink: Send {
    fn passthrough(&self, text: &str);
}

/// Forwards device text to the `log` facade under the `device` target
pub struct LogCrateSink;

impl LogSink for LogCrateSink {
    fn passthrough(&self, text: &str) {
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            log::info!(target: "device", "{}", line.trim_end());
        }
    }
}

/// Whether a session is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Open,
}

/// What one poll of the link did
#[derive(Debug, Clone, PartialEq)]
pub enum Activity {
    /// Nothing was waiting
    Quiet,
    /// Text forwarded to the log sink
    Passthrough(String),
    /// Telegram written
    Served(Command),
    /// Telegram could not be written and was discarded
    Dropped(Command),
    /// Unknown command byte
    Ignored(u8),
}

/// Decode bytes as 7-bit ASCII; anything else becomes `'?'`
pub fn decode_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}

/// Serves metric telegrams over a single link
pub struct ProtocolServer<L: Link> {
    store: Arc<MetricStore>,
    sink: Box<dyn LogSink>,
    link: Option<L>,
}

impl<L: Link> ProtocolServer<L> {
    pub fn new(store: Arc<MetricStore>, sink: Box<dyn LogSink>) -> Self {
        Self {
            store,
            sink,
            link: None,
        }
    }

    /// Attach a session, closing the current one first
    pub fn open(&mut self, link: L) {
        self.close();
        self.link = Some(link);
    }

    /// Detach and return the current session
    pub fn close(&mut self) -> Option<L> {
        self.link.take()
    }

    pub fn state(&self) -> SessionState {
        if self.link.is_some() {
            SessionState::Open
        } else {
            SessionState::Idle
        }
    }

    pub fn link(&self) -> Option<&L> {
        self.link.as_ref()
    }

    pub fn link_mut(&mut self) -> Option<&mut L> {
        self.link.as_mut()
    }

    /// Handle whatever is currently waiting on the link
    ///
    /// Read failures are returned; the link is most likely gone. Write
    /// failures only drop the telegram.
    pub fn poll(&mut self) -> Result<Activity> {
        let link = self.link.as_mut().ok_or(Error::SessionClosed)?;

        match link.bytes_available()? {
            0 => Ok(Activity::Quiet),
            1 => {
                let mut byte = [0u8; 1];
                link.read_exact(&mut byte)?;
                Ok(self.dispatch(byte[0]))
            }
            available => {
                let mut buf = vec![0u8; available];
                link.read_exact(&mut buf)?;
                let text = decode_ascii(&buf);
                self.sink.passthrough(&text);
                Ok(Activity::Passthrough(text))
            }
        }
    }

    /// Answer a single command byte from the current snapshot
    pub fn dispatch(&mut self, byte: u8) -> Activity {
        let Some(command) = Command::from_byte(byte) else {
            log::trace!("Ignoring command byte 0x{:02x}", byte);
            return Activity::Ignored(byte);
        };

        let telegram = Telegram::build(command, &self.store.snapshot());
        match self.write_telegram(&telegram) {
            Ok(()) => {
                log::trace!("Sent {} telegram ({} bytes)", command.as_str(), telegram.len());
                Activity::Served(command)
            }
            Err(e) => {
                log::warn!("Dropping {} telegram: {}", command.as_str(), e);
                Activity::Dropped(command)
            }
        }
    }

    fn write_telegram(&mut self, telegram: &Telegram) -> Result<()> {
        let link = self.link.as_mut().ok_or(Error::SessionClosed)?;
        link.write_all(&telegram.encode()).map_err(Error::LinkWrite)?;
        if telegram.needs_flush() {
            link.flush().map_err(Error::LinkWrite)?;
        }
        Ok(())
    }

    /// Poll until `shutdown` is set, the session is closed, or the link fails
    ///
    /// On a read failure the session is closed and the error returned.
    pub fn run(&mut self, shutdown: &AtomicBool, poll_interval: Duration) -> Result<()> {
        while !shutdown.load(Ordering::Relaxed) {
            match self.poll() {
                Ok(Activity::Quiet) => std::thread::sleep(poll_interval),
                Ok(_) => {}
                Err(Error::SessionClosed) => return Ok(()),
                Err(e) => {
                    self.close();
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MetricKind, Part};
    use crate::protocol::fake::{FakeLink, MemorySink};

    fn le(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn open_server() -> (ProtocolServer<FakeLink>, Arc<MetricStore>, MemorySink) {
        let store = Arc::new(MetricStore::new());
        let sink = MemorySink::new();
        let mut server = ProtocolServer::new(Arc::clone(&store), Box::new(sink.clone()));
        server.open(FakeLink::new());
        (server, store, sink)
    }

    fn send(server: &mut ProtocolServer<FakeLink>, bytes: &[u8]) -> Activity {
        server.link_mut().unwrap().push_inbound(bytes);
        server.poll().unwrap()
    }

    #[test]
    fn test_basic_command() {
        let (mut server, store, _) = open_server();
        store.set(Part::Processor, MetricKind::UsagePercentage, 10.0);
        store.set(Part::Processor, MetricKind::Temperature, 55.0);
        store.set(Part::GraphicsCard, MetricKind::UsagePercentage, 20.0);
        store.set(Part::GraphicsCard, MetricKind::Temperature, 65.0);

        assert_eq!(send(&mut server, b"#"), Activity::Served(Command::Basic));

        let link = server.link().unwrap();
        assert_eq!(link.written(), le(&[10.0, 55.0, 20.0, 65.0]).as_slice());
        assert_eq!(link.flushes(), 1);
    }

    #[test]
    fn test_extended_command() {
        let (mut server, store, _) = open_server();
        store.set(Part::Processor, MetricKind::FrequencyHz, 4200.0);
        store.set(Part::GraphicsCard, MetricKind::FrequencyHz, 1800.0);

        assert_eq!(send(&mut server, b"@"), Activity::Served(Command::Extended));

        let link = server.link().unwrap();
        assert_eq!(link.written(), le(&[4200.0, 1800.0]).as_slice());
        assert_eq!(link.flushes(), 0);
    }

    #[test]
    fn test_unknown_byte_is_silent() {
        let (mut server, _, sink) = open_server();

        for byte in [b'!', b'A', 0x00, 0xff, b'\n'] {
            assert_eq!(send(&mut server, &[byte]), Activity::Ignored(byte));
        }

        assert!(server.link().unwrap().written().is_empty());
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_multiple_bytes_are_passthrough_text() {
        let (mut server, _, sink) = open_server();

        let activity = send(&mut server, b"boot ok\r\n");

        assert_eq!(activity, Activity::Passthrough("boot ok\r\n".to_string()));
        assert_eq!(sink.lines(), vec!["boot ok\r\n".to_string()]);
        assert!(server.link().unwrap().written().is_empty());
        assert_eq!(server.link_mut().unwrap().bytes_available().unwrap(), 0);
    }

    #[test]
    fn test_two_command_bytes_together_are_text() {
        let (mut server, _, sink) = open_server();

        assert_eq!(send(&mut server, b"##"), Activity::Passthrough("##".to_string()));
        assert_eq!(sink.lines(), vec!["##".to_string()]);
        assert!(server.link().unwrap().written().is_empty());
    }

    #[test]
    fn test_non_ascii_passthrough() {
        let (mut server, _, _) = open_server();
        let activity = send(&mut server, &[b'T', 0xb0, b'C']);
        assert_eq!(activity, Activity::Passthrough("T?C".to_string()));
    }

    #[test]
    fn test_quiet_link() {
        let (mut server, _, _) = open_server();
        assert_eq!(server.poll().unwrap(), Activity::Quiet);
    }

    #[test]
    fn test_write_failure_drops_telegram_and_next_command_retries() {
        let (mut server, store, _) = open_server();
        store.set(Part::Processor, MetricKind::Temperature, 50.0);
        server.link_mut().unwrap().fail_writes(true);

        assert_eq!(send(&mut server, b"#"), Activity::Dropped(Command::Basic));
        assert_eq!(server.state(), SessionState::Open);

        server.link_mut().unwrap().fail_writes(false);
        assert_eq!(send(&mut server, b"#"), Activity::Served(Command::Basic));
        assert_eq!(server.link().unwrap().written().len(), 16);
    }

    #[test]
    fn test_idle_server() {
        let store = Arc::new(MetricStore::new());
        let mut server: ProtocolServer<FakeLink> =
            ProtocolServer::new(store, Box::new(MemorySink::new()));

        assert_eq!(server.state(), SessionState::Idle);
        assert!(matches!(server.poll(), Err(Error::SessionClosed)));
        assert_eq!(server.dispatch(BASIC_REQUEST), Activity::Dropped(Command::Basic));
    }

    #[test]
    fn test_open_replaces_session() {
        let (mut server, _, _) = open_server();
        server.link_mut().unwrap().push_inbound(b"stale");

        server.open(FakeLink::new());

        assert_eq!(server.state(), SessionState::Open);
        assert_eq!(server.poll().unwrap(), Activity::Quiet);

        assert!(server.close().is_some());
        assert_eq!(server.state(), SessionState::Idle);
    }

    #[test]
    fn test_each_command_reads_latest_snapshot() {
        let (mut server, store, _) = open_server();

        store.set(Part::Processor, MetricKind::FrequencyHz, 1000.0);
        send(&mut server, b"@");
        store.set(Part::Processor, MetricKind::FrequencyHz, 2000.0);
        send(&mut server, b"@");

        let written = server.link_mut().unwrap().take_written();
        assert_eq!(written, le(&[1000.0, 0.0, 2000.0, 0.0]));
    }

    #[test]
    fn test_run_stops_on_read_failure() {
        let (mut server, _, _) = open_server();
        server.link_mut().unwrap().fail_reads(true);
        let shutdown = AtomicBool::new(false);

        let result = server.run(&shutdown, Duration::from_millis(1));

        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(server.state(), SessionState::Idle);
    }

    #[test]
    fn test_run_honours_shutdown() {
        let (mut server, _, _) = open_server();
        let shutdown = AtomicBool::new(true);

        server.run(&shutdown, Duration::from_millis(1)).unwrap();
        assert_eq!(server.state(), SessionState::Open);
    }

    #[test]
    fn test_decode_ascii() {
        assert_eq!(decode_ascii(b"CPU 42%"), "CPU 42%");
        assert_eq!(decode_ascii(&[0xc3, 0xa9]), "??");
    }
}

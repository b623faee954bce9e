use crate::protocol::{Link, LogSink};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Arc;

/// In-memory link used in tests to script inbound bytes and capture writes.
#[derive(Default)]
pub struct FakeLink {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
    flushes: usize,
    fail_writes: bool,
    fail_reads: bool,
}

impl FakeLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if they had just arrived on the wire
    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes);
    }

    /// Make every write fail, like an unplugged adapter
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn written(&self) -> &[u8] {
        &self.outbound
    }

    /// Drain everything written so far
    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbound)
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl Read for FakeLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.fail_reads {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "fake link read failure"));
        }
        let n = buf.len().min(self.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(self.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for FakeLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "fake link write failure"));
        }
        self.outbound.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "fake link flush failure"));
        }
        self.flushes += 1;
        Ok(())
    }
}

impl Link for FakeLink {
    fn bytes_available(&mut self) -> io::Result<usize> {
        if self.fail_reads {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "fake link read failure"));
        }
        Ok(self.inbound.len())
    }
}

/// Log sink that keeps every passthrough line
#[derive(Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl LogSink for MemorySink {
    fn passthrough(&self, text: &str) {
        self.lines.lock().push(text.to_string());
    }
}

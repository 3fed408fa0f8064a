//! Byte channels carrying the controller link

use serialport::SerialPort;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// Abstraction for the byte link to the cluster controller
///
/// The decoder only ever reads what [`ByteChannel::bytes_to_read`] reports,
/// so implementations never have to block.
pub trait ByteChannel: Read + Write + Send {
    /// Get number of bytes available to read without blocking
    fn bytes_to_read(&mut self) -> io::Result<u32>;

    /// Discard everything pending on the input side
    fn clear_input_buffer(&mut self) -> io::Result<()>;
}

/// Serial port wrapper implementing ByteChannel
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    /// Wrap an opened and configured port
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }

    /// Port name as reported by the driver
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl Read for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl ByteChannel for SerialChannel {
    fn bytes_to_read(&mut self) -> io::Result<u32> {
        self.port.bytes_to_read().map_err(io::Error::other)
    }

    fn clear_input_buffer(&mut self) -> io::Result<()> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(io::Error::other)
    }
}

#[derive(Default)]
struct MemoryInner {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
    fail_reads: bool,
    fail_writes: bool,
}

/// In-memory loopback channel
///
/// Clones share the same buffers, so one handle can be given to the core
/// while another feeds bytes in and inspects what was written back. Used for
/// log replay and tests.
#[derive(Clone, Default)]
pub struct MemoryChannel {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryChannel {
    /// Empty loopback channel
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue bytes as if received from the device
    pub fn feed(&self, bytes: &[u8]) {
        self.lock().inbound.extend(bytes.iter().copied());
    }

    /// Queue a string as if received from the device
    pub fn feed_str(&self, s: &str) {
        self.feed(s.as_bytes());
    }

    /// Take everything written to the device so far
    pub fn take_written(&self) -> String {
        let bytes = std::mem::take(&mut self.lock().outbound);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Number of received bytes not yet read
    pub fn pending(&self) -> usize {
        self.lock().inbound.len()
    }

    /// Make subsequent reads fail, simulating a pulled cable
    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Make subsequent writes fail
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }
}

impl Read for MemoryChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        if inner.fail_reads {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        let n = buf.len().min(inner.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(inner.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for MemoryChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        inner.outbound.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ByteChannel for MemoryChannel {
    fn bytes_to_read(&mut self) -> io::Result<u32> {
        let inner = self.lock();
        if inner.fail_reads {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        Ok(inner.inbound.len() as u32)
    }

    fn clear_input_buffer(&mut self) -> io::Result<()> {
        self.lock().inbound.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_channel_shares_buffers() {
        let feeder = MemoryChannel::new();
        let mut reader = feeder.clone();

        feeder.feed_str("SPEED:12\n");
        assert_eq!(reader.bytes_to_read().unwrap(), 9);

        let mut buf = [0u8; 4];
        assert_eq!(reader.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"SPEE");
        assert_eq!(feeder.pending(), 5);

        reader.write_all(b"AVG_MPG_UPDATE:0.0\n").unwrap();
        assert_eq!(feeder.take_written(), "AVG_MPG_UPDATE:0.0\n");
        assert_eq!(feeder.take_written(), "");
    }

    #[test]
    fn test_memory_channel_failure_injection() {
        let mut channel = MemoryChannel::new();
        channel.fail_reads(true);
        assert!(channel.bytes_to_read().is_err());
        channel.fail_writes(true);
        assert!(channel.write_all(b"x").is_err());
    }
}

//! Non-blocking line decoder
//!
//! Turns the raw byte stream into at most one decoded line per poll. Lines
//! are ASCII, newline terminated, and are either a command token or a list of
//! `KEY:VALUE` pairs separated by commas.

use std::io::Read;

use super::{ByteChannel, Command, FrameKey, ProtocolError, TelemetryFrame, HIGH_WATER_MARK};

/// Output of one successfully decoded line
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedLine {
    /// A telemetry line
    Frame(TelemetryFrame),
    /// A controller command
    Command(Command),
}

/// Decoder counters, for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Lines that produced a frame or a command
    pub lines_decoded: u64,
    /// Lines that produced nothing
    pub lines_ignored: u64,
    /// Key/value pairs dropped for a missing colon, unknown key or bad number
    pub pairs_dropped: u64,
    /// Times pending input was discarded for exceeding the high-water mark
    pub overflows: u64,
    /// Total bytes read from the channel
    pub bytes_read: u64,
}

/// Stateful line decoder holding the partial line between polls
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
    stats: DecoderStats,
}

impl LineDecoder {
    /// Decoder with an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder counters so far
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Bytes of an incomplete line held between polls
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Drop any partial line, e.g. after the link was lost
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Consume what the channel has available and decode at most one line
    ///
    /// Never waits for more data. When the pending input (channel plus the
    /// held partial line) exceeds [`HIGH_WATER_MARK`] it is all discarded and
    /// decoding restarts from the next bytes to arrive; the in-flight message
    /// is sacrificed to keep latency bounded.
    pub fn poll<C: ByteChannel + ?Sized>(
        &mut self,
        channel: &mut C,
    ) -> Result<Option<DecodedLine>, ProtocolError> {
        let available = channel.bytes_to_read()? as usize;

        if available + self.buffer.len() > HIGH_WATER_MARK {
            channel.clear_input_buffer()?;
            self.buffer.clear();
            self.stats.overflows += 1;
            tracing::debug!(available, "receive buffer over high-water mark, discarded");
            return Ok(None);
        }

        if available > 0 {
            let start = self.buffer.len();
            self.buffer.resize(start + available, 0);
            let n = channel.read(&mut self.buffer[start..])?;
            self.buffer.truncate(start + n);
            self.stats.bytes_read += n as u64;
        }

        let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') else {
            return Ok(None);
        };

        let raw: Vec<u8> = self.buffer.drain(..=newline).collect();
        let text = String::from_utf8_lossy(&raw);
        let (decoded, dropped) = parse_line_counted(&text);
        self.stats.pairs_dropped += dropped;
        match decoded {
            Some(line) => {
                self.stats.lines_decoded += 1;
                Ok(Some(line))
            }
            None => {
                self.stats.lines_ignored += 1;
                Ok(None)
            }
        }
    }
}

/// Decode one line of text
///
/// Command tokens are matched first. Anything else is split into
/// comma-separated pairs; a pair with no colon, an unknown key or a
/// non-numeric value is dropped on its own without affecting the rest of the
/// line. Returns `None` when nothing usable remains.
pub fn parse_line(line: &str) -> Option<DecodedLine> {
    parse_line_counted(line).0
}

fn parse_line_counted(line: &str) -> (Option<DecodedLine>, u64) {
    let line = line.trim();
    if line.is_empty() {
        return (None, 0);
    }

    if let Some(command) = parse_command(line) {
        return (command.map(DecodedLine::Command), 0);
    }

    let mut frame = TelemetryFrame::default();
    let mut fields = 0usize;
    let mut dropped = 0u64;

    for pair in line.split(',') {
        let Some((key, value)) = pair.split_once(':') else {
            dropped += 1;
            continue;
        };
        let Ok(key) = key.trim().parse::<FrameKey>() else {
            tracing::trace!(key = key.trim(), "unknown telemetry key");
            dropped += 1;
            continue;
        };
        let Some(value) = parse_number(value) else {
            dropped += 1;
            continue;
        };
        frame.set(key, value);
        fields += 1;
    }

    if fields == 0 {
        return (None, dropped);
    }
    (Some(DecodedLine::Frame(frame)), dropped)
}

/// Parse a numeric value, rejecting `nan` and `inf` spellings
fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Recognize command tokens
///
/// `None` means the line is not a command; `Some(None)` means it was a
/// command whose payload could not be used.
fn parse_command(line: &str) -> Option<Option<Command>> {
    if line.starts_with("INIT_REQUEST:PERSISTENT_DATA") {
        return Some(Some(Command::InitRequest));
    }
    if line.starts_with("RESET_TRIP:") {
        return Some(Some(Command::ResetTrip));
    }
    if line.starts_with("STYLE_CHANGE:") {
        return Some(Some(Command::StyleChange));
    }
    if let Some(payload) = line.strip_prefix("SAVE_DATA:") {
        return Some(parse_save_data(payload));
    }
    None
}

fn parse_save_data(payload: &str) -> Option<Command> {
    let mut parts = payload.split(',');
    let fuel_used = parts.next().and_then(parse_number);
    let fuel_used_secondary = match parts.next() {
        Some(v) => parse_number(v),
        None => Some(0.0),
    };

    match (fuel_used, fuel_used_secondary) {
        (Some(fuel_used), Some(fuel_used_secondary)) => Some(Command::SaveData {
            fuel_used,
            fuel_used_secondary,
        }),
        _ => {
            tracing::warn!(payload, "unparseable SAVE_DATA payload");
            None
        }
    }
}

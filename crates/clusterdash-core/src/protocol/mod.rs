//! Serial Line Protocol
//!
//! Implements the newline-terminated ASCII protocol spoken by the cluster's
//! microcontroller: `KEY:VALUE` telemetry pairs, command tokens, and the two
//! outbound resynchronization messages.

mod decoder;
mod error;
mod frame;
mod outbound;
/// Serial port discovery and setup
pub mod serial;
/// Byte channels over serial or memory
pub mod stream;

pub use decoder::{parse_line, DecodedLine, DecoderStats, LineDecoder};
pub use error::ProtocolError;
pub use frame::{Command, FrameKey, SwitchFlags, TelemetryFrame};
pub use outbound::OutboundMessage;
pub use serial::{find_device_port, list_ports, open_port, PortInfo};
pub use stream::{ByteChannel, MemoryChannel, SerialChannel};

/// Default baud rate for the cluster link
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Transport read timeout in milliseconds
///
/// Only governs the serial driver's own blocking reads; the decoder never
/// reads more than what is already buffered.
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Pending-byte threshold above which buffered input is discarded
pub const HIGH_WATER_MARK: usize = 1000;

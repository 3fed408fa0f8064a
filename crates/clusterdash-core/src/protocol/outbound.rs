//! Messages written back to the controller

use std::fmt;
use std::io::Write;

use super::{ByteChannel, ProtocolError};

/// Outbound resynchronization messages
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutboundMessage {
    /// `INIT_DATA:<fuel_used>,<fuel_used_secondary>` with four decimals
    InitData {
        fuel_used: f64,
        fuel_used_secondary: f64,
    },
    /// `AVG_MPG_UPDATE:<mpg>` with one decimal
    AvgMpgUpdate(f64),
}

impl fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutboundMessage::InitData {
                fuel_used,
                fuel_used_secondary,
            } => write!(f, "INIT_DATA:{:.4},{:.4}", fuel_used, fuel_used_secondary),
            OutboundMessage::AvgMpgUpdate(mpg) => write!(f, "AVG_MPG_UPDATE:{:.1}", mpg),
        }
    }
}

impl OutboundMessage {
    /// Wire form, newline terminated
    pub fn encode(&self) -> String {
        format!("{}\n", self)
    }

    /// Write the message to the channel
    pub fn send(&self, channel: &mut dyn ByteChannel) -> Result<(), ProtocolError> {
        channel.write_all(self.encode().as_bytes())?;
        channel.flush()?;
        Ok(())
    }
}

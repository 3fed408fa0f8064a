//! Link lifecycle
//!
//! Owns the byte channel and its decoder and tracks whether the controller
//! has ever been seen. A read failure drops the channel and moves to
//! [`ConnectionState::Lost`]; nothing reconnects automatically.

use std::io::Write;

use crate::protocol::{
    ByteChannel, DecodedLine, DecoderStats, LineDecoder, OutboundMessage, ProtocolError,
};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No controller since startup; the dashboard runs the demo sweep
    #[default]
    NeverConnected,
    /// Receiving from the controller
    Connected,
    /// Was connected, link failed; readings stay frozen
    Lost,
}

impl ConnectionState {
    /// Whether a controller is currently attached
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

/// The controller link
#[derive(Default)]
pub struct Link {
    channel: Option<Box<dyn ByteChannel>>,
    decoder: LineDecoder,
    state: ConnectionState,
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("attached", &self.channel.is_some())
            .field("decoder", &self.decoder)
            .field("state", &self.state)
            .finish()
    }
}

impl Link {
    /// A link that has never been attached
    pub fn new() -> Self {
        Self::default()
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether a channel is attached and healthy
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Decoder counters since the last attach
    pub fn decoder_stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    /// Start using `channel`
    pub fn attach(&mut self, channel: Box<dyn ByteChannel>) {
        self.decoder.reset();
        self.channel = Some(channel);
        self.state = ConnectionState::Connected;
        tracing::info!("controller link attached");
    }

    /// Decode at most one line; a transport error marks the link lost
    pub fn poll(&mut self) -> Option<DecodedLine> {
        let channel = self.channel.as_mut()?;
        match self.decoder.poll(channel.as_mut()) {
            Ok(line) => line,
            Err(e) => {
                self.lose(&e);
                None
            }
        }
    }

    /// Run a write against the channel
    ///
    /// Write failures are logged only; a dead link shows up on the next read.
    pub fn write_with<F>(&mut self, what: &str, f: F)
    where
        F: FnOnce(&mut dyn ByteChannel) -> Result<(), ProtocolError>,
    {
        let Some(channel) = self.channel.as_mut() else {
            tracing::debug!(what, "not connected, nothing sent");
            return;
        };
        if let Err(e) = f(channel.as_mut()) {
            tracing::warn!(what, error = %e, "failed to write to controller");
        }
    }

    /// Send one message, see [`write_with`](Self::write_with)
    pub fn send(&mut self, message: OutboundMessage) {
        self.write_with("message", |channel| message.send(channel));
    }

    /// Drop the channel after a transport failure
    pub fn lose(&mut self, error: &ProtocolError) {
        if self.channel.take().is_some() {
            tracing::warn!(error = %error, "controller link lost, freezing readings");
        }
        self.decoder.reset();
        if self.state == ConnectionState::Connected {
            self.state = ConnectionState::Lost;
        }
    }

    /// Close the channel at shutdown, keeping the state for reporting
    pub fn close(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            if let Err(e) = channel.flush() {
                tracing::debug!(error = %e, "flush on close failed");
            }
        }
    }
}

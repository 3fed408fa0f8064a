//! Protocol errors

use thiserror::Error;

/// Errors that can occur on the serial link
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Serial port could not be opened or configured
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// Read or write on the link failed
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serialport::Error> for ProtocolError {
    fn from(e: serialport::Error) -> Self {
        ProtocolError::SerialError(e.to_string())
    }
}

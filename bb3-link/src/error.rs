//! Error types for the BB3 link layer

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// BB3 link error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error on the underlying connection
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device did not answer within the read timeout
    #[error("Communication timeout")]
    Timeout,

    /// The device closed the connection mid-exchange
    #[error("Connection closed by device")]
    Disconnected,

    /// Response does not match the expected format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Binary block declared more payload bytes than the stream carried
    #[error("Truncated block: declared {declared} bytes, got {available}")]
    Truncated {
        /// Payload length announced by the block header
        declared: usize,
        /// Bytes actually available
        available: usize,
    },

    /// A numeric reply failed to parse
    #[error("Invalid number in reply: {0:?}")]
    InvalidNumber(String),
}

//! Error types for stepwire.

use thiserror::Error;

/// Main error type for all stepwire operations.
///
/// Mode errors are not represented here: a command that is refused in the
/// current cycle mode is answered on the wire with an `*_ERROR_MODE` response.
#[derive(Debug, Error)]
pub enum StepwireError {
    /// A message field width is outside the supported range.
    #[error("invalid {field} width {width}: {reason}")]
    InvalidWidth {
        field: &'static str,
        width: u32,
        reason: &'static str,
    },

    /// A field value does not fit its declared width.
    #[error("{field} value {value:#x} does not fit in {width} bits")]
    FieldOutOfRange {
        field: &'static str,
        value: u128,
        width: u32,
    },

    /// Frame marker configuration is unusable.
    #[error("invalid frame markers: {0}")]
    InvalidMarkers(String),

    /// Queue or memory depth must be at least 1.
    #[error("depth must be at least 1")]
    ZeroDepth,

    /// I/O error on the byte stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON configuration could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The byte stream closed before a response arrived.
    #[error("Connection closed")]
    ConnectionClosed,

    /// No response frame arrived within the host timeout.
    #[error("Timed out waiting for response")]
    Timeout,

    /// A response opcode outside the response table was received.
    #[error("Unexpected response opcode: {0}")]
    UnexpectedResponse(u8),
}

/// Result type alias using StepwireError.
pub type Result<T> = std::result::Result<T, StepwireError>;

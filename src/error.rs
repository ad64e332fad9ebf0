//! Error types for xgb-sim.

use thiserror::Error;

use crate::store::MemoryArea;

/// Main error type for all emulator operations.
#[derive(Debug, Error)]
pub enum XgbError {
    /// Device address text that cannot be parsed.
    #[error("invalid device address: {0:?}")]
    InvalidAddress(String),

    /// Area selector letter outside P/Q/M/D.
    #[error("unsupported memory area: {0:?}")]
    UnsupportedArea(char),

    /// Access past the end of an area's register buffer.
    #[error("range {start}..{end} out of bounds for area {area} (capacity {capacity})")]
    OutOfRange {
        area: MemoryArea,
        start: usize,
        end: usize,
        capacity: usize,
    },

    /// Frame too short or structurally invalid for the field being read.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Command class the protocol names but the device does not serve.
    #[error("unimplemented command class: {0}")]
    Unimplemented(String),

    /// Persistence blob whose size does not match the data pool layout.
    #[error("malformed snapshot: expected {expected} bytes, got {actual}")]
    MalformedSnapshot { expected: usize, actual: usize },

    /// I/O error during socket or file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port error from the Cnet link.
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// Configuration that failed to deserialize.
    #[error("config parse error: {0}")]
    ConfigParse(String),
}

/// Result type alias using XgbError.
pub type Result<T> = std::result::Result<T, XgbError>;

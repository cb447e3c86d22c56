//! Error types for mystrix-core.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HID device communication failure.
    #[error("HID error: {0}")]
    Hid(String),

    /// Device not found during enumeration.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// Control identifier is not a `row/column` pair inside the grid.
    #[error("invalid control id: {0:?}")]
    InvalidControlId(String),

    /// Color string could not be parsed.
    #[error("invalid color: {0:?}")]
    InvalidColor(String),

    /// Value out of safe range.
    #[error("value out of range: {field} = {value} (allowed {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// Configuration file could not be read or is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// The session task has shut down.
    #[error("session closed")]
    SessionClosed,
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;

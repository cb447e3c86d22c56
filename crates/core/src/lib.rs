//! mystrix-core: raw HID protocol and device session for the 203 Systems
//! Mystrix grid controller.
//!
//! This crate tracks the panel's activity state, keeps a shadow buffer of
//! the last color sent to every key, sends only the writes that change
//! something, and replays the buffer after the panel wakes.

pub mod cache;
pub mod config;
pub mod device;
pub mod error;
pub mod grid;
pub mod protocol;
pub mod runtime;
pub mod safety;
pub mod session;
pub mod surface;
pub mod transport;

/// 203 Systems USB Vendor ID.
pub const SYSTEMS_203_VID: u16 = 0x0203;

/// Mystrix USB and HID interface identifiers.
pub mod ids {
    /// Mystrix product ID, after masking with [`MYSTRIX_PID_MASK`].
    pub const MYSTRIX_PID: u16 = 0x1040;
    /// The low six bits of the product ID vary between units.
    pub const MYSTRIX_PID_MASK: u16 = 0xFFC0;
    /// Vendor-defined usage page of the raw HID interface.
    pub const RAW_HID_USAGE_PAGE: u16 = 0xFF00;
    pub const RAW_HID_USAGE: u16 = 0x01;
}

/// Number of button rows.
pub const ROWS: usize = 8;
/// Number of button columns.
pub const COLUMNS: usize = 8;
/// Total number of buttons.
pub const CONTROL_COUNT: usize = ROWS * COLUMNS;

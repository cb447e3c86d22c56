//! Safety layer: validates write parameters against the panel's known ranges
//! before anything is sent to the device.
//!
//! # Mystrix bounds
//!
//! ## Grid
//! - **Size**: 8 rows by 8 columns, zero-based
//! - **Wire order**: column byte first, then row byte
//!
//! ## Brightness
//! - **Range**: 0 – 100 percent, sent as a single byte
//!
//! ## Safety invariants
//! 1. No `SetKeyColor` command is ever built for a coordinate outside the grid
//! 2. Brightness values coming from user input are checked before encoding

use crate::error::{Error, Result};
use crate::{COLUMNS, ROWS};

/// Highest accepted brightness percentage.
pub const BRIGHTNESS_MAX: u8 = 100;

/// Validate a brightness percentage.
pub fn validate_brightness(percent: u32) -> Result<u8> {
    if percent > BRIGHTNESS_MAX as u32 {
        return Err(Error::OutOfRange {
            field: "brightness",
            value: percent,
            min: 0,
            max: BRIGHTNESS_MAX as u32,
        });
    }
    Ok(percent as u8)
}

/// Validate a zero-based column index.
pub fn validate_column(column: usize) -> Result<u8> {
    if column >= COLUMNS {
        return Err(Error::OutOfRange {
            field: "column",
            value: column as u32,
            min: 0,
            max: (COLUMNS - 1) as u32,
        });
    }
    Ok(column as u8)
}

/// Validate a zero-based row index.
pub fn validate_row(row: usize) -> Result<u8> {
    if row >= ROWS {
        return Err(Error::OutOfRange {
            field: "row",
            value: row as u32,
            min: 0,
            max: (ROWS - 1) as u32,
        });
    }
    Ok(row as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_brightness_in_range() {
        assert_eq!(validate_brightness(0).unwrap(), 0);
        assert_eq!(validate_brightness(55).unwrap(), 55);
        assert_eq!(validate_brightness(100).unwrap(), 100);
    }

    #[test]
    fn validate_brightness_rejects_out_of_range() {
        assert!(validate_brightness(101).is_err());
        assert!(validate_brightness(255).is_err());
        assert!(validate_brightness(1000).is_err());
    }

    #[test]
    fn validate_grid_indices_in_range() {
        for i in 0..8 {
            assert_eq!(validate_column(i).unwrap(), i as u8);
            assert_eq!(validate_row(i).unwrap(), i as u8);
        }
    }

    #[test]
    fn validate_grid_indices_out_of_range() {
        assert!(validate_column(8).is_err());
        assert!(validate_row(8).is_err());
        assert!(validate_row(200).is_err());
    }
}

//! Grid coordinates, colors, and the `row/column` control identifiers the
//! host uses to address individual buttons.

use crate::error::{Error, Result};
use crate::safety;
use serde::{Deserialize, Serialize};

/// A validated position on the button grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoord {
    column: u8,
    row: u8,
}

impl GridCoord {
    /// Build a coordinate, rejecting positions outside the grid.
    pub fn new(column: usize, row: usize) -> Result<Self> {
        Ok(Self {
            column: safety::validate_column(column)?,
            row: safety::validate_row(row)?,
        })
    }

    pub fn column(&self) -> u8 {
        self.column
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    /// Every coordinate in row-major order (row outer, column inner).
    pub fn all() -> impl Iterator<Item = GridCoord> {
        (0..crate::ROWS as u8).flat_map(|row| {
            (0..crate::COLUMNS as u8).map(move |column| GridCoord { column, row })
        })
    }

    /// Host-facing identifier for this button.
    pub fn control_id(&self) -> String {
        create_control_id(self.column, self.row)
    }
}

impl std::fmt::Display for GridCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.row, self.column)
    }
}

/// Encode a column/row pair as a control identifier (`"{row}/{column}"`).
///
/// Not bounds-checked: inbound key reports are forwarded exactly as received.
pub fn create_control_id(column: u8, row: u8) -> String {
    format!("{row}/{column}")
}

/// Decode a `"{row}/{column}"` control identifier into a grid coordinate.
pub fn parse_control_id(control_id: &str) -> Result<GridCoord> {
    let invalid = || Error::InvalidControlId(control_id.to_string());

    let (row, column) = control_id.split_once('/').ok_or_else(invalid)?;
    let row: usize = row.trim().parse().map_err(|_| invalid())?;
    let column: usize = column.trim().parse().map_err(|_| invalid())?;

    GridCoord::new(column, row).map_err(|_| invalid())
}

/// An RGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn is_black(&self) -> bool {
        *self == Self::BLACK
    }

    /// Parse a host color string.
    ///
    /// Accepts `#rrggbb`, `rrggbb`, `#rgb` and `rgb(r, g, b)`.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidColor(input.to_string());
        let s = input.trim();

        if let Some(inner) = s
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let channels = inner
                .split(',')
                .map(|c| c.trim().parse::<u8>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| invalid())?;
            return match channels.as_slice() {
                [r, g, b] => Ok(Self::new(*r, *g, *b)),
                _ => Err(invalid()),
            };
        }

        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };

        match hex.len() {
            6 => Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            // Shorthand: each nibble is doubled (#f80 == #ff8800)
            3 => Ok(Self::new(
                channel(0..1)? * 17,
                channel(1..2)? * 17,
                channel(2..3)? * 17,
            )),
            _ => Err(invalid()),
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_id_is_row_then_column() {
        assert_eq!(create_control_id(3, 2), "2/3");
        assert_eq!(GridCoord::new(7, 0).unwrap().control_id(), "0/7");
    }

    #[test]
    fn parse_control_id_maps_row_and_column() {
        let coord = parse_control_id("2/3").unwrap();
        assert_eq!(coord.row(), 2);
        assert_eq!(coord.column(), 3);
    }

    #[test]
    fn parse_control_id_rejects_malformed() {
        assert!(parse_control_id("").is_err());
        assert!(parse_control_id("3").is_err());
        assert!(parse_control_id("a/b").is_err());
        assert!(parse_control_id("1/2/3").is_err());
        assert!(parse_control_id("-1/2").is_err());
    }

    #[test]
    fn parse_control_id_rejects_out_of_grid() {
        assert!(parse_control_id("8/0").is_err());
        assert!(parse_control_id("0/8").is_err());
    }

    #[test]
    fn all_coordinates_are_row_major() {
        let coords: Vec<_> = GridCoord::all().collect();
        assert_eq!(coords.len(), crate::CONTROL_COUNT);
        assert_eq!(coords[0], GridCoord::new(0, 0).unwrap());
        assert_eq!(coords[1], GridCoord::new(1, 0).unwrap());
        assert_eq!(coords[8], GridCoord::new(0, 1).unwrap());
        assert_eq!(coords[63], GridCoord::new(7, 7).unwrap());
    }

    #[test]
    fn color_parse_hex_forms() {
        assert_eq!(Color::parse("#ff0000").unwrap(), Color::new(255, 0, 0));
        assert_eq!(Color::parse("00FF7f").unwrap(), Color::new(0, 255, 127));
        assert_eq!(Color::parse("#f80").unwrap(), Color::new(255, 136, 0));
    }

    #[test]
    fn color_parse_rgb_function() {
        assert_eq!(
            Color::parse("rgb(12, 34, 56)").unwrap(),
            Color::new(12, 34, 56)
        );
    }

    #[test]
    fn color_parse_rejects_garbage() {
        assert!(Color::parse("").is_err());
        assert!(Color::parse("#12345").is_err());
        assert!(Color::parse("#gg0000").is_err());
        assert!(Color::parse("rgb(1, 2)").is_err());
        assert!(Color::parse("rgb(1, 2, 300)").is_err());
        assert!(Color::parse("#ééé").is_err());
    }

    #[test]
    fn color_display_is_hex() {
        assert_eq!(Color::new(255, 0, 16).to_string(), "#ff0010");
        assert!(Color::BLACK.is_black());
        assert!(!Color::new(0, 0, 1).is_black());
    }
}

//! Mystrix raw HID protocol encoding and decoding.
//!
//! Every report, in either direction, starts with the command prefix `0xFF`
//! followed by an opcode byte:
//!
//! | Direction | Bytes                          | Meaning                     |
//! |-----------|--------------------------------|-----------------------------|
//! | in        | `FF 01 <0/1>`                 | activity state report       |
//! | in        | `FF 10 <col> <row> <0/1>`     | button release / press      |
//! | out       | `FF 01`                       | inquire activity state      |
//! | out       | `FF 21`                       | clear panel                 |
//! | out       | `FF 20 <col> <row> <r> <g> <b>` | set one key's color       |
//! | out       | `FF 30 <percent>`             | set global brightness       |

use crate::grid::{Color, GridCoord};

/// First byte of every report.
pub const COMMAND_PREFIX: u8 = 0xFF;

/// Opcodes (second byte of every report).
pub mod opcodes {
    /// Activity state: inbound report, or outbound inquiry.
    pub const ACTIVITY: u8 = 0x01;
    /// Inbound button press/release.
    pub const KEY_EVENT: u8 = 0x10;
    /// Set a single key's color.
    pub const SET_KEY_COLOR: u8 = 0x20;
    /// Turn every key off.
    pub const CLEAR_PANEL: u8 = 0x21;
    /// Global LED brightness.
    pub const SET_BRIGHTNESS: u8 = 0x30;
}

/// An outbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Ask the device to report whether it is active.
    InquireActivity,
    /// Set every key to black.
    ClearPanel,
    /// Set one key's color.
    SetKeyColor { coord: GridCoord, color: Color },
    /// Set global brightness (percent).
    SetBrightness(u8),
}

impl Command {
    /// Encode into raw report bytes.
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            Self::InquireActivity => vec![COMMAND_PREFIX, opcodes::ACTIVITY],
            Self::ClearPanel => vec![COMMAND_PREFIX, opcodes::CLEAR_PANEL],
            Self::SetKeyColor { coord, color } => vec![
                COMMAND_PREFIX,
                opcodes::SET_KEY_COLOR,
                coord.column(),
                coord.row(),
                color.r,
                color.g,
                color.b,
            ],
            Self::SetBrightness(percent) => {
                vec![COMMAND_PREFIX, opcodes::SET_BRIGHTNESS, percent]
            }
        }
    }

    /// Short name used in log output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InquireActivity => "inquire-activity",
            Self::ClearPanel => "clear-panel",
            Self::SetKeyColor { .. } => "set-key-color",
            Self::SetBrightness(_) => "set-brightness",
        }
    }
}

/// A decoded inbound report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    /// The panel became active (powered/attentive) or inactive.
    Activity { active: bool },
    /// A button changed state. Coordinates are raw and unvalidated.
    Key { column: u8, row: u8, pressed: bool },
}

impl Report {
    /// Decode a raw inbound report.
    ///
    /// Returns `None` for anything that is not a known, complete report;
    /// unknown reports are not errors.
    pub fn decode(data: &[u8]) -> Option<Self> {
        match data {
            [COMMAND_PREFIX, opcodes::ACTIVITY, state, ..] => Some(Self::Activity {
                active: *state != 0,
            }),
            [COMMAND_PREFIX, opcodes::KEY_EVENT, column, row, pressed, ..] => Some(Self::Key {
                column: *column,
                row: *row,
                pressed: *pressed != 0,
            }),
            _ => None,
        }
    }
}

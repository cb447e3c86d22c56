//! Host-facing surface metadata and the callback interface the host hands
//! to each session.

use crate::error::Error;
use crate::grid::GridCoord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Product name reported to the host.
pub const PRODUCT_NAME: &str = "203 Systems Mystrix";

/// Callbacks into the host, one context per opened surface.
pub trait SurfaceContext: Send + Sync {
    /// A button was pressed.
    fn key_down_by_id(&self, control_id: &str);
    /// A button was released.
    fn key_up_by_id(&self, control_id: &str);
    /// The handle is unusable; the host should tear the surface down.
    fn disconnect(&self, error: &Error);
}

/// A host draw request for one control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawProps {
    pub control_id: String,
    /// Host color string; `None` draws black.
    #[serde(default)]
    pub color: Option<String>,
}

impl DrawProps {
    pub fn new(control_id: impl Into<String>, color: Option<&str>) -> Self {
        Self {
            control_id: control_id.into(),
            color: color.map(str::to_string),
        }
    }
}

/// How the host should encode colors for a style preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorFormat {
    Hex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StylePreset {
    pub colors: ColorFormat,
}

/// Position of a single control on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPosition {
    pub row: u8,
    pub column: u8,
}

/// Surface layout: one control per grid cell, keyed by control id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceLayout {
    pub style_presets: BTreeMap<String, StylePreset>,
    pub controls: BTreeMap<String, ControlPosition>,
}

impl SurfaceLayout {
    /// The Mystrix layout: an 8x8 grid of color-only buttons.
    pub fn mystrix() -> Self {
        let style_presets = BTreeMap::from([(
            "default".to_string(),
            StylePreset {
                colors: ColorFormat::Hex,
            },
        )]);

        let controls = GridCoord::all()
            .map(|coord| {
                (
                    coord.control_id(),
                    ControlPosition {
                        row: coord.row(),
                        column: coord.column(),
                    },
                )
            })
            .collect();

        Self {
            style_presets,
            controls,
        }
    }
}

/// Properties registered with the host when a surface is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterProps {
    pub brightness: bool,
    pub surface_layout: SurfaceLayout,
    pub pincode_map: Option<serde_json::Value>,
    pub config_fields: Option<serde_json::Value>,
    pub location: Option<serde_json::Value>,
}

impl RegisterProps {
    pub fn mystrix() -> Self {
        Self {
            brightness: true,
            surface_layout: SurfaceLayout::mystrix(),
            pincode_map: None,
            config_fields: None,
            location: None,
        }
    }
}

/// A recording host context for testing.
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum HostEvent {
        KeyDown(String),
        KeyUp(String),
        Disconnect(String),
    }

    #[derive(Default)]
    pub struct RecordingContext {
        events: Mutex<Vec<HostEvent>>,
    }

    impl RecordingContext {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<HostEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl SurfaceContext for RecordingContext {
        fn key_down_by_id(&self, control_id: &str) {
            self.events
                .lock()
                .unwrap()
                .push(HostEvent::KeyDown(control_id.to_string()));
        }

        fn key_up_by_id(&self, control_id: &str) {
            self.events
                .lock()
                .unwrap()
                .push(HostEvent::KeyUp(control_id.to_string()));
        }

        fn disconnect(&self, error: &Error) {
            self.events
                .lock()
                .unwrap()
                .push(HostEvent::Disconnect(error.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_has_one_control_per_cell() {
        let layout = SurfaceLayout::mystrix();
        assert_eq!(layout.controls.len(), crate::CONTROL_COUNT);
        assert_eq!(
            layout.controls.get("2/5"),
            Some(&ControlPosition { row: 2, column: 5 })
        );
    }

    #[test]
    fn layout_serializes_in_host_naming() {
        let json = serde_json::to_value(SurfaceLayout::mystrix()).expect("serialize layout");
        assert_eq!(json["stylePresets"]["default"]["colors"], "hex");
        assert_eq!(json["controls"]["7/0"]["row"], 7);
        assert_eq!(json["controls"]["7/0"]["column"], 0);
    }

    #[test]
    fn draw_props_accept_missing_color() {
        let props: DrawProps =
            serde_json::from_str(r#"{"controlId":"1/4"}"#).expect("deserialize draw props");
        assert_eq!(props, DrawProps::new("1/4", None));
    }

    #[test]
    fn register_props_enable_brightness() {
        let json = serde_json::to_value(RegisterProps::mystrix()).expect("serialize props");
        assert_eq!(json["brightness"], true);
        assert!(json["pincodeMap"].is_null());
        assert!(json["surfaceLayout"]["controls"].is_object());
    }
}

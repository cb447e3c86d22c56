//! Device session: the protocol state machine for one opened panel.
//!
//! The session owns the write half of the HID handle, the color cache and
//! the activity flag. It is driven sequentially, either directly (tests,
//! one-shot CLI commands) or from the task in [`crate::runtime`].
//!
//! States are `Inactive` (initial) and `Active`, driven only by inbound
//! activity reports. Draws while inactive update the cache but skip the
//! write, so the refresh after the next wake replays the right colors.

use crate::cache::ColorCache;
use crate::error::{Error, Result};
use crate::grid::{create_control_id, parse_control_id, Color, GridCoord};
use crate::protocol::{Command, Report};
use crate::surface::{SurfaceContext, PRODUCT_NAME};
use crate::transport::{send_command, HidTransport};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// What handling an inbound report did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Not a known report.
    Ignored,
    /// Inactive → Active. The caller must schedule [`DeviceSession::refresh_panel`].
    Activated,
    /// Active → Inactive.
    Deactivated,
    /// Activity report that repeated the current state.
    Unchanged,
    /// A key event was forwarded to the host.
    Key { control_id: String, pressed: bool },
}

impl ReportOutcome {
    pub fn needs_refresh(&self) -> bool {
        matches!(self, Self::Activated)
    }
}

pub struct DeviceSession {
    surface_id: String,
    transport: Box<dyn HidTransport>,
    context: Arc<dyn SurfaceContext>,
    cache: ColorCache,
    active: bool,
}

impl DeviceSession {
    pub fn new(
        surface_id: impl Into<String>,
        transport: Box<dyn HidTransport>,
        context: Arc<dyn SurfaceContext>,
    ) -> Self {
        Self {
            surface_id: surface_id.into(),
            transport,
            context,
            cache: ColorCache::new(),
            active: false,
        }
    }

    pub fn surface_id(&self) -> &str {
        &self.surface_id
    }

    pub fn product_name(&self) -> &'static str {
        PRODUCT_NAME
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn cache(&self) -> &ColorCache {
        &self.cache
    }

    /// Ask the device for its activity state, then blank.
    ///
    /// Does not wait for the activity report; it arrives through
    /// [`handle_report`](Self::handle_report) like any other.
    pub fn init(&mut self) -> Result<()> {
        send_command(self.transport.as_ref(), &Command::InquireActivity)?;
        self.blank()
    }

    /// Reset the cache to black and, if the panel is active, clear it.
    pub fn blank(&mut self) -> Result<()> {
        self.cache.reset();

        if !self.active {
            debug!("Panel inactive, blank applied to cache only");
            return Ok(());
        }

        send_command(self.transport.as_ref(), &Command::ClearPanel)
    }

    /// Draw a host color string (`None` = black) on a `row/column` control.
    pub fn draw(&mut self, control_id: &str, color: Option<&str>) -> Result<()> {
        let color = color.map(Color::parse).transpose()?.unwrap_or(Color::BLACK);
        let coord = parse_control_id(control_id)?;
        self.draw_color(coord, color);
        Ok(())
    }

    /// Draw an already-decoded color.
    pub fn draw_color(&mut self, coord: GridCoord, color: Color) {
        self.write_key_color(coord, color, false);
    }

    /// Set global brightness. Failures are logged, not returned.
    pub fn set_brightness(&self, percent: u8) {
        if let Err(e) = send_command(self.transport.as_ref(), &Command::SetBrightness(percent)) {
            error!(percent, error = %e, "Failed to set brightness");
        }
    }

    /// Apply one inbound report.
    pub fn handle_report(&mut self, data: &[u8]) -> ReportOutcome {
        trace!(report_hex = format_args!("{:02X?}", data), "RX");

        match Report::decode(data) {
            Some(Report::Activity { active }) => {
                let was_active = std::mem::replace(&mut self.active, active);
                match (was_active, active) {
                    (false, true) => {
                        info!("Panel became active");
                        ReportOutcome::Activated
                    }
                    (true, false) => {
                        info!("Panel became inactive");
                        ReportOutcome::Deactivated
                    }
                    _ => ReportOutcome::Unchanged,
                }
            }
            Some(Report::Key {
                column,
                row,
                pressed,
            }) => {
                let control_id = create_control_id(column, row);
                debug!(control_id = %control_id, pressed, "Key event");
                if pressed {
                    self.context.key_down_by_id(&control_id);
                } else {
                    self.context.key_up_by_id(&control_id);
                }
                ReportOutcome::Key {
                    control_id,
                    pressed,
                }
            }
            None => {
                trace!("Ignoring unknown report");
                ReportOutcome::Ignored
            }
        }
    }

    /// Re-sync the physical panel with the cache after a wake.
    ///
    /// Clears the panel, then force-writes every non-black entry in
    /// row-major order.
    pub fn refresh_panel(&mut self) -> Result<()> {
        if !self.active {
            debug!("Panel went inactive before refresh, skipping");
            return Ok(());
        }

        send_command(self.transport.as_ref(), &Command::ClearPanel)?;

        let lit: Vec<(GridCoord, Color)> = self.cache.lit().collect();
        debug!(keys = lit.len(), "Replaying cached colors");
        for (coord, color) in lit {
            self.write_key_color(coord, color, true);
        }
        Ok(())
    }

    /// Fatal error raised by the handle itself: log and ask the host to
    /// disconnect the surface.
    pub fn handle_hardware_error(&self, error: &Error) {
        error!(error = %error, "HID device error");
        self.context.disconnect(error);
    }

    /// Best-effort blank then release the handle. Never fails.
    pub fn close(&mut self) {
        if let Err(e) = self.blank() {
            debug!(error = %e, "Blank on close failed");
        }
        if let Err(e) = self.transport.close() {
            debug!(error = %e, "Closing HID handle failed");
        }
    }

    fn write_key_color(&mut self, coord: GridCoord, color: Color, forced: bool) {
        if !self.active {
            self.cache.set(coord, color);
            return;
        }

        if !forced && self.cache.get(coord) == color {
            return;
        }

        self.cache.set(coord, color);

        let command = Command::SetKeyColor { coord, color };
        if let Err(e) = send_command(self.transport.as_ref(), &command) {
            warn!(key = %coord, color = %color, error = %e, "Failed to set key color");
        }
    }
}

//! mystrix CLI: drive a 203 Systems Mystrix panel from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mystrix_core::config::SessionConfig;
use mystrix_core::device::{discover_devices, HidReader, HidapiTransport};
use mystrix_core::error::Error;
use mystrix_core::grid::{Color, GridCoord};
use mystrix_core::runtime::{spawn_session, SessionHandle};
use mystrix_core::session::DeviceSession;
use mystrix_core::surface::{DrawProps, RegisterProps, SurfaceContext};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// What the session reports back to the CLI.
enum PanelEvent {
    KeyDown(String),
    KeyUp(String),
    Disconnected(String),
}

struct CliContext {
    events: mpsc::UnboundedSender<PanelEvent>,
}

impl CliContext {
    fn forward(&self, event: PanelEvent) {
        if self.events.send(event).is_err() {
            warn!("CLI event loop gone, dropping panel event");
        }
    }
}

impl SurfaceContext for CliContext {
    fn key_down_by_id(&self, control_id: &str) {
        self.forward(PanelEvent::KeyDown(control_id.to_string()));
    }

    fn key_up_by_id(&self, control_id: &str) {
        self.forward(PanelEvent::KeyUp(control_id.to_string()));
    }

    fn disconnect(&self, error: &Error) {
        self.forward(PanelEvent::Disconnected(error.to_string()));
    }
}

/// Open the first Mystrix found and start its session.
async fn open_first_panel(
    config: &SessionConfig,
) -> Result<(SessionHandle, mpsc::UnboundedReceiver<PanelEvent>)> {
    let api = hidapi::HidApi::new().map_err(|e| anyhow::anyhow!("hidapi init: {e}"))?;
    let surfaces = discover_devices(&api);
    let first = surfaces
        .first()
        .ok_or_else(|| anyhow::anyhow!("No Mystrix panel found"))?;

    let transport = HidapiTransport::open(&api, &first.device)?;
    let reader = HidReader::open(&api, &first.device, config)?;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let session = DeviceSession::new(
        first.surface_id.clone(),
        Box::new(transport),
        Arc::new(CliContext { events: events_tx }),
    );
    let (handle, _task) = spawn_session(session);
    reader
        .spawn(handle.report_sink())
        .context("spawn HID reader thread")?;

    if let Err(e) = handle.init().await {
        handle.close().await;
        return Err(e.into());
    }
    info!(surface_id = handle.surface_id(), "Opened {}", first.description);
    Ok((handle, events_rx))
}

#[derive(Parser)]
#[command(
    name = "mystrix",
    version,
    about = "Drive a 203 Systems Mystrix grid controller"
)]
struct Cli {
    /// JSON session config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List connected Mystrix panels.
    ListDevices,
    /// Print the surface registration (layout) as JSON.
    Layout,
    /// Open the first panel and print key events until ctrl-c.
    Run {
        /// Color every key on start (e.g. "#102030").
        #[arg(long, value_parser = Color::parse)]
        fill: Option<Color>,
        /// Light a key with this color while it is held.
        #[arg(long, value_parser = Color::parse)]
        highlight: Option<Color>,
        /// Brightness percent (0-100); overrides the config file.
        #[arg(long)]
        brightness: Option<u32>,
    },
}

async fn draw_or_warn(handle: &SessionHandle, control_id: String, color: Option<Color>) {
    let color = color.map(|c| c.to_string());
    if let Err(e) = handle
        .draw(DrawProps::new(control_id.as_str(), color.as_deref()))
        .await
    {
        warn!(control_id = %control_id, error = %e, "Draw failed");
    }
}

async fn run(
    config: &SessionConfig,
    fill: Option<Color>,
    highlight: Option<Color>,
    brightness: Option<u8>,
) -> Result<()> {
    let (handle, mut events) = open_first_panel(config).await?;

    if let Some(percent) = brightness.or(config.brightness) {
        handle.set_brightness(percent);
    }
    if let Some(color) = fill {
        for coord in GridCoord::all() {
            draw_or_warn(&handle, coord.control_id(), Some(color)).await;
        }
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted, closing panel");
                break Ok(());
            }
            event = events.recv() => {
                match event {
                    Some(PanelEvent::KeyDown(id)) => {
                        println!("key down {id}");
                        if highlight.is_some() {
                            draw_or_warn(&handle, id, highlight).await;
                        }
                    }
                    Some(PanelEvent::KeyUp(id)) => {
                        println!("key up   {id}");
                        if highlight.is_some() {
                            draw_or_warn(&handle, id, fill).await;
                        }
                    }
                    Some(PanelEvent::Disconnected(reason)) => {
                        break Err(anyhow::anyhow!("Panel disconnected: {reason}"));
                    }
                    None => break Ok(()),
                }
            }
        }
    };

    handle.close().await;
    outcome
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = SessionConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::ListDevices => {
            let api = hidapi::HidApi::new().map_err(|e| anyhow::anyhow!("hidapi init: {e}"))?;
            let surfaces = discover_devices(&api);
            if surfaces.is_empty() {
                println!("No Mystrix panels found.");
                println!("Ensure the panel is connected and the raw HID interface is accessible.");
            } else {
                for surface in &surfaces {
                    println!(
                        "{} (id: {}, VID: 0x{:04X}, PID: 0x{:04X}, path: {})",
                        surface.description,
                        surface.surface_id,
                        surface.device.vendor_id,
                        surface.device.product_id,
                        surface.device.path
                    );
                }
            }
        }
        Commands::Layout => {
            let json = serde_json::to_string_pretty(&RegisterProps::mystrix())?;
            println!("{json}");
        }
        Commands::Run {
            fill,
            highlight,
            brightness,
        } => {
            let brightness = brightness
                .map(mystrix_core::safety::validate_brightness)
                .transpose()?;
            run(&config, fill, highlight, brightness).await?;
        }
    }

    Ok(())
}

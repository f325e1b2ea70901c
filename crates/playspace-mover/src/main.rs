//! Playspace Mover - grab the play-space with a controller button and drag it around.
//!
//! Runs the mover against the in-process simulated runtime, with a scripted right controller
//! grabbing and circling so the offset pipeline can be watched in the logs.

#![forbid(unsafe_code)]

mod demo;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use playspace_common::MoverConfig;
use playspace_mover::start;
use playspace_vr::sim::{SimConnector, SimHandle, SimulatedEmulator, SimulatedRuntime};
use playspace_vr::ButtonId;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "playspace-mover")]
#[command(about = "Lets you grab your playspace and move it")]
struct Args {
    /// Buttons that trigger the grab on the left controller (128 = X on Touch, 2 = Menu on Vive)
    #[arg(short, long, env = "PLAYSPACE_LEFT_BUTTON_MASK")]
    left_button_mask: Option<u64>,

    /// Buttons that trigger the grab on the right controller (128 = A on Touch, 2 = Menu on Vive)
    #[arg(short, long, env = "PLAYSPACE_RIGHT_BUTTON_MASK")]
    right_button_mask: Option<u64>,

    /// Left grab buttons by name, e.g. `menu,a`. Takes precedence over --left-button-mask
    #[arg(long, value_parser = ButtonId::parse_mask)]
    left_buttons: Option<u64>,

    /// Right grab buttons by name, e.g. `grip`. Takes precedence over --right-button-mask
    #[arg(long, value_parser = ButtonId::parse_mask)]
    right_buttons: Option<u64>,

    /// JSON config file; command line values override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many processed frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Radius of the circle the demo controller moves on, in meters
    #[arg(long, default_value_t = 0.25)]
    demo_radius: f64,

    /// How long the demo grab button stays held, then released, in milliseconds
    #[arg(long, default_value_t = 2000)]
    demo_grab_period_ms: u64,
}

fn load_config(args: &Args) -> Result<MoverConfig> {
    let mut config = match &args.config {
        Some(path) => MoverConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => MoverConfig::default(),
    };

    if let Some(mask) = args.left_buttons.or(args.left_button_mask) {
        config.left_button_mask = mask;
    }
    if let Some(mask) = args.right_buttons.or(args.right_button_mask) {
        config.right_button_mask = mask;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    playspace_common::init_tracing_with_default(&args.log_level);

    let config = load_config(&args)?;
    info!(
        left_mask = config.left_button_mask,
        right_mask = config.right_button_mask,
        "grab buttons configured"
    );

    let handle = SimHandle::new();
    demo::populate(&handle);

    let stop = Arc::new(AtomicBool::new(false));
    let driver = demo::spawn_driver(
        handle.clone(),
        demo::DemoMotion {
            radius: args.demo_radius,
            grab_period: std::time::Duration::from_millis(args.demo_grab_period_ms),
            grab_mask: config.right_button_mask,
        },
        stop.clone(),
    )?;

    let mut runtime_connector =
        SimConnector::<SimulatedRuntime>::new(handle.clone(), "VR runtime (simulated)");
    let mut emulator_connector =
        SimConnector::<SimulatedEmulator>::new(handle, "input emulator (simulated)");

    let mut frame_loop = start(&mut runtime_connector, &mut emulator_connector, config)
        .with_max_frames(args.max_frames);
    let stats = frame_loop.run(&stop);

    stop.store(true, Ordering::Relaxed);
    driver
        .join()
        .map_err(|_| anyhow!("demo driver thread panicked"))?;

    let offset = frame_loop.context().world_offset();
    println!(
        "Processed {} frames, final world offset: ({:.3}, {:.3}, {:.3})",
        stats.processed, offset.x, offset.y, offset.z
    );
    Ok(())
}

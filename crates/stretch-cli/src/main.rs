//! `stretch`: a guided stretching interval timer.
//!
//! Runs a routine of timed exercises with rest buffers between them, announcing
//! countdowns and transitions with short tones. Interactive by default (ratatui), or
//! `--headless` to just log progress.

mod headless;
mod logging;
mod scheduler;
mod session;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::session::RoutineSource;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_SHA"),
    ", ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "stretch", version = VERSION)]
struct Args {
    /// Routine file (TOML). Uses the built-in routine when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the rest buffer between exercises, in seconds.
    #[arg(long)]
    buffer_seconds: Option<i64>,

    /// Output device name substring (case-insensitive). Defaults to the system default.
    #[arg(long)]
    device: Option<String>,

    /// List output devices and exit.
    #[arg(long)]
    list_devices: bool,

    /// Disable audio cues.
    #[arg(long)]
    mute: bool,

    /// Run without the TUI, logging progress to stderr until the routine finishes.
    #[arg(long)]
    headless: bool,

    /// Print the flattened routine and its total time, then exit.
    #[arg(long)]
    print_queue: bool,

    /// Start the clock immediately instead of waiting for Space.
    #[arg(long)]
    autostart: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_devices {
        for (i, name) in cue_player::output_device_names()?.iter().enumerate() {
            println!("#{i}: {name}");
        }
        return Ok(());
    }

    let source = RoutineSource {
        path: args.config.clone(),
        buffer_override: args.buffer_seconds,
    };

    if args.print_queue {
        let routine = source.load()?;
        print!("{}", session::queue_listing(&routine));
        return Ok(());
    }

    if args.headless {
        logging::init_stderr();
        tracing::info!(version = VERSION, "stretch starting");
        let routine = source.load()?;
        let cues = session::open_cues(args.mute, args.device.as_deref());
        return headless::run(routine, cues);
    }

    let log_rx = logging::init_channel();
    tracing::info!(version = VERSION, "stretch starting");
    let routine = source.load()?;
    let cues = session::open_cues(args.mute, args.device.as_deref());
    ui::run_tui(source, routine, cues, args.autostart, log_rx)
}

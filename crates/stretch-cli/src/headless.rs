//! Terminal-less run: log every entry change and exit on completion or Ctrl-C.

use std::time::Instant;

use anyhow::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use stretch_core::{CueSink, DisplaySink, PlaybackController, Routine};
use stretch_types::{DisplaySnapshot, Phase};

use crate::scheduler::ClockScheduler;

type HeadlessController = PlaybackController<LogDisplay, Box<dyn CueSink>, ClockScheduler>;

/// Display sink that writes to the log.
///
/// Entry and phase changes log at info; per-second countdown updates at debug.
#[derive(Default)]
pub(crate) struct LogDisplay {
    last: Option<(Phase, usize)>,
    renders: usize,
}

impl LogDisplay {
    pub(crate) fn renders(&self) -> usize {
        self.renders
    }
}

impl DisplaySink for LogDisplay {
    fn render(&mut self, snap: &DisplaySnapshot) {
        self.renders += 1;
        let key = (snap.phase, snap.position);
        if self.last == Some(key) {
            tracing::debug!(remaining = %snap.remaining, progress = snap.progress, "tick");
            return;
        }
        self.last = Some(key);
        tracing::info!(
            phase = snap.phase.label(),
            position = snap.position,
            of = snap.total_entries,
            title = %snap.title,
            group = %snap.group,
            side = %snap.side_indicator,
            remaining = %snap.remaining,
            upcoming = %snap.upcoming,
            "{}",
            if snap.is_buffer { "buffer" } else { "exercise" }
        );
    }
}

pub(crate) fn run(routine: Routine, cues: Box<dyn CueSink>) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    }) {
        tracing::warn!(error = %e, "ctrl-c handler not installed");
    }

    let mut controller =
        PlaybackController::new(routine, LogDisplay::default(), cues, ClockScheduler::default());
    tracing::info!(
        total = %controller.snapshot().total_time,
        seconds = controller.total_seconds(),
        "starting headless run"
    );
    controller.start();
    drive(&mut controller, &shutdown_rx);
    tracing::debug!(renders = controller.display().renders(), "headless run finished");
    Ok(())
}

/// Feed ticks into `controller` until it completes or `shutdown` fires.
fn drive(controller: &mut HeadlessController, shutdown: &Receiver<()>) {
    loop {
        if controller.phase() == Phase::Completed {
            tracing::info!("routine complete");
            return;
        }
        let Some(wait) = controller.scheduler().until_due(Instant::now()) else {
            tracing::info!(phase = controller.phase().label(), "clock stopped");
            return;
        };
        match shutdown.recv_timeout(wait) {
            Ok(()) => {
                tracing::info!(position = controller.state().position(), "interrupted");
                return;
            }
            Err(RecvTimeoutError::Timeout) => {}
            // No handler: keep the clock running without a way to stop early.
            Err(RecvTimeoutError::Disconnected) => std::thread::sleep(wait),
        }
        let now = Instant::now();
        while controller.scheduler_mut().take_due(now) {
            controller.tick();
        }
    }
}

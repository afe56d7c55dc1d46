//! Wiring shared by the TUI and headless front ends.

use std::path::PathBuf;

use anyhow::Result;
use cue_player::CuePlayer;
use stretch_core::status::format_time;
use stretch_core::{CueSink, QueueEntry, Routine, SilentCues, queue};

/// Where the routine comes from, so `r` can reload it.
#[derive(Clone, Debug, Default)]
pub(crate) struct RoutineSource {
    pub(crate) path: Option<PathBuf>,
    pub(crate) buffer_override: Option<i64>,
}

impl RoutineSource {
    /// Read the routine file (or the built-in routine) and apply the buffer override.
    pub(crate) fn load(&self) -> Result<Routine> {
        let routine = match &self.path {
            Some(path) => Routine::load(path)?,
            None => Routine::builtin(),
        };
        let routine = match self.buffer_override {
            Some(secs) => routine.with_buffer_seconds(secs)?,
            None => routine,
        };
        tracing::info!(
            source = %self.describe(),
            groups = routine.groups.len(),
            exercises = routine.exercise_count(),
            buffer_seconds = routine.buffer_seconds,
            "routine loaded"
        );
        Ok(routine)
    }

    pub(crate) fn describe(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "built-in".to_string(),
        }
    }
}

/// Real audio output, or silence when muted or no device can be opened.
pub(crate) fn open_cues(mute: bool, device: Option<&str>) -> Box<dyn CueSink> {
    if mute {
        tracing::info!("audio cues muted");
        return Box::new(SilentCues);
    }
    match CuePlayer::open(device) {
        Ok(player) => {
            tracing::info!(device = player.device_name(), "audio cues enabled");
            Box::new(player)
        }
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "audio output unavailable, cues muted");
            Box::new(SilentCues)
        }
    }
}

/// Plain-text listing of the flattened queue with the routine total.
pub(crate) fn queue_listing(routine: &Routine) -> String {
    let entries = queue::build(&routine.groups, routine.buffer_seconds);
    let width = entries.len().to_string().len();
    let mut out = String::new();
    for (idx, entry) in entries.iter().enumerate() {
        let label = match entry {
            QueueEntry::Buffer { .. } => format!("  {} -> {}", entry.title(), entry.preview_label()),
            QueueEntry::Exercise { .. } => entry.list_label(),
        };
        out.push_str(&format!(
            "{:>width$}. [{}] {}  {}\n",
            idx + 1,
            entry.group(),
            label,
            format_time(u64::from(entry.duration_seconds())),
        ));
    }
    out.push_str(&format!(
        "total: {} ({} entries)\n",
        format_time(queue::total_seconds(&entries)),
        entries.len()
    ));
    out
}

//! Display snapshot derivation.
//!
//! Converts [`PlaybackState`] into the render-ready [`DisplaySnapshot`] consumed by display
//! sinks, so renderers only lay out strings.

use stretch_types::{ControlState, DisplaySnapshot, EntryStatus, ListEntryView, Phase};

use crate::playback::PlaybackState;
use crate::queue::{self, QueueEntry};

pub const COMPLETE_TITLE: &str = "Routine Complete!";
pub const COMPLETE_GROUP: &str = "Great job!";
pub const COMPLETE_UPCOMING: &str = "You've completed all exercises!";
pub const LAST_ENTRY_UPCOMING: &str = "Last exercise!";

/// Format seconds as `minutes:seconds`, seconds zero-padded to two digits.
pub fn format_time(seconds: u64) -> String {
    let mins = seconds / 60;
    let secs = seconds % 60;
    format!("{mins}:{secs:02}")
}

/// Elapsed share of the routine: completed entries plus time spent in the current one.
///
/// Always in `[0, 1]`; an empty routine reports `0.0`.
pub fn progress_fraction(
    queue: &[QueueEntry],
    position: usize,
    seconds_remaining: u32,
    total_seconds: u64,
) -> f64 {
    if total_seconds == 0 {
        return 0.0;
    }
    let current = queue
        .get(position)
        .map(|e| u64::from(e.duration_seconds().saturating_sub(seconds_remaining)))
        .unwrap_or(0);
    let done = queue::elapsed_before(queue, position) + current;
    (done as f64 / total_seconds as f64).clamp(0.0, 1.0)
}

/// Preview text for whatever follows `position`.
pub fn upcoming_text(queue: &[QueueEntry], position: usize) -> String {
    match queue.get(position + 1) {
        Some(QueueEntry::Buffer { upcoming_label, .. }) => {
            format!("Buffer, then: {upcoming_label}")
        }
        Some(next) => next.preview_label(),
        None => LAST_ENTRY_UPCOMING.to_string(),
    }
}

/// Which controls apply in `phase`.
pub fn controls_for(phase: Phase) -> ControlState {
    ControlState {
        can_start: matches!(phase, Phase::Idle | Phase::Paused),
        can_pause: phase == Phase::Running,
        can_skip: matches!(phase, Phase::Running | Phase::Paused),
    }
}

/// Build the full snapshot for the current state.
pub fn build_snapshot(state: &PlaybackState, phase: Phase, total_seconds: u64) -> DisplaySnapshot {
    let queue = state.queue();
    let position = state.position();
    let total_time = format_time(total_seconds);
    let entries = list_entries(queue, position);
    let controls = controls_for(phase);

    let Some(entry) = state.current() else {
        return DisplaySnapshot {
            phase,
            position: queue.len(),
            total_entries: queue.len(),
            title: COMPLETE_TITLE.to_string(),
            group: COMPLETE_GROUP.to_string(),
            side_indicator: String::new(),
            is_buffer: false,
            remaining: format_time(0),
            remaining_seconds: 0,
            total_time,
            upcoming: COMPLETE_UPCOMING.to_string(),
            progress: progress_fraction(queue, position, 0, total_seconds),
            entries,
            controls,
        };
    };

    let side_indicator = match entry {
        QueueEntry::Buffer { upcoming_label, .. } => format!("Next: {upcoming_label}"),
        QueueEntry::Exercise { side, .. } => side.map(|s| s.label().to_string()).unwrap_or_default(),
    };
    let remaining_seconds = state.seconds_remaining();

    DisplaySnapshot {
        phase,
        position: position + 1,
        total_entries: queue.len(),
        title: entry.title().to_string(),
        group: entry.group().to_string(),
        side_indicator,
        is_buffer: entry.is_buffer(),
        remaining: format_time(u64::from(remaining_seconds)),
        remaining_seconds,
        total_time,
        upcoming: upcoming_text(queue, position),
        progress: progress_fraction(queue, position, remaining_seconds, total_seconds),
        entries,
        controls,
    }
}

fn list_entries(queue: &[QueueEntry], position: usize) -> Vec<ListEntryView> {
    queue
        .iter()
        .enumerate()
        .map(|(idx, entry)| ListEntryView {
            group: entry.group().to_string(),
            label: entry.list_label(),
            duration: format_time(u64::from(entry.duration_seconds())),
            is_buffer: entry.is_buffer(),
            status: if idx < position {
                EntryStatus::Completed
            } else if idx == position {
                EntryStatus::Active
            } else {
                EntryStatus::Pending
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExerciseDef, ExerciseGroup};

    fn sample_queue() -> Vec<QueueEntry> {
        let groups = vec![ExerciseGroup::new(
            "G",
            vec![ExerciseDef::new("A", 30, false), ExerciseDef::new("B", 20, true)],
        )];
        queue::build(&groups, 10)
    }

    #[test]
    fn format_time_pads_seconds() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(9), "0:09");
        assert_eq!(format_time(60), "1:00");
        assert_eq!(format_time(650), "10:50");
    }

    #[test]
    fn progress_counts_prior_entries_and_current_elapsed() {
        let queue = sample_queue();
        let total = queue::total_seconds(&queue);
        assert_eq!(total, 90);
        assert_eq!(progress_fraction(&queue, 0, 30, total), 0.0);
        // A done (30) + buffer half done (5) = 35 / 90
        let p = progress_fraction(&queue, 1, 5, total);
        assert!((p - 35.0 / 90.0).abs() < 1e-9);
        assert_eq!(progress_fraction(&queue, queue.len(), 0, total), 1.0);
    }

    #[test]
    fn progress_on_empty_routine_is_zero() {
        assert_eq!(progress_fraction(&[], 0, 0, 0), 0.0);
    }

    #[test]
    fn upcoming_describes_buffers_sides_and_end() {
        let queue = sample_queue();
        // [A, GetReady(B - Left), B Left, SwitchSides(B - Right), B Right]
        assert_eq!(upcoming_text(&queue, 0), "Buffer, then: B - Left Side");
        assert_eq!(upcoming_text(&queue, 1), "B - Left Side");
        assert_eq!(upcoming_text(&queue, 3), "B - Right Side");
        assert_eq!(upcoming_text(&queue, 4), LAST_ENTRY_UPCOMING);
    }

    #[test]
    fn snapshot_for_buffer_shows_next_label() {
        let mut state = PlaybackState::new(sample_queue());
        state.load(1);
        let snap = build_snapshot(&state, Phase::Paused, 90);
        assert!(snap.is_buffer);
        assert_eq!(snap.title, "Get Ready");
        assert_eq!(snap.side_indicator, "Next: B - Left Side");
        assert_eq!(snap.remaining, "0:10");
        assert_eq!(snap.position, 2);
        assert_eq!(snap.total_entries, 5);
        assert_eq!(snap.entries[0].status, EntryStatus::Completed);
        assert_eq!(snap.entries[1].status, EntryStatus::Active);
        assert_eq!(snap.entries[2].status, EntryStatus::Pending);
    }

    #[test]
    fn snapshot_when_complete_reports_banner() {
        let mut state = PlaybackState::new(sample_queue());
        state.finish();
        let snap = build_snapshot(&state, Phase::Completed, 90);
        assert_eq!(snap.title, COMPLETE_TITLE);
        assert_eq!(snap.group, COMPLETE_GROUP);
        assert_eq!(snap.remaining, "0:00");
        assert_eq!(snap.progress, 1.0);
        assert!(snap.entries.iter().all(|e| e.status == EntryStatus::Completed));
        assert_eq!(snap.controls, controls_for(Phase::Completed));
    }

    #[test]
    fn completed_empty_routine_reports_no_progress() {
        let state = PlaybackState::new(Vec::new());
        let snap = build_snapshot(&state, Phase::Completed, 0);
        assert_eq!(snap.title, COMPLETE_TITLE);
        assert_eq!(snap.total_entries, 0);
        assert_eq!(snap.progress, 0.0);
    }

    #[test]
    fn controls_follow_phase() {
        let idle = controls_for(Phase::Idle);
        assert!(idle.can_start && !idle.can_pause && !idle.can_skip);
        let running = controls_for(Phase::Running);
        assert!(!running.can_start && running.can_pause && running.can_skip);
        let paused = controls_for(Phase::Paused);
        assert!(paused.can_start && !paused.can_pause && paused.can_skip);
        let done = controls_for(Phase::Completed);
        assert!(!done.can_start && !done.can_pause && !done.can_skip);
    }
}

use serde::{Deserialize, Serialize};

/// Body side for exercises performed once per side.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Human-readable label used in previews and side indicators.
    pub fn label(self) -> &'static str {
        match self {
            Side::Left => "Left Side",
            Side::Right => "Right Side",
        }
    }
}

/// Named audio cue requested by the playback controller.
///
/// The core never synthesizes sound; an audio sink maps each cue to a tone script.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    /// Played when an exercise entry starts from its full duration.
    ExerciseStart,
    /// Played at 3 and 2 seconds remaining.
    Countdown,
    /// Played at 1 second remaining.
    FinalCountdown,
    /// Played when an exercise entry runs out naturally.
    Completion,
    /// Played when a buffer entry runs out naturally.
    Transition,
}

impl CueKind {
    pub fn name(self) -> &'static str {
        match self {
            CueKind::ExerciseStart => "exerciseStart",
            CueKind::Countdown => "countdown",
            CueKind::FinalCountdown => "finalCountdown",
            CueKind::Completion => "completion",
            CueKind::Transition => "transition",
        }
    }
}

/// Lifecycle phase of the playback controller.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Queue built, clock never started since the last build/reset.
    #[default]
    Idle,
    /// Clock is ticking.
    Running,
    /// Clock stopped by the user; position and remaining time are kept.
    Paused,
    /// Every entry has been played or skipped. Terminal until reset.
    Completed,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "ready",
            Phase::Running => "running",
            Phase::Paused => "paused",
            Phase::Completed => "complete",
        }
    }
}

/// Classification of a queue entry relative to the current position.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Completed,
    Active,
    Pending,
}

/// One row of the routine list view.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListEntryView {
    /// Group label the entry belongs to.
    pub group: String,
    /// Exercise name with side suffix, or the buffer name.
    pub label: String,
    /// Entry duration formatted as `m:ss`.
    pub duration: String,
    /// `true` for rest/transition entries (list renderers usually hide these).
    pub is_buffer: bool,
    pub status: EntryStatus,
}

/// Which user controls make sense in the current phase.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ControlState {
    pub can_start: bool,
    pub can_pause: bool,
    pub can_skip: bool,
}

/// Immutable render payload pushed to the display sink after every state change.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DisplaySnapshot {
    pub phase: Phase,
    /// 1-based index of the current entry (equals `total_entries` once complete).
    pub position: usize,
    /// Number of entries in the flattened queue.
    pub total_entries: usize,
    /// Exercise name, buffer name, or the completion banner.
    pub title: String,
    /// Group label of the current entry.
    pub group: String,
    /// Side label for exercises, `Next: ...` for buffers.
    pub side_indicator: String,
    /// Whether the current entry is a rest/transition buffer.
    pub is_buffer: bool,
    /// Remaining time in the current entry as `m:ss`.
    pub remaining: String,
    pub remaining_seconds: u32,
    /// Total routine time as `m:ss`.
    pub total_time: String,
    /// Preview of the entry after the current one.
    pub upcoming: String,
    /// Elapsed share of the whole routine, in `[0, 1]`.
    pub progress: f64,
    pub entries: Vec<ListEntryView>,
    pub controls: ControlState,
}

impl DisplaySnapshot {
    /// Iterate exercise rows only, paired with their queue index.
    pub fn exercise_rows(&self) -> impl Iterator<Item = (usize, &ListEntryView)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cue_names_match_sink_contract() {
        assert_eq!(CueKind::ExerciseStart.name(), "exerciseStart");
        assert_eq!(CueKind::FinalCountdown.name(), "finalCountdown");
        assert_eq!(CueKind::Transition.name(), "transition");
    }

    #[test]
    fn phase_serializes_snake_case() {
        let json = serde_json::to_string(&Phase::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
        let side = serde_json::to_string(&Side::Left).unwrap();
        assert_eq!(side, "\"left\"");
    }

    #[test]
    fn exercise_rows_skip_buffers_and_keep_indices() {
        let row = |label: &str, is_buffer: bool| ListEntryView {
            group: "G".into(),
            label: label.into(),
            duration: "0:10".into(),
            is_buffer,
            status: EntryStatus::Pending,
        };
        let snap = DisplaySnapshot {
            entries: vec![row("A", false), row("Get Ready", true), row("B", false)],
            ..Default::default()
        };
        let rows: Vec<(usize, &str)> = snap
            .exercise_rows()
            .map(|(i, e)| (i, e.label.as_str()))
            .collect();
        assert_eq!(rows, vec![(0, "A"), (2, "B")]);
    }
}

//! UI view-models for the TUI.
//!
//! Converts the latest [`DisplaySnapshot`] plus `App` state into render-ready strings so
//! `render.rs` stays layout-focused.

use stretch_types::{ControlState, DisplaySnapshot, EntryStatus, Phase};

use super::app::App;

pub(crate) struct UiView {
    pub(crate) header: String,
    pub(crate) current: CurrentPanel,
    pub(crate) gauge_ratio: f64,
    pub(crate) gauge_label: String,
    pub(crate) rows: Vec<ExerciseRow>,
    pub(crate) upcoming: String,
    pub(crate) status_line: String,
    pub(crate) keys_line: String,
    pub(crate) modal: Option<UiModal>,
}

pub(crate) struct CurrentPanel {
    pub(crate) block_title: String,
    pub(crate) title: String,
    pub(crate) group: String,
    pub(crate) side: String,
    pub(crate) remaining: String,
    pub(crate) is_buffer: bool,
    pub(crate) complete: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ExerciseRow {
    Group(String),
    Item {
        label: String,
        duration: String,
        status: EntryStatus,
    },
}

pub(crate) enum UiModal {
    Help { body: String },
    Logs,
}

impl UiView {
    pub(crate) fn from_app(app: &App) -> Self {
        let snap = app.frame();
        Self {
            header: format!(
                "{}  |  {}  |  total {}",
                app.source_label(),
                snap.phase.label(),
                snap.total_time
            ),
            current: current_panel(snap),
            gauge_ratio: snap.progress.clamp(0.0, 1.0),
            gauge_label: format!("{:.0}%", snap.progress * 100.0),
            rows: exercise_rows(snap),
            upcoming: format!("Up next: {}", snap.upcoming),
            status_line: format!("status: {}", app.status),
            keys_line: keys_line(snap.controls),
            modal: if app.logs_open {
                Some(UiModal::Logs)
            } else if app.help_open {
                Some(UiModal::Help {
                    body: help_lines().join("\n"),
                })
            } else {
                None
            },
        }
    }
}

fn current_panel(snap: &DisplaySnapshot) -> CurrentPanel {
    let complete = snap.phase == Phase::Completed;
    let block_title = if complete {
        "Done".to_string()
    } else {
        format!("Entry {}/{}", snap.position, snap.total_entries)
    };
    CurrentPanel {
        block_title,
        title: snap.title.clone(),
        group: snap.group.clone(),
        side: snap.side_indicator.clone(),
        remaining: snap.remaining.clone(),
        is_buffer: snap.is_buffer,
        complete,
    }
}

/// Exercise occurrences grouped under their group labels. Buffers are left out.
pub(crate) fn exercise_rows(snap: &DisplaySnapshot) -> Vec<ExerciseRow> {
    let mut rows = Vec::new();
    let mut current_group: Option<&str> = None;
    for (_, entry) in snap.exercise_rows() {
        if current_group != Some(entry.group.as_str()) {
            current_group = Some(entry.group.as_str());
            rows.push(ExerciseRow::Group(entry.group.clone()));
        }
        rows.push(ExerciseRow::Item {
            label: entry.label.clone(),
            duration: entry.duration.clone(),
            status: entry.status,
        });
    }
    rows
}

pub(crate) fn status_marker(status: EntryStatus) -> &'static str {
    match status {
        EntryStatus::Completed => "✓",
        EntryStatus::Active => "▶",
        EntryStatus::Pending => "·",
    }
}

fn keys_line(controls: ControlState) -> String {
    let mut keys = Vec::new();
    if controls.can_start {
        keys.push("Space start");
    }
    if controls.can_pause {
        keys.push("Space/p pause");
    }
    if controls.can_skip {
        keys.push("n skip");
    }
    keys.extend(["r reset", "l logs", "h help", "q quit"]);
    format!("keys: {}", keys.join(" | "))
}

fn help_lines() -> Vec<&'static str> {
    vec![
        "Playback",
        "  Space / s    start / pause",
        "  p            pause",
        "  n            skip to next entry",
        "  r            reset (reloads the routine file)",
        "",
        "Other",
        "  l            logs",
        "  h or ?       help",
        "  q            quit",
        "  Esc          close modal / quit",
    ]
}

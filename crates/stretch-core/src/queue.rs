//! Routine flattening.
//!
//! Expands groups → exercises → optional per-side duplication into a linear queue of
//! playable entries, inserting a buffer before every exercise except the very first
//! and between the two sides of a mirrored exercise.

use stretch_types::Side;

use crate::config::ExerciseGroup;

/// Why a buffer sits where it does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
    /// Rest before the next exercise.
    GetReady,
    /// Gap between the left and right side of a mirrored exercise.
    SwitchSides,
}

impl BufferKind {
    pub fn title(self) -> &'static str {
        match self {
            BufferKind::GetReady => "Get Ready",
            BufferKind::SwitchSides => "Switch Sides",
        }
    }
}

/// One playable slot in the flattened routine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueueEntry {
    Exercise {
        group: String,
        name: String,
        duration_seconds: u32,
        side: Option<Side>,
    },
    Buffer {
        group: String,
        duration_seconds: u32,
        /// Exercise (and side, if any) that follows this buffer.
        upcoming_label: String,
        kind: BufferKind,
    },
}

impl QueueEntry {
    pub fn duration_seconds(&self) -> u32 {
        match self {
            QueueEntry::Exercise {
                duration_seconds, ..
            }
            | QueueEntry::Buffer {
                duration_seconds, ..
            } => *duration_seconds,
        }
    }

    pub fn group(&self) -> &str {
        match self {
            QueueEntry::Exercise { group, .. } | QueueEntry::Buffer { group, .. } => group,
        }
    }

    pub fn is_buffer(&self) -> bool {
        matches!(self, QueueEntry::Buffer { .. })
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            QueueEntry::Exercise { side, .. } => *side,
            QueueEntry::Buffer { .. } => None,
        }
    }

    /// Headline text: the exercise name or the buffer's title.
    pub fn title(&self) -> &str {
        match self {
            QueueEntry::Exercise { name, .. } => name,
            QueueEntry::Buffer { kind, .. } => kind.title(),
        }
    }

    /// Text naming this entry in an "up next" preview.
    ///
    /// Buffers preview the exercise they lead into.
    pub fn preview_label(&self) -> String {
        match self {
            QueueEntry::Exercise { name, side, .. } => side_label(name, *side),
            QueueEntry::Buffer { upcoming_label, .. } => upcoming_label.clone(),
        }
    }

    /// Row label for list views: `Name (Left Side)` for sided exercises.
    pub fn list_label(&self) -> String {
        match self {
            QueueEntry::Exercise {
                name,
                side: Some(side),
                ..
            } => format!("{name} ({})", side.label()),
            other => other.title().to_string(),
        }
    }
}

/// Flatten `groups` into a playable queue with `buffer_seconds` gaps.
///
/// Groups and exercises keep declaration order. An empty routine yields an empty queue.
pub fn build(groups: &[ExerciseGroup], buffer_seconds: u32) -> Vec<QueueEntry> {
    let mut queue = Vec::new();
    let mut first = true;

    for group in groups {
        for exercise in &group.exercises {
            let buffer = |upcoming_label: String, kind: BufferKind| QueueEntry::Buffer {
                group: group.label.clone(),
                duration_seconds: buffer_seconds,
                upcoming_label,
                kind,
            };
            let occurrence = |side: Option<Side>| QueueEntry::Exercise {
                group: group.label.clone(),
                name: exercise.name.clone(),
                duration_seconds: exercise.duration_seconds,
                side,
            };

            if exercise.mirrored {
                if !first {
                    queue.push(buffer(
                        side_label(&exercise.name, Some(Side::Left)),
                        BufferKind::GetReady,
                    ));
                }
                queue.push(occurrence(Some(Side::Left)));
                queue.push(buffer(
                    side_label(&exercise.name, Some(Side::Right)),
                    BufferKind::SwitchSides,
                ));
                queue.push(occurrence(Some(Side::Right)));
            } else {
                if !first {
                    queue.push(buffer(exercise.name.clone(), BufferKind::GetReady));
                }
                queue.push(occurrence(None));
            }
            first = false;
        }
    }

    queue
}

/// Total routine time, always recomputed from the entries themselves.
pub fn total_seconds(queue: &[QueueEntry]) -> u64 {
    queue.iter().map(|e| u64::from(e.duration_seconds())).sum()
}

/// Seconds covered by every entry before `position`.
pub fn elapsed_before(queue: &[QueueEntry], position: usize) -> u64 {
    let end = position.min(queue.len());
    total_seconds(&queue[..end])
}

fn side_label(name: &str, side: Option<Side>) -> String {
    match side {
        Some(side) => format!("{name} - {}", side.label()),
        None => name.to_string(),
    }
}

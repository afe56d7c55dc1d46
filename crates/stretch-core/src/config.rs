//! Routine configuration loading and validation.
//!
//! Routines are written in TOML. The file schema keeps durations as signed integers so
//! that zero or negative values surface as [`ConfigError`]s instead of parse failures.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Rest/transition gap inserted between exercises when the file does not set one.
pub const DEFAULT_BUFFER_SECONDS: u32 = 10;

/// Top-level routine document loaded from TOML.
#[derive(Debug, Deserialize)]
pub struct RoutineFile {
    /// Seconds of buffer inserted between entries.
    pub buffer_seconds: Option<i64>,
    /// Exercise groups in playback order.
    #[serde(default)]
    pub groups: Vec<GroupFile>,
}

/// Exercise group from TOML.
#[derive(Debug, Deserialize)]
pub struct GroupFile {
    /// Display label (for example "Hip Flexors").
    pub label: String,
    /// Declared group time in seconds. Documentation only.
    pub duration: Option<i64>,
    #[serde(default)]
    pub exercises: Vec<ExerciseFile>,
}

/// Exercise definition from TOML.
#[derive(Debug, Deserialize)]
pub struct ExerciseFile {
    pub name: String,
    pub duration_seconds: i64,
    /// Perform once per side (left, then right).
    #[serde(default)]
    pub mirrored: bool,
}

/// Validated exercise definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExerciseDef {
    pub name: String,
    pub duration_seconds: u32,
    pub mirrored: bool,
}

impl ExerciseDef {
    pub fn new(name: impl Into<String>, duration_seconds: u32, mirrored: bool) -> Self {
        Self {
            name: name.into(),
            duration_seconds,
            mirrored,
        }
    }

    /// Seconds this exercise contributes to the routine, counting both sides.
    pub fn effective_seconds(&self) -> u64 {
        let sides = if self.mirrored { 2 } else { 1 };
        u64::from(self.duration_seconds) * sides
    }
}

/// Validated, read-only exercise group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExerciseGroup {
    pub label: String,
    pub exercises: Vec<ExerciseDef>,
    /// Group time as written in the file. Never used for timing.
    pub declared_seconds: Option<u64>,
}

impl ExerciseGroup {
    pub fn new(label: impl Into<String>, exercises: Vec<ExerciseDef>) -> Self {
        Self {
            label: label.into(),
            exercises,
            declared_seconds: None,
        }
    }

    /// Exercise time recomputed from the individual definitions (buffers excluded).
    pub fn computed_seconds(&self) -> u64 {
        self.exercises.iter().map(ExerciseDef::effective_seconds).sum()
    }
}

/// A complete routine: groups plus the global buffer duration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Routine {
    pub groups: Vec<ExerciseGroup>,
    pub buffer_seconds: u32,
}

/// Validation failures for routine definitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// An exercise has a zero or negative duration.
    NonPositiveDuration {
        group: String,
        exercise: String,
        value: i64,
    },
    /// An exercise duration does not fit the timer's range.
    DurationOutOfRange {
        group: String,
        exercise: String,
        value: i64,
    },
    /// An exercise name is empty or whitespace.
    EmptyExerciseName { group: String, index: usize },
    /// The buffer duration is zero, negative, or out of range.
    InvalidBuffer { value: i64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonPositiveDuration {
                group,
                exercise,
                value,
            } => write!(
                f,
                "exercise duration must be positive: group={group:?} exercise={exercise:?} duration_seconds={value}"
            ),
            ConfigError::DurationOutOfRange {
                group,
                exercise,
                value,
            } => write!(
                f,
                "exercise duration out of range: group={group:?} exercise={exercise:?} duration_seconds={value}"
            ),
            ConfigError::EmptyExerciseName { group, index } => write!(
                f,
                "exercise name is empty: group={group:?} index={index}"
            ),
            ConfigError::InvalidBuffer { value } => {
                write!(f, "buffer_seconds must be a positive number of seconds, got {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Routine {
    /// Load and validate a routine from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read routine {:?}", path))?;
        Self::parse(&raw).with_context(|| format!("load routine {:?}", path))
    }

    /// Parse and validate a routine from TOML text.
    pub fn parse(raw: &str) -> Result<Self> {
        let file = toml::from_str::<RoutineFile>(raw).context("parse routine toml")?;
        let routine = Self::from_file(file)?;
        Ok(routine)
    }

    /// Validate a parsed routine document.
    pub fn from_file(file: RoutineFile) -> Result<Self, ConfigError> {
        let buffer_seconds = match file.buffer_seconds {
            Some(value) => validate_buffer(value)?,
            None => DEFAULT_BUFFER_SECONDS,
        };

        let mut groups = Vec::with_capacity(file.groups.len());
        for group in file.groups {
            let mut exercises = Vec::with_capacity(group.exercises.len());
            for (index, exercise) in group.exercises.into_iter().enumerate() {
                let name = exercise.name.trim().to_string();
                if name.is_empty() {
                    return Err(ConfigError::EmptyExerciseName {
                        group: group.label.clone(),
                        index,
                    });
                }
                let value = exercise.duration_seconds;
                if value <= 0 {
                    return Err(ConfigError::NonPositiveDuration {
                        group: group.label.clone(),
                        exercise: name,
                        value,
                    });
                }
                let duration_seconds =
                    u32::try_from(value).map_err(|_| ConfigError::DurationOutOfRange {
                        group: group.label.clone(),
                        exercise: name.clone(),
                        value,
                    })?;
                exercises.push(ExerciseDef {
                    name,
                    duration_seconds,
                    mirrored: exercise.mirrored,
                });
            }

            let declared_seconds = group.duration.and_then(|d| u64::try_from(d).ok());
            let validated = ExerciseGroup {
                label: group.label,
                exercises,
                declared_seconds,
            };
            warn_on_declared_drift(&validated);
            groups.push(validated);
        }

        Ok(Self {
            groups,
            buffer_seconds,
        })
    }

    /// Replace the buffer duration, validating it the same way as the file value.
    pub fn with_buffer_seconds(mut self, value: i64) -> Result<Self, ConfigError> {
        self.buffer_seconds = validate_buffer(value)?;
        Ok(self)
    }

    /// Number of exercise definitions across all groups.
    pub fn exercise_count(&self) -> usize {
        self.groups.iter().map(|g| g.exercises.len()).sum()
    }

    /// Built-in routine used when no routine file is given.
    pub fn builtin() -> Self {
        Self {
            groups: vec![
                ExerciseGroup {
                    label: "Hip Flexors".into(),
                    exercises: vec![
                        ExerciseDef::new("World's Greatest Stretch", 60, true),
                        ExerciseDef::new("Couch Stretch (hip flexor)", 30, true),
                    ],
                    declared_seconds: Some(180),
                },
                ExerciseGroup {
                    label: "Shoulders".into(),
                    exercises: vec![
                        ExerciseDef::new("Thread the Needle (from all fours)", 60, true),
                        ExerciseDef::new("Arm Circles (both directions)", 30, false),
                        ExerciseDef::new("Prone Y-T-W Sequence", 30, false),
                    ],
                    declared_seconds: Some(180),
                },
                ExerciseGroup {
                    label: "Thoracic Spine".into(),
                    exercises: vec![
                        ExerciseDef::new("Cat-Cow", 60, false),
                        ExerciseDef::new("Open Books (side lying)", 30, true),
                        ExerciseDef::new("T-Spine Extensions on All Fours", 60, false),
                    ],
                    declared_seconds: Some(180),
                },
            ],
            buffer_seconds: DEFAULT_BUFFER_SECONDS,
        }
    }
}

impl Default for Routine {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_buffer(value: i64) -> Result<u32, ConfigError> {
    if value <= 0 {
        return Err(ConfigError::InvalidBuffer { value });
    }
    u32::try_from(value).map_err(|_| ConfigError::InvalidBuffer { value })
}

fn warn_on_declared_drift(group: &ExerciseGroup) {
    let Some(declared) = group.declared_seconds else {
        return;
    };
    let computed = group.computed_seconds();
    if declared != computed {
        tracing::warn!(
            group = %group.label,
            declared_seconds = declared,
            computed_seconds = computed,
            "group duration drifts from its exercises; using computed time"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
buffer_seconds = 5

[[groups]]
label = "Legs"
duration = 90

[[groups.exercises]]
name = "Lunge"
duration_seconds = 30
mirrored = true

[[groups.exercises]]
name = "Squat Hold"
duration_seconds = 30
"#;

    #[test]
    fn parse_reads_groups_and_buffer() {
        let routine = Routine::parse(SAMPLE).unwrap();
        assert_eq!(routine.buffer_seconds, 5);
        assert_eq!(routine.groups.len(), 1);
        let group = &routine.groups[0];
        assert_eq!(group.label, "Legs");
        assert_eq!(group.declared_seconds, Some(90));
        assert_eq!(group.exercises[0], ExerciseDef::new("Lunge", 30, true));
        assert!(!group.exercises[1].mirrored);
    }

    #[test]
    fn missing_buffer_uses_default() {
        let routine = Routine::parse("[[groups]]\nlabel = \"Empty\"\n").unwrap();
        assert_eq!(routine.buffer_seconds, DEFAULT_BUFFER_SECONDS);
        assert!(routine.groups[0].exercises.is_empty());
    }

    #[test]
    fn zero_duration_is_rejected() {
        let raw = r#"
[[groups]]
label = "G"
[[groups.exercises]]
name = "Plank"
duration_seconds = 0
"#;
        let file = toml::from_str::<RoutineFile>(raw).unwrap();
        let err = Routine::from_file(file).unwrap_err();
        assert_eq!(
            err,
            ConfigError::NonPositiveDuration {
                group: "G".into(),
                exercise: "Plank".into(),
                value: 0,
            }
        );
    }

    #[test]
    fn negative_duration_is_rejected_through_parse() {
        let raw = r#"
[[groups]]
label = "G"
[[groups.exercises]]
name = "Plank"
duration_seconds = -4
"#;
        let err = Routine::parse(raw).unwrap_err();
        let config_err = err.downcast_ref::<ConfigError>().unwrap();
        assert!(matches!(
            config_err,
            ConfigError::NonPositiveDuration { value: -4, .. }
        ));
    }

    #[test]
    fn blank_name_is_rejected() {
        let raw = r#"
[[groups]]
label = "G"
[[groups.exercises]]
name = "  "
duration_seconds = 10
"#;
        let file = toml::from_str::<RoutineFile>(raw).unwrap();
        assert_eq!(
            Routine::from_file(file).unwrap_err(),
            ConfigError::EmptyExerciseName {
                group: "G".into(),
                index: 0,
            }
        );
    }

    #[test]
    fn oversized_duration_is_rejected() {
        let raw = format!(
            "[[groups]]\nlabel = \"G\"\n[[groups.exercises]]\nname = \"X\"\nduration_seconds = {}\n",
            i64::from(u32::MAX) + 1
        );
        let file = toml::from_str::<RoutineFile>(&raw).unwrap();
        assert!(matches!(
            Routine::from_file(file).unwrap_err(),
            ConfigError::DurationOutOfRange { .. }
        ));
    }

    #[test]
    fn buffer_override_is_validated() {
        let routine = Routine::builtin();
        assert_eq!(routine.clone().with_buffer_seconds(15).unwrap().buffer_seconds, 15);
        assert_eq!(
            routine.with_buffer_seconds(0).unwrap_err(),
            ConfigError::InvalidBuffer { value: 0 }
        );
    }

    #[test]
    fn builtin_declared_totals_match_computed() {
        let routine = Routine::builtin();
        assert_eq!(routine.exercise_count(), 8);
        for group in &routine.groups {
            assert_eq!(group.declared_seconds, Some(group.computed_seconds()));
        }
    }

    #[test]
    fn error_messages_name_the_offender() {
        let err = ConfigError::NonPositiveDuration {
            group: "Legs".into(),
            exercise: "Lunge".into(),
            value: -1,
        };
        let msg = err.to_string();
        assert!(msg.contains("Lunge"));
        assert!(msg.contains("-1"));
    }

    #[test]
    fn shipped_routine_file_matches_builtin() {
        let raw = include_str!("../../../routines/default.toml");
        let routine = Routine::parse(raw).unwrap();
        assert_eq!(routine, Routine::builtin());
    }
}

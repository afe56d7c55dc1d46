//! Core logic for the stretching interval timer.
//!
//! - [`queue`] flattens a nested routine into a linear, playable timeline.
//! - [`playback`] drives that timeline one second at a time and calls out to
//!   display, audio-cue and scheduler seams.
//! - [`status`] derives render-ready snapshots from playback state.
//! - [`config`] loads and validates routine definitions.

pub mod config;
pub mod playback;
pub mod queue;
pub mod status;

pub use config::{ConfigError, ExerciseDef, ExerciseGroup, Routine};
pub use playback::{CueSink, DisplaySink, PlaybackController, PlaybackState, SilentCues, TickScheduler};
pub use queue::{BufferKind, QueueEntry};

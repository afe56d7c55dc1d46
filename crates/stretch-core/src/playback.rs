//! Playback controller.
//!
//! Holds the position in the flattened queue and the seconds left in the current entry,
//! and advances once per tick while running. Side effects go through three seams:
//! - [`DisplaySink`] receives a fresh [`DisplaySnapshot`] after every state change
//! - [`CueSink`] is asked for named audio cues at scripted instants (fire-and-forget)
//! - [`TickScheduler`] owns the recurring one-second tick
//!
//! Every operation is total: repeated `start`/`pause` calls are silent no-ops and audio
//! failures are logged and dropped.

use anyhow::Result;
use stretch_types::{CueKind, DisplaySnapshot, Phase};

use crate::config::Routine;
use crate::queue::{self, QueueEntry};
use crate::status;

/// Countdown cues fired on exercise entries, keyed by seconds remaining.
const COUNTDOWN_CUES: [(u32, CueKind); 3] = [
    (3, CueKind::Countdown),
    (2, CueKind::Countdown),
    (1, CueKind::FinalCountdown),
];

/// Receives render snapshots. Implementations must not call back into the controller.
pub trait DisplaySink {
    fn render(&mut self, snapshot: &DisplaySnapshot);
}

/// Plays named audio cues.
///
/// `play` must return promptly; playback itself happens asynchronously and may overlap
/// with later cues.
pub trait CueSink {
    fn play(&self, cue: CueKind) -> Result<()>;
}

impl<T: CueSink + ?Sized> CueSink for Box<T> {
    fn play(&self, cue: CueKind) -> Result<()> {
        (**self).play(cue)
    }
}

/// Source of the recurring one-second tick.
///
/// After `cancel` returns, no tick scheduled before it may reach the controller.
pub trait TickScheduler {
    fn schedule(&mut self);
    fn cancel(&mut self);
}

/// Cue sink that drops every cue (muted or no audio backend).
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentCues;

impl CueSink for SilentCues {
    fn play(&self, cue: CueKind) -> Result<()> {
        tracing::trace!(cue = cue.name(), "cue muted");
        Ok(())
    }
}

/// Mutable playback position over an immutable queue.
#[derive(Clone, Debug)]
pub struct PlaybackState {
    queue: Vec<QueueEntry>,
    position: usize,
    seconds_remaining: u32,
    running: bool,
    /// Last countdown second a cue fired for in the current entry.
    last_cue_second: Option<u32>,
}

impl PlaybackState {
    pub fn new(queue: Vec<QueueEntry>) -> Self {
        let seconds_remaining = queue.first().map(QueueEntry::duration_seconds).unwrap_or(0);
        Self {
            queue,
            position: 0,
            seconds_remaining,
            running: false,
            last_cue_second: None,
        }
    }

    pub fn queue(&self) -> &[QueueEntry] {
        &self.queue
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    #[cfg(test)]
    pub(crate) fn last_cue_second(&self) -> Option<u32> {
        self.last_cue_second
    }

    /// Entry at the current position, `None` once complete.
    pub fn current(&self) -> Option<&QueueEntry> {
        self.queue.get(self.position)
    }

    pub fn is_complete(&self) -> bool {
        self.position >= self.queue.len()
    }

    /// Whether the current entry has not consumed any of its time yet.
    pub fn at_full_duration(&self) -> bool {
        self.current()
            .map(|e| e.duration_seconds() == self.seconds_remaining)
            .unwrap_or(false)
    }

    pub(crate) fn load(&mut self, index: usize) {
        self.position = index;
        self.seconds_remaining = self
            .queue
            .get(index)
            .map(QueueEntry::duration_seconds)
            .unwrap_or(0);
        self.last_cue_second = None;
    }

    pub(crate) fn finish(&mut self) {
        self.position = self.queue.len();
        self.seconds_remaining = 0;
        self.running = false;
        self.last_cue_second = None;
    }
}

/// State machine driving a routine: Idle → Running ⇄ Paused → Completed, with reset
/// returning to Idle from anywhere.
pub struct PlaybackController<D, C, S> {
    routine: Routine,
    state: PlaybackState,
    total_seconds: u64,
    /// Set by the first `start` since build/reset; separates Idle from Paused.
    started: bool,
    display: D,
    cues: C,
    scheduler: S,
}

impl<D, C, S> PlaybackController<D, C, S>
where
    D: DisplaySink,
    C: CueSink,
    S: TickScheduler,
{
    /// Build the queue for `routine` and push the initial snapshot.
    pub fn new(routine: Routine, display: D, cues: C, scheduler: S) -> Self {
        let state = PlaybackState::new(queue::build(&routine.groups, routine.buffer_seconds));
        let total_seconds = queue::total_seconds(state.queue());
        tracing::info!(
            entries = state.queue().len(),
            total_seconds,
            "routine queue built"
        );
        let mut controller = Self {
            routine,
            state,
            total_seconds,
            started: false,
            display,
            cues,
            scheduler,
        };
        controller.push_display();
        controller
    }

    pub fn phase(&self) -> Phase {
        if self.state.is_complete() {
            Phase::Completed
        } else if self.state.running {
            Phase::Running
        } else if self.started {
            Phase::Paused
        } else {
            Phase::Idle
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    #[cfg(test)]
    pub(crate) fn cues(&self) -> &C {
        &self.cues
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Snapshot of the current state, as pushed to the display sink.
    pub fn snapshot(&self) -> DisplaySnapshot {
        status::build_snapshot(&self.state, self.phase(), self.total_seconds)
    }

    /// Start or resume the clock. No-op while running or once complete.
    pub fn start(&mut self) {
        if self.state.running {
            return;
        }
        if self.state.is_complete() {
            tracing::debug!("start ignored: routine complete");
            return;
        }
        self.started = true;
        tracing::info!(
            position = self.state.position,
            seconds_remaining = self.state.seconds_remaining,
            "playback started"
        );
        self.run_current_entry();
        self.push_display();
    }

    /// Stop the clock, keeping position and remaining time. No-op unless running.
    pub fn pause(&mut self) {
        if !self.state.running {
            return;
        }
        self.scheduler.cancel();
        self.state.running = false;
        tracing::info!(
            position = self.state.position,
            seconds_remaining = self.state.seconds_remaining,
            "playback paused"
        );
        self.push_display();
    }

    /// Start when stopped, pause when running.
    pub fn toggle(&mut self) {
        if self.state.running {
            self.pause();
        } else {
            self.start();
        }
    }

    /// One second of playback. Ticks arriving while stopped are ignored.
    pub fn tick(&mut self) {
        if !self.state.running {
            tracing::debug!("stale tick ignored");
            return;
        }
        let Some(is_buffer) = self.state.current().map(QueueEntry::is_buffer) else {
            return;
        };

        self.state.seconds_remaining = self.state.seconds_remaining.saturating_sub(1);
        self.push_display();
        self.announce_countdown();

        if self.state.seconds_remaining == 0 {
            self.fire(if is_buffer {
                CueKind::Transition
            } else {
                CueKind::Completion
            });
            self.advance();
        }
    }

    /// End the current entry now, without its completion cue.
    pub fn skip(&mut self) {
        if self.state.is_complete() {
            return;
        }
        self.scheduler.cancel();
        tracing::info!(
            position = self.state.position,
            seconds_remaining = self.state.seconds_remaining,
            "entry skipped"
        );
        self.advance();
    }

    /// Rebuild the queue from the held routine and return to Idle at entry zero.
    pub fn reset(&mut self) {
        self.scheduler.cancel();
        let queue = queue::build(&self.routine.groups, self.routine.buffer_seconds);
        self.total_seconds = queue::total_seconds(&queue);
        self.state = PlaybackState::new(queue);
        self.started = false;
        tracing::info!(
            entries = self.state.queue().len(),
            total_seconds = self.total_seconds,
            "playback reset"
        );
        self.push_display();
    }

    /// Swap in a freshly loaded routine and reset onto it.
    pub fn reload(&mut self, routine: Routine) {
        self.routine = routine;
        self.reset();
    }

    /// Move to the next entry, carrying over the running flag, or complete the routine.
    fn advance(&mut self) {
        let resume = self.state.running;
        self.scheduler.cancel();
        self.state.running = false;

        let next = self.state.position + 1;
        if next >= self.state.queue.len() {
            self.complete();
            return;
        }

        self.state.load(next);
        tracing::debug!(
            position = next,
            title = self.state.current().map(QueueEntry::title).unwrap_or("-"),
            "entry loaded"
        );
        if resume {
            self.run_current_entry();
        }
        self.push_display();
    }

    fn complete(&mut self) {
        self.scheduler.cancel();
        self.state.finish();
        tracing::info!(total_seconds = self.total_seconds, "routine complete");
        self.push_display();
    }

    /// Mark running and schedule ticks; announce exercises entered from full duration.
    fn run_current_entry(&mut self) {
        self.state.running = true;
        let fresh_exercise = self
            .state
            .current()
            .map(|e| !e.is_buffer())
            .unwrap_or(false)
            && self.state.at_full_duration();
        if fresh_exercise {
            self.fire(CueKind::ExerciseStart);
        }
        self.scheduler.schedule();
    }

    /// Fire the countdown cue for the current second, at most once per second per entry.
    fn announce_countdown(&mut self) {
        let Some(entry) = self.state.current() else {
            return;
        };
        if entry.is_buffer() {
            return;
        }
        let secs = self.state.seconds_remaining;
        let Some((_, cue)) = COUNTDOWN_CUES.iter().find(|(at, _)| *at == secs) else {
            return;
        };
        if self.state.last_cue_second == Some(secs) {
            return;
        }
        self.state.last_cue_second = Some(secs);
        self.fire(*cue);
    }

    fn fire(&self, cue: CueKind) {
        tracing::debug!(cue = cue.name(), "cue");
        if let Err(err) = self.cues.play(cue) {
            tracing::warn!(cue = cue.name(), "audio cue failed: {err:#}");
        }
    }

    fn push_display(&mut self) {
        let snapshot = self.snapshot();
        self.display.render(&snapshot);
    }
}

//! Tone scripts for audio cues.
//!
//! Each cue is an ordered list of [`ToneStep`]s. A step starts a decaying sine tone and
//! then waits `next_after_ms` before the following step starts, so tones longer than
//! that offset overlap with the next one.

use stretch_types::CueKind;

/// Level the exponential decay reaches at the end of a tone.
const DECAY_FLOOR: f32 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToneStep {
    pub freq_hz: f32,
    pub duration_ms: u32,
    /// Peak gain in `(0, 1]`.
    pub volume: f32,
    /// Offset from this tone's start to the next step's start.
    pub next_after_ms: u32,
}

impl ToneStep {
    const fn new(freq_hz: f32, duration_ms: u32, volume: f32, next_after_ms: u32) -> Self {
        Self {
            freq_hz,
            duration_ms,
            volume,
            next_after_ms,
        }
    }
}

const EXERCISE_START: [ToneStep; 2] = [
    ToneStep::new(523.0, 100, 0.3, 50),
    ToneStep::new(659.0, 150, 0.3, 0),
];
const COUNTDOWN: [ToneStep; 1] = [ToneStep::new(600.0, 150, 0.4, 0)];
const FINAL_COUNTDOWN: [ToneStep; 1] = [ToneStep::new(800.0, 150, 0.5, 0)];
const COMPLETION: [ToneStep; 3] = [
    ToneStep::new(1000.0, 120, 0.5, 150),
    ToneStep::new(1000.0, 120, 0.5, 150),
    ToneStep::new(1000.0, 120, 0.5, 150),
];
const TRANSITION: [ToneStep; 2] = [
    ToneStep::new(392.0, 200, 0.2, 100),
    ToneStep::new(523.0, 200, 0.2, 0),
];

/// Tone script for `cue`.
pub fn script(cue: CueKind) -> &'static [ToneStep] {
    match cue {
        CueKind::ExerciseStart => &EXERCISE_START,
        CueKind::Countdown => &COUNTDOWN,
        CueKind::FinalCountdown => &FINAL_COUNTDOWN,
        CueKind::Completion => &COMPLETION,
        CueKind::Transition => &TRANSITION,
    }
}

/// Render a script to mono `f32` samples at `sample_rate`.
///
/// Overlapping tones are summed and the result is clamped to `[-1, 1]`.
pub fn render(steps: &[ToneStep], sample_rate: u32) -> Vec<f32> {
    let rate = sample_rate as f32;
    let ms_to_samples = |ms: u32| (rate * ms as f32 / 1000.0).round() as usize;

    let mut out = Vec::new();
    let mut start = 0usize;
    for step in steps {
        let len = ms_to_samples(step.duration_ms);
        if out.len() < start + len {
            out.resize(start + len, 0.0);
        }
        let floor_ratio = (DECAY_FLOOR / step.volume.max(DECAY_FLOOR)).ln();
        for i in 0..len {
            let t = i as f32 / rate;
            let progress = i as f32 / len as f32;
            let gain = step.volume * (floor_ratio * progress).exp();
            out[start + i] += gain * (std::f32::consts::TAU * step.freq_hz * t).sin();
        }
        start += ms_to_samples(step.next_after_ms);
    }

    for sample in &mut out {
        *sample = sample.clamp(-1.0, 1.0);
    }
    out
}

/// Convenience: render the script for `cue`.
pub fn render_cue(cue: CueKind, sample_rate: u32) -> Vec<f32> {
    render(script(cue), sample_rate)
}

//! Shared mono sample buffer between cue triggers and the output callback.
//!
//! Triggers mix rendered cues in from the caller's thread; the CPAL callback drains the
//! head without blocking. Cues that arrive while another is still sounding are summed
//! sample by sample rather than queued behind it.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Cap on buffered audio, in seconds, to keep memory and latency bounded.
pub const MAX_BUFFERED_SECONDS: f32 = 2.0;

/// Capacity in samples for `seconds` of mono audio at `rate_hz`.
///
/// Non-finite or non-positive `seconds` fall back to [`MAX_BUFFERED_SECONDS`].
pub fn capacity_for(rate_hz: u32, seconds: f32) -> usize {
    let secs = if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        MAX_BUFFERED_SECONDS
    };
    (rate_hz as f32 * secs).ceil() as usize
}

pub struct CueMixer {
    samples: Mutex<VecDeque<f32>>,
    max_samples: usize,
}

impl CueMixer {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::new()),
            max_samples,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().len()
    }

    /// Sum `cue` into the buffer starting at the current play head.
    ///
    /// The result is clamped to `[-1, 1]`. Anything past the capacity is dropped.
    /// Returns the number of samples that did not fit.
    pub fn mix_in(&self, cue: &[f32]) -> usize {
        let mut buf = self.lock();
        let fit = cue.len().min(self.max_samples);
        for (i, sample) in cue[..fit].iter().enumerate() {
            match buf.get_mut(i) {
                Some(existing) => *existing = (*existing + sample).clamp(-1.0, 1.0),
                None => buf.push_back(sample.clamp(-1.0, 1.0)),
            }
        }
        cue.len() - fit
    }

    /// Move up to `max` samples off the head, or `None` when nothing is buffered.
    pub fn pop(&self, max: usize) -> Option<Vec<f32>> {
        let mut buf = self.lock();
        let take = buf.len().min(max);
        if take == 0 {
            return None;
        }
        Some(buf.drain(..take).collect())
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<f32>> {
        self.samples.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn capacity_for_falls_back_on_bad_input() {
        assert_eq!(capacity_for(48_000, 1.0), 48_000);
        assert_eq!(capacity_for(48_000, -1.0), 96_000);
        assert_eq!(capacity_for(48_000, f32::NAN), 96_000);
    }

    #[test]
    fn pop_on_empty_returns_none() {
        let mixer = CueMixer::new(16);
        assert!(mixer.pop(4).is_none());
        assert_eq!(mixer.len(), 0);
    }

    #[test]
    fn overlapping_cues_are_summed_and_clamped() {
        let mixer = CueMixer::new(16);
        mixer.mix_in(&[0.25, 0.5, 0.75]);
        mixer.mix_in(&[0.25, 0.75]);

        let out = mixer.pop(8).unwrap();
        assert_eq!(out, vec![0.5, 1.0, 0.75]);
    }

    #[test]
    fn later_cue_mixes_at_play_head() {
        let mixer = CueMixer::new(16);
        mixer.mix_in(&[0.1, 0.1, 0.1, 0.1]);
        assert_eq!(mixer.pop(2).unwrap(), vec![0.1, 0.1]);

        mixer.mix_in(&[0.2, 0.2, 0.2]);
        let out = mixer.pop(8).unwrap();
        assert_eq!(out.len(), 3);
        assert!((out[0] - 0.3).abs() < 1e-6);
        assert!((out[2] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn mix_in_respects_capacity() {
        let mixer = CueMixer::new(4);
        let dropped = mixer.mix_in(&[0.1; 6]);
        assert_eq!(dropped, 2);
        assert_eq!(mixer.len(), 4);
        assert_eq!(mixer.pop(16).map(|v| v.len()), Some(4));
        assert!(mixer.pop(16).is_none());
    }

    #[test]
    fn concurrent_mix_and_drain() {
        let mixer = Arc::new(CueMixer::new(1_000));
        let producer = mixer.clone();

        let handle = thread::spawn(move || {
            for _ in 0..10 {
                producer.mix_in(&[0.01; 50]);
            }
        });
        handle.join().unwrap();

        let mut drained = 0;
        while let Some(chunk) = mixer.pop(16) {
            drained += chunk.len();
        }
        assert_eq!(drained, 50);
    }
}

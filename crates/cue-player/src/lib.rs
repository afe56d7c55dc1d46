//! Audio cue playback over CPAL.
//!
//! [`CuePlayer`] opens one output stream for the life of the session and pre-renders
//! every cue at the device rate. Playing a cue only mixes samples into a shared buffer,
//! so it never blocks the caller and rapid cues overlap instead of queueing.

pub mod device;
pub mod mixer;
pub mod output;
pub mod tones;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use cpal::traits::{DeviceTrait, StreamTrait};
use stretch_core::CueSink;
use stretch_types::CueKind;

use crate::mixer::CueMixer;

const ALL_CUES: [CueKind; 5] = [
    CueKind::ExerciseStart,
    CueKind::Countdown,
    CueKind::FinalCountdown,
    CueKind::Completion,
    CueKind::Transition,
];

pub struct CuePlayer {
    mixer: Arc<CueMixer>,
    rendered: HashMap<CueKind, Vec<f32>>,
    device_name: String,
    // Keeps the output callback alive.
    _stream: cpal::Stream,
}

impl CuePlayer {
    /// Open the default output device, or the first one whose name contains `needle`.
    pub fn open(needle: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let dev = device::pick_device(&host, needle)?;
        let device_name = dev
            .description()
            .map(|d| d.to_string())
            .unwrap_or_else(|_| "<unknown>".to_string());

        let config = device::pick_output_config(&dev, device::PREFERRED_RATE)?;
        let sample_rate = config.sample_rate();
        let stream_config: cpal::StreamConfig = config.clone().into();

        let mixer = Arc::new(CueMixer::new(mixer::capacity_for(
            sample_rate,
            mixer::MAX_BUFFERED_SECONDS,
        )));
        let stream =
            output::build_output_stream(&dev, &stream_config, config.sample_format(), &mixer)?;
        stream
            .play()
            .map_err(|e| anyhow!("start cue stream on {device_name}: {e}"))?;

        tracing::info!(
            device = %device_name,
            sample_rate,
            channels = stream_config.channels,
            format = ?config.sample_format(),
            "cue output ready"
        );

        Ok(Self {
            mixer,
            rendered: render_all(sample_rate),
            device_name,
            _stream: stream,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl CueSink for CuePlayer {
    fn play(&self, cue: CueKind) -> Result<()> {
        let samples = self
            .rendered
            .get(&cue)
            .ok_or_else(|| anyhow!("cue {} not rendered", cue.name()))?;
        let dropped = self.mixer.mix_in(samples);
        if dropped > 0 {
            tracing::debug!(cue = cue.name(), dropped, "cue truncated by full mixer");
        }
        tracing::trace!(cue = cue.name(), "cue queued");
        Ok(())
    }
}

/// Names of the output devices on the default host.
pub fn output_device_names() -> Result<Vec<String>> {
    let host = cpal::default_host();
    device::list_devices(&host)
}

fn render_all(sample_rate: u32) -> HashMap<CueKind, Vec<f32>> {
    ALL_CUES
        .iter()
        .map(|&cue| (cue, tones::render_cue(cue, sample_rate)))
        .collect()
}

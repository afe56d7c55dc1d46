//! CPAL output stream fed from a [`CueMixer`].
//!
//! The callback refills a small local buffer from the mixer without blocking, copies each
//! mono sample to every output channel and converts to the device sample format. When
//! no cue is sounding it writes silence.

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use cpal::traits::DeviceTrait;

use crate::mixer::CueMixer;

/// Frames pulled from the mixer per refill.
const REFILL_MAX_FRAMES: usize = 512;

/// Build an output stream that plays whatever is mixed into `mixer`.
pub fn build_output_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    mixer: &Arc<CueMixer>,
) -> Result<cpal::Stream> {
    match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(device, config, mixer),
        cpal::SampleFormat::I16 => build_stream::<i16>(device, config, mixer),
        cpal::SampleFormat::I32 => build_stream::<i32>(device, config, mixer),
        cpal::SampleFormat::U16 => build_stream::<u16>(device, config, mixer),
        other => Err(anyhow!("Unsupported sample format: {other:?}")),
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: &Arc<CueMixer>,
) -> Result<cpal::Stream>
where
    T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels_out = (config.channels as usize).max(1);
    let local = Arc::new(Mutex::new(LocalBuffer::default()));
    let mixer_cb = mixer.clone();

    let err_fn = |err| tracing::warn!("cue stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _| {
            let mut buf = local
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            fill_frames(&mut buf, &mixer_cb, data, channels_out);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

/// Mono samples already taken from the mixer but not yet written out.
#[derive(Default)]
struct LocalBuffer {
    pos: usize,
    src: Vec<f32>,
}

impl LocalBuffer {
    fn next(&mut self, mixer: &CueMixer) -> Option<f32> {
        if self.pos >= self.src.len() {
            self.pos = 0;
            self.src = mixer.pop(REFILL_MAX_FRAMES)?;
        }
        let sample = self.src.get(self.pos).copied();
        self.pos += 1;
        sample
    }
}

fn fill_frames<T>(buf: &mut LocalBuffer, mixer: &CueMixer, data: &mut [T], channels: usize)
where
    T: cpal::Sample + cpal::FromSample<f32>,
{
    for frame in data.chunks_mut(channels) {
        let value = buf.next(mixer).unwrap_or(0.0);
        let sample = <T as cpal::Sample>::from_sample::<f32>(value);
        frame.fill(sample);
    }
}

//! Microphone recording using cpal.
//!
//! Records at the input device's native rate, mixes down to mono and hands the
//! finished recording over as a 16-bit PCM WAV artifact.

use std::{
    io::Cursor,
    sync::{Arc, Mutex, PoisonError},
};

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    StreamConfig,
};
use log::{error, info};

use crate::{alarm::AudioArtifact, error::CaptureError};

/// A start/stop recording gesture.
pub trait AudioCapture {
    /// # Errors
    /// if the input can't be opened or a recording is already running
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Stops the running recording and returns it.
    ///
    /// # Errors
    /// if nothing is being recorded, nothing was captured or encoding fails
    fn stop(&mut self) -> Result<AudioArtifact, CaptureError>;

    fn is_recording(&self) -> bool;
}

pub struct CpalRecorder {
    device: cpal::Device,
    stream_config: StreamConfig,
    samples: Arc<Mutex<Vec<f32>>>,
    stream: Option<cpal::Stream>,
}

impl CpalRecorder {
    /// Opens the named input device, or the default one.
    ///
    /// # Errors
    /// if there is no such device or it has no usable input config
    pub fn new(input_device: Option<&str>) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = if let Some(name) = input_device {
            host.input_devices()
                .map_err(|e| CaptureError::Device(format!("cannot enumerate devices: {e}")))?
                .find(|d| {
                    d.description()
                        .ok()
                        .is_some_and(|desc| desc.name() == name)
                })
                .ok_or_else(|| CaptureError::Device(format!("input device '{name}' not found")))?
        } else {
            host.default_input_device()
                .ok_or(CaptureError::NoInputDevice)?
        };

        let default_config = device
            .default_input_config()
            .map_err(|e| CaptureError::Device(format!("no default input config: {e}")))?;
        let stream_config = StreamConfig {
            channels: default_config.channels(),
            sample_rate: default_config.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };
        info!(
            "recording from {}: {}Hz, {} channels",
            device
                .description()
                .map(|d| d.name().to_owned())
                .unwrap_or_else(|_| "<unknown>".into()),
            stream_config.sample_rate,
            stream_config.channels
        );

        Ok(Self {
            device,
            stream_config,
            samples: Arc::default(),
            stream: None,
        })
    }
}

impl AudioCapture for CpalRecorder {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.stream.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        let samples = Arc::clone(&self.samples);
        let channels = self.stream_config.channels;
        let stream = self
            .device
            .build_input_stream(
                &self.stream_config,
                move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                    samples
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .extend(to_mono(data, channels));
                },
                move |err| error!("audio input stream error: {err}"),
                None,
            )
            .map_err(|e| CaptureError::Device(format!("failed to build input stream: {e}")))?;
        stream
            .play()
            .map_err(|e| CaptureError::Device(format!("failed to start input stream: {e}")))?;

        self.stream = Some(stream);
        info!("recording started");
        Ok(())
    }

    fn stop(&mut self) -> Result<AudioArtifact, CaptureError> {
        let stream = self.stream.take().ok_or(CaptureError::NotRecording)?;
        drop(stream);
        let samples = std::mem::take(
            &mut *self.samples.lock().unwrap_or_else(PoisonError::into_inner),
        );
        info!("recording stopped after {} samples", samples.len());
        if samples.is_empty() {
            return Err(CaptureError::NoAudio);
        }
        encode_wav(&samples, self.stream_config.sample_rate).map(AudioArtifact::new)
    }

    fn is_recording(&self) -> bool {
        self.stream.is_some()
    }
}

/// Names of the available input devices.
///
/// # Errors
/// if the devices can't be enumerated
pub fn list_input_devices() -> Result<Vec<String>, CaptureError> {
    let devices = cpal::default_host()
        .input_devices()
        .map_err(|e| CaptureError::Device(format!("cannot enumerate devices: {e}")))?;
    Ok(devices
        .filter_map(|device| device.description().ok().map(|d| d.name().to_owned()))
        .collect())
}

/// Average interleaved frames down to one channel.
fn to_mono(data: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    let ch = usize::from(channels);
    data.chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / f32::from(channels))
        .collect()
}

/// Mono `f32` samples as a 16-bit PCM WAV file.
///
/// # Errors
/// if hound fails to write the file
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, CaptureError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
    for &sample in samples {
        #[allow(clippy::cast_possible_truncation)]
        let value = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
        writer.write_sample(value)?;
    }
    writer.finalize()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_frames_are_averaged() {
        assert_eq!(to_mono(&[0.5, 1.0, -0.5, 0.5], 2), vec![0.75, 0.0]);
        assert_eq!(to_mono(&[0.25, -0.25], 1), vec![0.25, -0.25]);
    }

    #[test]
    fn encoded_wav_is_readable() {
        let bytes = encode_wav(&[0.0, 0.5, -1.0, 2.0], 48_000).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 48_000);
        assert_eq!(spec.bits_per_sample, 16);
        let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(samples, vec![0, 16384, -i16::MAX, i16::MAX]);
    }
}

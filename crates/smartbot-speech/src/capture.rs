//! Microphone capture with utterance-boundary detection.
//!
//! Records from the default input device, downmixing to mono and resampling
//! to 16 kHz in the cpal callback. Recording starts when frame RMS energy
//! crosses the speech threshold and stops after a trailing-silence window,
//! bounded by a hard maximum duration. The whole capture runs on the calling
//! (blocking) thread; the cpal stream never leaves it.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use smartbot_types::SpeechError;

/// Whisper-compatible capture format: 16 kHz mono f32
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// RMS energy above which a frame counts as speech
const SPEECH_RMS_THRESHOLD: f32 = 0.015;

/// Polling interval for draining the capture buffer
const FRAME: Duration = Duration::from_millis(30);

/// Silence after speech that ends the utterance
const TRAILING_SILENCE: Duration = Duration::from_millis(1200);

/// Give up waiting for the user to start speaking after this long
const WAIT_FOR_SPEECH: Duration = Duration::from_secs(10);

/// Hard cap on a single utterance
const MAX_UTTERANCE: Duration = Duration::from_secs(30);

/// Thread-safe buffer filled by the cpal callback and drained by the
/// utterance loop.
#[derive(Clone)]
struct SampleBuffer {
    samples: Arc<Mutex<Vec<f32>>>,
}

impl SampleBuffer {
    fn new() -> Self {
        Self {
            samples: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn push(&self, data: &[f32]) {
        if let Ok(mut buf) = self.samples.lock() {
            buf.extend_from_slice(data);
        }
    }

    fn take(&self) -> Vec<f32> {
        self.samples
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }
}

/// Record one utterance from the default input device.
///
/// Returns 16 kHz mono samples. `SpeechError::Ambiguous` when no speech was
/// detected within the wait window; `SpeechError::Unavailable` for device
/// failures.
pub fn record_utterance() -> Result<Vec<f32>, SpeechError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| SpeechError::Unavailable("no default input device".to_string()))?;

    // Use the device's preferred config; many devices reject arbitrary
    // rates, so conversion happens in the callback instead.
    let supported = device
        .default_input_config()
        .map_err(|e| SpeechError::Unavailable(format!("failed to query input device: {}", e)))?;
    let device_rate = supported.sample_rate().0;
    let device_channels = supported.channels();
    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();

    let buffer = SampleBuffer::new();
    let cb_buffer = buffer.clone();
    let on_data = move |data: Vec<f32>| {
        let mono = downmix_to_mono(&data, device_channels as usize);
        let resampled = resample_linear(&mono, device_rate, TARGET_SAMPLE_RATE);
        cb_buffer.push(&resampled);
    };
    let on_error = |err: cpal::StreamError| {
        eprintln!("Audio stream error: {}", err);
    };

    let stream = match sample_format {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| on_data(data.to_vec()),
            on_error,
            None,
        ),
        cpal::SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                on_data(data.iter().map(|&s| s as f32 / 32_768.0).collect())
            },
            on_error,
            None,
        ),
        cpal::SampleFormat::U16 => device.build_input_stream(
            &config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                on_data(data.iter().map(|&s| (s as f32 - 32_768.0) / 32_768.0).collect())
            },
            on_error,
            None,
        ),
        other => {
            return Err(SpeechError::Unavailable(format!(
                "unsupported sample format {:?}",
                other
            )))
        }
    }
    .map_err(|e| SpeechError::Unavailable(format!("failed to open audio stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| SpeechError::Unavailable(format!("failed to start audio stream: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut speech_started = false;
    let started = Instant::now();
    let mut last_voice = Instant::now();

    loop {
        std::thread::sleep(FRAME);
        let fresh = buffer.take();
        if !fresh.is_empty() {
            if rms(&fresh) >= SPEECH_RMS_THRESHOLD {
                speech_started = true;
                last_voice = Instant::now();
            }
            if speech_started {
                samples.extend_from_slice(&fresh);
            }
        }

        if speech_started {
            if last_voice.elapsed() >= TRAILING_SILENCE || started.elapsed() >= MAX_UTTERANCE {
                break;
            }
        } else if started.elapsed() >= WAIT_FOR_SPEECH {
            // Nothing said at all; treat like an unintelligible utterance.
            return Err(SpeechError::Ambiguous);
        }
    }

    // Dropping the stream stops capture.
    drop(stream);
    Ok(samples)
}

/// Root-mean-square energy of a frame
pub(crate) fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Average interleaved channels down to mono
pub(crate) fn downmix_to_mono(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Linear-interpolation resampler
pub(crate) fn resample_linear(mono: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || mono.is_empty() {
        return mono.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = (mono.len() as f64 / ratio).ceil() as usize;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let src = i as f64 * ratio;
        let idx0 = src.floor() as usize;
        let idx1 = (idx0 + 1).min(mono.len() - 1);
        let frac = (src - idx0 as f64) as f32;
        out.push(mono[idx0] * (1.0 - frac) + mono[idx1] * frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_of_silence_is_zero() {
        assert_eq!(rms(&[0.0; 480]), 0.0);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn test_rms_of_constant_signal() {
        let frame = vec![0.5_f32; 100];
        assert!((rms(&frame) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_downmix_averages_channels() {
        let stereo = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix_to_mono(&stereo, 2), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let mono = [0.1, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&mono, 1), mono.to_vec());
    }

    #[test]
    fn test_resample_same_rate_passthrough() {
        let samples = [0.1, 0.2, 0.3];
        assert_eq!(resample_linear(&samples, 16_000, 16_000), samples.to_vec());
    }

    #[test]
    fn test_resample_halves_length_for_double_rate() {
        let samples: Vec<f32> = (0..1000).map(|i| (i as f32).sin()).collect();
        let out = resample_linear(&samples, 32_000, 16_000);
        assert_eq!(out.len(), 500);
    }

    #[test]
    fn test_resample_preserves_constant_signal() {
        let samples = vec![0.25_f32; 441];
        let out = resample_linear(&samples, 44_100, 16_000);
        assert!(!out.is_empty());
        for s in out {
            assert!((s - 0.25).abs() < 1e-5);
        }
    }
}

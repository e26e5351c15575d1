//! Audio loading and the short-time Fourier transform.

use rustfft::{Fft, FftPlanner, num_complex::Complex};
use std::{f64::consts::PI, path::Path, sync::Arc};
use tracing::{debug, info, warn};

use crate::config::{HOP_SIZE, TARGET_SAMPLE_RATE, WINDOW_SIZE};
use crate::error::{Error, Result};

/// Loads a WAV file as mono `i16` PCM at [`TARGET_SAMPLE_RATE`].
///
/// When `snip_seconds` is given only that many seconds from the start of the
/// recording are decoded. Any decode failure aborts the load.
pub fn load_and_prepare_audio(
    filepath: impl AsRef<Path>,
    snip_seconds: Option<u32>,
) -> Result<Vec<i16>> {
    let filepath = filepath.as_ref();
    let mut reader = hound::WavReader::open(filepath)?;
    let spec = reader.spec();

    debug!(
        path = %filepath.display(),
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        bits = spec.bits_per_sample,
        format = ?spec.sample_format,
        samples = reader.len(),
        "Opened audio file"
    );

    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(Error::UnsupportedAudio(format!(
            "{} channels at {} Hz",
            spec.channels, spec.sample_rate
        )));
    }

    let channels = spec.channels as usize;
    let limit = snip_seconds
        .map(|secs| secs as usize * spec.sample_rate as usize * channels)
        .unwrap_or(usize::MAX);

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Int => {
            if spec.bits_per_sample > 32 {
                return Err(Error::UnsupportedAudio(format!(
                    "{}-bit integer samples",
                    spec.bits_per_sample
                )));
            }
            let scale = 2f64.powi(16 - spec.bits_per_sample as i32);
            reader
                .samples::<i32>()
                .take(limit)
                .map(|s| s.map(|v| v as f64 * scale))
                .collect::<std::result::Result<_, _>>()?
        }
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .take(limit)
            .map(|s| s.map(|v| v as f64 * i16::MAX as f64))
            .collect::<std::result::Result<_, _>>()?,
    };

    let mono = to_mono(&interleaved, channels);
    if channels > 1 {
        debug!("Downmixed {} channels to mono", channels);
    }

    if spec.sample_rate < TARGET_SAMPLE_RATE {
        warn!(
            "Upsampling {} Hz → {} Hz, high frequency bins will be empty",
            spec.sample_rate, TARGET_SAMPLE_RATE
        );
    }
    let mut resampled = resample(&mono, spec.sample_rate, TARGET_SAMPLE_RATE);

    if let Some(secs) = snip_seconds {
        resampled.truncate(secs as usize * TARGET_SAMPLE_RATE as usize);
    }

    info!(
        "Audio loaded: {} samples ({:.2}s)",
        resampled.len(),
        resampled.len() as f64 / TARGET_SAMPLE_RATE as f64
    );

    Ok(resampled
        .into_iter()
        .map(|v| v.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16)
        .collect())
}

fn to_mono(samples: &[f64], channels: usize) -> Vec<f64> {
    if channels == 1 {
        return samples.to_vec();
    }

    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f64>() / channels as f64)
        .collect()
}

/// Linear-interpolation resampler.
fn resample(samples: &[f64], original_sample_rate: u32, target_sample_rate: u32) -> Vec<f64> {
    if original_sample_rate == target_sample_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let step = original_sample_rate as f64 / target_sample_rate as f64;
    let output_len =
        (samples.len() as u64 * target_sample_rate as u64 / original_sample_rate as u64) as usize;

    (0..output_len)
        .map(|i| {
            let position = i as f64 * step;
            let index = position.floor() as usize;
            let frac = position - index as f64;
            let current = samples[index];
            let next = samples.get(index + 1).copied().unwrap_or(current);
            current + (next - current) * frac
        })
        .collect()
}

pub fn hamming_window(window_size: usize) -> Vec<f64> {
    if window_size == 1 {
        return vec![1.0];
    }

    (0..window_size)
        .map(|n| {
            // 0.54 - 0.46 * cos(2 * pi * n / (N - 1))
            let value = 2.0 * PI * (n as f64) / (window_size as f64 - 1.0);
            0.54 - 0.46 * value.cos()
        })
        .collect()
}

/// Dense power grid indexed by `(time_bin, freq_bin)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    frames: Vec<Vec<f64>>,
    num_bins: usize,
}

impl Spectrogram {
    pub fn from_frames(frames: Vec<Vec<f64>>) -> Self {
        let num_bins = frames.first().map(Vec::len).unwrap_or(0);
        debug_assert!(frames.iter().all(|f| f.len() == num_bins));
        Self { frames, num_bins }
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty() || self.num_bins == 0
    }

    pub fn frames(&self) -> &[Vec<f64>] {
        &self.frames
    }
}

/// STFT with a Hamming window and a fixed hop.
///
/// The FFT plan and window coefficients are built once; [`compute`](Self::compute)
/// holds no other state, so the same input always yields the same grid.
pub struct SpectrogramComputer {
    window_size: usize,
    hop_size: usize,
    window_coefficients: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
}

impl SpectrogramComputer {
    pub fn new(window_size: usize, hop_size: usize) -> Self {
        assert!(window_size > 0 && hop_size > 0, "window and hop must be non-zero");
        let mut planner = FftPlanner::new();
        Self {
            window_size,
            hop_size,
            window_coefficients: hamming_window(window_size),
            fft: planner.plan_fft_forward(window_size),
        }
    }

    /// One frame per hop where a full window fits; bins `0..window_size / 2`.
    pub fn compute(&self, samples: &[i16]) -> Spectrogram {
        let num_freq_bins = self.window_size / 2;
        let mut frames: Vec<Vec<f64>> = Vec::new();
        let mut complex_buffer: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); self.window_size];

        for audio_chunk in samples.windows(self.window_size).step_by(self.hop_size) {
            for (slot, (sample, coeff)) in complex_buffer
                .iter_mut()
                .zip(audio_chunk.iter().zip(self.window_coefficients.iter()))
            {
                *slot = Complex::new(*sample as f64 * coeff, 0.0);
            }

            self.fft.process(&mut complex_buffer);

            frames.push(
                complex_buffer[..num_freq_bins]
                    .iter()
                    .map(|c| c.norm_sqr())
                    .collect(),
            );
        }

        debug!(
            "Spectrogram generated: {} time slices, {} frequency bins",
            frames.len(),
            if frames.is_empty() { 0 } else { num_freq_bins }
        );

        Spectrogram::from_frames(frames)
    }
}

impl Default for SpectrogramComputer {
    fn default() -> Self {
        Self::new(WINDOW_SIZE, HOP_SIZE)
    }
}

/// Start time in seconds of a frame produced with `hop_size` at [`TARGET_SAMPLE_RATE`].
pub fn frame_to_seconds(time_bin: usize, hop_size: usize) -> f64 {
    (time_bin * hop_size) as f64 / TARGET_SAMPLE_RATE as f64
}

//! Tempo estimation from an onset-strength envelope.
//!
//! Independent of the fingerprint pipeline. The envelope is the half-wave
//! rectified log spectral flux; the beat period is the autocorrelation lag with
//! the most support between [`MIN_BPM`] and [`MAX_BPM`].

use std::path::Path;
use tracing::debug;

use crate::audio::{SpectrogramComputer, load_and_prepare_audio};
use crate::config::{MAX_BPM, MIN_BPM, TARGET_SAMPLE_RATE, TEMPO_HOP_SIZE, TEMPO_WINDOW_SIZE};
use crate::error::{Error, Result};

/// Rounded beats per minute of the WAV file at `path`.
pub fn estimate_bpm(path: impl AsRef<Path>) -> Result<u32> {
    let samples = load_and_prepare_audio(path, None)?;
    estimate_bpm_from_samples(&samples)
}

/// Rounded beats per minute of mono samples at [`TARGET_SAMPLE_RATE`].
pub fn estimate_bpm_from_samples(samples: &[i16]) -> Result<u32> {
    let frames_per_minute = 60.0 * TARGET_SAMPLE_RATE as f64 / TEMPO_HOP_SIZE as f64;
    let min_lag = (frames_per_minute / MAX_BPM).ceil() as usize;
    let max_lag = (frames_per_minute / MIN_BPM).floor() as usize;

    let needed_frames = 2 * max_lag + 2;
    let needed = (needed_frames - 1) * TEMPO_HOP_SIZE + TEMPO_WINDOW_SIZE;
    if samples.len() < needed {
        return Err(Error::InsufficientAudio {
            needed,
            got: samples.len(),
        });
    }

    let spectrogram = SpectrogramComputer::new(TEMPO_WINDOW_SIZE, TEMPO_HOP_SIZE).compute(samples);
    let envelope = onset_envelope(spectrogram.frames());

    let scores: Vec<f64> = (min_lag..=max_lag)
        .map(|lag| autocorrelation(&envelope, lag))
        .collect();

    let (best, &best_score) = scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1).then(b.0.cmp(&a.0)))
        .ok_or_else(|| Error::UnsupportedAudio("empty tempo range".to_string()))?;

    if best_score <= 0.0 {
        return Err(Error::UnsupportedAudio("no periodic onsets detected".to_string()));
    }

    let lag = min_lag as f64 + best as f64 + parabolic_offset(&scores, best);
    let bpm = frames_per_minute / lag;
    debug!(
        "Tempo: lag {:.2} frames, {:.2} BPM ({} envelope frames)",
        lag,
        bpm,
        envelope.len()
    );

    Ok(bpm.round() as u32)
}

/// Mean-removed positive log-power flux per frame.
fn onset_envelope(frames: &[Vec<f64>]) -> Vec<f64> {
    let mut envelope: Vec<f64> = frames
        .windows(2)
        .map(|pair| {
            pair[1]
                .iter()
                .zip(&pair[0])
                .map(|(cur, prev)| (cur.ln_1p() - prev.ln_1p()).max(0.0))
                .sum()
        })
        .collect();

    if !envelope.is_empty() {
        let mean = envelope.iter().sum::<f64>() / envelope.len() as f64;
        envelope.iter_mut().for_each(|v| *v -= mean);
    }
    envelope
}

fn autocorrelation(signal: &[f64], lag: usize) -> f64 {
    signal.iter().zip(&signal[lag.min(signal.len())..]).map(|(a, b)| a * b).sum()
}

/// Sub-lag refinement from the neighbouring scores.
fn parabolic_offset(scores: &[f64], index: usize) -> f64 {
    if index == 0 || index + 1 >= scores.len() {
        return 0.0;
    }
    let (left, centre, right) = (scores[index - 1], scores[index], scores[index + 1]);
    let denom = left - 2.0 * centre + right;
    if denom >= 0.0 {
        return 0.0;
    }
    (0.5 * (left - right) / denom).clamp(-0.5, 0.5)
}

//! Landmark extraction with a separable 2-D maximum filter.
//!
//! A cell is a peak when it equals the maximum of the centred
//! `(2·⌊w/2⌋ + 1) × (2·⌊h/2⌋ + 1)` neighbourhood around it (clipped at the grid
//! edges) and is louder than [`MIN_PEAK_MAGNITUDE`].
//!
//! Plateaus are resolved in scan order (time-major, then frequency): a candidate
//! is dropped when an already accepted peak of the same magnitude lies inside its
//! neighbourhood, so the first cell of a plateau wins.

use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::audio::Spectrogram;
use crate::config::MIN_PEAK_MAGNITUDE;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub time_bin: usize,
    pub freq_bin: usize,
    pub magnitude: f64,
}

/// Returns the peaks of `spectrogram` in `(time_bin, freq_bin)` order.
///
/// At most `max_peaks` are returned; past the cap the strongest are kept.
pub fn extract_peaks(
    spectrogram: &Spectrogram,
    filter_width: usize,
    filter_height: usize,
    max_peaks: usize,
) -> Vec<Peak> {
    if spectrogram.is_empty() {
        return Vec::new();
    }

    let time_radius = filter_width / 2;
    let freq_radius = filter_height / 2;
    let local_max = maximum_filter(spectrogram, time_radius, freq_radius);

    let mut peaks: Vec<Peak> = Vec::new();
    for (time_bin, (frame, max_frame)) in spectrogram.frames().iter().zip(&local_max).enumerate() {
        for (freq_bin, (&magnitude, &max)) in frame.iter().zip(max_frame).enumerate() {
            if magnitude <= MIN_PEAK_MAGNITUDE || magnitude != max {
                continue;
            }
            let candidate = Peak {
                time_bin,
                freq_bin,
                magnitude,
            };
            if !shadowed_by_plateau(&peaks, &candidate, time_radius, freq_radius) {
                peaks.push(candidate);
            }
        }
    }

    debug!(
        "Found {} peaks with a {}x{} filter",
        peaks.len(),
        filter_width,
        filter_height
    );

    if peaks.len() > max_peaks {
        warn!(
            "Peak count {} exceeds cap {}, keeping the strongest",
            peaks.len(),
            max_peaks
        );
        // Stable sort keeps scan order among equal magnitudes.
        peaks.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
        peaks.truncate(max_peaks);
        peaks.sort_by_key(|p| (p.time_bin, p.freq_bin));
    }

    peaks
}

/// True if an accepted peak with the same magnitude already covers `candidate`.
fn shadowed_by_plateau(
    accepted: &[Peak],
    candidate: &Peak,
    time_radius: usize,
    freq_radius: usize,
) -> bool {
    accepted
        .iter()
        .rev()
        .take_while(|p| candidate.time_bin - p.time_bin <= time_radius)
        .any(|p| {
            p.magnitude == candidate.magnitude
                && p.freq_bin.abs_diff(candidate.freq_bin) <= freq_radius
        })
}

/// Neighbourhood maximum of every cell: a frequency pass then a time pass.
fn maximum_filter(spectrogram: &Spectrogram, time_radius: usize, freq_radius: usize) -> Vec<Vec<f64>> {
    let num_frames = spectrogram.num_frames();
    let num_bins = spectrogram.num_bins();

    let mut by_freq: Vec<Vec<f64>> = spectrogram
        .frames()
        .iter()
        .map(|frame| {
            let mut out = vec![0.0; num_bins];
            sliding_max(frame, freq_radius, &mut out);
            out
        })
        .collect();

    let mut column = vec![0.0; num_frames];
    let mut column_max = vec![0.0; num_frames];
    for freq_bin in 0..num_bins {
        for (slot, frame) in column.iter_mut().zip(&by_freq) {
            *slot = frame[freq_bin];
        }
        sliding_max(&column, time_radius, &mut column_max);
        for (frame, &max) in by_freq.iter_mut().zip(&column_max) {
            frame[freq_bin] = max;
        }
    }

    by_freq
}

/// `out[i] = max(input[i - radius ..= i + radius])`, clipped to the slice.
///
/// Monotonic deque, O(n) regardless of `radius`.
fn sliding_max(input: &[f64], radius: usize, out: &mut [f64]) {
    let n = input.len();
    let mut deque: VecDeque<usize> = VecDeque::with_capacity((2 * radius + 1).min(n));
    let mut next = 0;

    for i in 0..n {
        let hi = (i + radius).min(n - 1);
        while next <= hi {
            while deque.back().is_some_and(|&j| input[j] <= input[next]) {
                deque.pop_back();
            }
            deque.push_back(next);
            next += 1;
        }
        let lo = i.saturating_sub(radius);
        while deque.front().is_some_and(|&j| j < lo) {
            deque.pop_front();
        }
        out[i] = deque.front().map(|&j| input[j]).unwrap_or(f64::NEG_INFINITY);
    }
}

//! Fingerprint creation.
//!
//! # Pipeline
//!
//! 1. Load mono samples, truncated to the first 10 seconds for queries
//! 2. Compute the STFT power spectrogram (4ms frames)
//! 3. Extract local-maximum peaks with the profile's `w × h` filter
//! 4. Build quads from each anchor's `[c, c + r)` search window
//! 5. Keep the `q` strongest quads per anchor
//! 6. Hash each kept quad's geometry

use std::{collections::BTreeSet, path::{Path, PathBuf}};
use tracing::{debug, info};

use crate::audio::{self, SpectrogramComputer};
use crate::config::{DEFAULT_MAX_PEAKS, TARGET_SAMPLE_RATE};
use crate::error::Result;
use crate::hashing::{QuadHash, hash_quad};
use crate::peaks::{Peak, extract_peaks};
use crate::profile::{FingerprintKind, FingerprintProfile};
use crate::quads::{Quad, QuadEnumeration, strongest_quads};

/// Bounds on intermediate work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Upper bound on extracted peaks; the strongest are kept past it.
    pub max_peaks: usize,
    pub enumeration: QuadEnumeration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_peaks: DEFAULT_MAX_PEAKS,
            enumeration: QuadEnumeration::Exhaustive,
        }
    }
}

/// Peaks, kept quads and hashes of one recording.
///
/// `hashes()[i]` is the hash of `quads()[i]`, and every quad's `anchor_index`
/// points into `peaks()`.
#[derive(Debug, Clone)]
pub struct Fingerprint {
    source: Option<PathBuf>,
    kind: FingerprintKind,
    peaks: Vec<Peak>,
    quads: Vec<Quad>,
    hashes: Vec<QuadHash>,
}

impl Fingerprint {
    /// Fingerprints the WAV file at `path`.
    pub fn create(path: impl AsRef<Path>, kind: FingerprintKind) -> Result<Self> {
        Self::create_with_options(path, kind, &PipelineOptions::default())
    }

    pub fn create_with_options(
        path: impl AsRef<Path>,
        kind: FingerprintKind,
        options: &PipelineOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        info!("Creating {} fingerprint for {}", kind, path.display());

        let samples = audio::load_and_prepare_audio(path, kind.snip_seconds())?;
        let mut fingerprint = Self::from_samples_with_options(&samples, kind, options);
        fingerprint.source = Some(path.to_path_buf());
        Ok(fingerprint)
    }

    /// Fingerprints mono samples already at [`TARGET_SAMPLE_RATE`].
    ///
    /// The kind's time window is still applied.
    pub fn from_samples(samples: &[i16], kind: FingerprintKind) -> Self {
        Self::from_samples_with_options(samples, kind, &PipelineOptions::default())
    }

    pub fn from_samples_with_options(
        samples: &[i16],
        kind: FingerprintKind,
        options: &PipelineOptions,
    ) -> Self {
        let samples = match kind.snip_seconds() {
            Some(secs) => &samples[..samples.len().min(secs as usize * TARGET_SAMPLE_RATE as usize)],
            None => samples,
        };
        let profile = kind.profile();

        let spectrogram = SpectrogramComputer::default().compute(samples);
        let peaks = extract_peaks(
            &spectrogram,
            profile.filter_width(),
            profile.filter_height(),
            options.max_peaks,
        );
        let quads = strongest_quads(&peaks, &profile, options.enumeration);
        let hashes: Vec<QuadHash> = quads.iter().map(hash_quad).collect();

        debug!(
            "{} fingerprint: {} frames, {} peaks, {} quads",
            kind,
            spectrogram.num_frames(),
            peaks.len(),
            quads.len()
        );
        info!("Generated {} hashes", hashes.len());

        Self {
            source: None,
            kind,
            peaks,
            quads,
            hashes,
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn kind(&self) -> FingerprintKind {
        self.kind
    }

    pub fn profile(&self) -> FingerprintProfile {
        self.kind.profile()
    }

    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    /// Kept quads, in anchor order and best-first within an anchor.
    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    pub fn hashes(&self) -> &[QuadHash] {
        &self.hashes
    }

    /// Distinct hash tokens.
    pub fn hash_set(&self) -> BTreeSet<QuadHash> {
        self.hashes.iter().copied().collect()
    }

    /// `(hash, anchor time bin)` pairs, what a corpus index stores per track.
    pub fn hashes_with_offsets(&self) -> impl Iterator<Item = (QuadHash, usize)> + '_ {
        self.hashes
            .iter()
            .zip(&self.quads)
            .map(|(hash, quad)| (*hash, quad.anchor.time_bin))
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

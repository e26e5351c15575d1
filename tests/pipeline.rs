//! End-to-end tests over WAV files

use std::collections::{BTreeSet, HashMap};
use std::f64::consts::PI;
use std::path::Path;

use quadprint::{
    Error, Fingerprint, FingerprintKind, FingerprintProfile, Peak, QuadEnumeration,
    audio::frame_to_seconds,
    config::{HOP_SIZE, TARGET_SAMPLE_RATE},
    content_digest, estimate_bpm,
    hashing::hash_quad,
    quads::strongest_quads,
};

// =============================================================================
// Helpers
// =============================================================================

/// Quarter-second tone bursts with a pseudo-random pitch sequence.
fn tone_bursts(seconds: f64, rate: u32) -> Vec<f64> {
    stretched_tone_bursts(seconds, rate, 1.0)
}

/// The same pitch sequence played with every burst `stretch` times as long.
fn stretched_tone_bursts(seconds: f64, rate: u32, stretch: f64) -> Vec<f64> {
    let rate = rate as f64;
    let total = (seconds * stretch * rate) as usize;
    let burst = (0.25 * stretch * rate) as usize;
    let mut state: u32 = 987_654_321;
    let freqs: Vec<f64> = (0..total / burst + 1)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
            200.0 + ((state >> 16) % 3400) as f64
        })
        .collect();

    (0..total)
        .map(|i| {
            let t = i as f64 / rate;
            let envelope = ((i % burst) as f64 / burst as f64 * PI).sin();
            0.4 * envelope * (2.0 * PI * freqs[i / burst] * t).sin()
        })
        .collect()
}

fn write_wav(path: &Path, samples: &[f64], rate: u32, channels: u16) {
    let spec = hound::WavSpec {
        channels,
        sample_rate: rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        let v = (s * i16::MAX as f64) as i16;
        for _ in 0..channels {
            writer.write_sample(v).unwrap();
        }
    }
    writer.finalize().unwrap();
}

fn to_pcm(samples: &[f64]) -> Vec<i16> {
    samples.iter().map(|&s| (s * i16::MAX as f64) as i16).collect()
}

fn peak(time_bin: usize, freq_bin: usize, magnitude: f64) -> Peak {
    Peak {
        time_bin,
        freq_bin,
        magnitude,
    }
}

/// Three well separated constellations, companions 350..=540 frames after the
/// anchor, spanning the reference search window.
fn constellations(scale_num: usize, scale_den: usize) -> Vec<Peak> {
    let offsets = [(350, 12), (400, -40), (450, 25), (500, -5), (540, 60)];
    let mut peaks = Vec::new();
    for (k, base) in [0usize, 3000, 6000].into_iter().enumerate() {
        let anchor_time = base * scale_num / scale_den;
        let anchor_freq = 100 + 50 * k;
        peaks.push(peak(anchor_time, anchor_freq, 50.0));
        for (i, &(dt, df)) in offsets.iter().enumerate() {
            peaks.push(peak(
                anchor_time + dt * scale_num / scale_den,
                (anchor_freq as i64 + df) as usize,
                10.0 + i as f64,
            ));
        }
    }
    peaks
}

// =============================================================================
// Fingerprint Tests
// =============================================================================

#[test]
fn test_reference_thirty_seconds_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reference.wav");
    // Stereo at 16 kHz exercises downmix and resampling
    write_wav(&path, &tone_bursts(30.0, 16_000), 16_000, 2);

    let first = Fingerprint::create(&path, FingerprintKind::Reference).unwrap();
    assert_eq!(first.source(), Some(path.as_path()));
    assert_eq!(first.kind(), FingerprintKind::Reference);
    assert_eq!(first.profile(), FingerprintProfile::REFERENCE);
    assert!(!first.peaks().is_empty());
    assert!(!first.hashes().is_empty());
    assert!(first.hashes().len() <= 9 * first.peaks().len());

    let mut per_anchor: HashMap<usize, usize> = HashMap::new();
    for quad in first.quads() {
        *per_anchor.entry(quad.anchor_index).or_default() += 1;
    }
    assert!(per_anchor.values().all(|&n| n <= 9));

    let second = Fingerprint::create(&path, FingerprintKind::Reference).unwrap();
    assert_eq!(first.hash_set(), second.hash_set());
    assert_eq!(first.hashes(), second.hashes());
}

#[test]
fn test_query_truncates_to_ten_seconds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.wav");
    write_wav(&path, &tone_bursts(16.0, TARGET_SAMPLE_RATE), TARGET_SAMPLE_RATE, 1);

    let query = Fingerprint::create(&path, FingerprintKind::Query).unwrap();
    let seconds = |bin: usize| frame_to_seconds(bin, HOP_SIZE);

    assert!(!query.peaks().is_empty());
    assert!(query.peaks().iter().all(|p| seconds(p.time_bin) < 10.0));
    assert!(query.quads().iter().all(|q| q
        .companions
        .iter()
        .all(|p| seconds(p.time_bin) < 10.0)));
    assert!(query.hashes_with_offsets().all(|(_, t)| seconds(t) < 10.0));

    let reference = Fingerprint::create(&path, FingerprintKind::Reference).unwrap();
    assert!(reference.peaks().iter().any(|p| seconds(p.time_bin) >= 10.0));
}

#[test]
fn test_same_samples_same_hashes_from_file_and_memory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mono.wav");
    let signal = tone_bursts(6.0, TARGET_SAMPLE_RATE);
    write_wav(&path, &signal, TARGET_SAMPLE_RATE, 1);

    let from_file = Fingerprint::create(&path, FingerprintKind::Reference).unwrap();
    let from_memory = Fingerprint::from_samples(&to_pcm(&signal), FingerprintKind::Reference);
    assert_eq!(from_file.hashes(), from_memory.hashes());
}

#[test]
fn test_silent_file_yields_empty_hash_set() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("silence.wav");
    write_wav(&path, &vec![0.0; 8000 * 4], TARGET_SAMPLE_RATE, 1);

    let fp = Fingerprint::create(&path, FingerprintKind::Reference).unwrap();
    assert!(fp.peaks().is_empty());
    assert!(fp.hash_set().is_empty());
}

#[test]
fn test_unreadable_audio_aborts_creation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not_audio.wav");
    std::fs::write(&path, b"definitely not a RIFF header").unwrap();

    let err = Fingerprint::create(&path, FingerprintKind::Query).unwrap_err();
    assert!(matches!(err, Error::AudioDecode(_)));

    let missing = Fingerprint::create(dir.path().join("missing.wav"), FingerprintKind::Reference);
    assert!(missing.is_err());
}

#[test]
fn test_invalid_profile_is_a_configuration_error() {
    let err = FingerprintProfile::try_from((10, 200, 345, 150, 75)).unwrap_err();
    assert!(matches!(err, Error::InvalidProfile(_)));
    assert!("Sample".parse::<FingerprintKind>().is_err());
}

// =============================================================================
// Tolerance Tests
// =============================================================================

#[test]
fn test_stretched_constellations_share_hashes() {
    let reference_quads = strongest_quads(
        &constellations(1, 1),
        &FingerprintProfile::REFERENCE,
        QuadEnumeration::Exhaustive,
    );
    let reference: BTreeSet<_> = reference_quads.iter().map(hash_quad).collect();
    // 3 anchors, C(5, 3) = 10 quads each, 9 kept
    assert_eq!(reference_quads.len(), 27);

    for (num, den) in [(4, 5), (6, 5)] {
        let query_quads = strongest_quads(
            &constellations(num, den),
            &FingerprintProfile::QUERY,
            QuadEnumeration::Exhaustive,
        );
        let query: BTreeSet<_> = query_quads.iter().map(hash_quad).collect();
        let shared = reference.intersection(&query).count();
        assert_eq!(shared, reference.len(), "stretch {}/{}", num, den);
    }
}

#[test]
fn test_stretched_recording_shares_hashes() {
    let reference = Fingerprint::from_samples(
        &to_pcm(&tone_bursts(30.0, TARGET_SAMPLE_RATE)),
        FingerprintKind::Reference,
    )
    .hash_set();
    assert!(!reference.is_empty());

    for stretch in [0.8, 0.9, 1.1, 1.2] {
        let samples = to_pcm(&stretched_tone_bursts(30.0, TARGET_SAMPLE_RATE, stretch));
        let query = Fingerprint::from_samples(&samples, FingerprintKind::Query).hash_set();
        let shared = reference.intersection(&query).count();
        assert!(shared > 0, "stretch {}: no shared hashes", stretch);
    }
}

// =============================================================================
// Utility Tests
// =============================================================================

#[test]
fn test_content_digest_of_wav() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.wav");
    let b = dir.path().join("b.wav");
    write_wav(&a, &tone_bursts(1.0, TARGET_SAMPLE_RATE), TARGET_SAMPLE_RATE, 1);
    std::fs::copy(&a, &b).unwrap();

    let digest = content_digest(&a).unwrap();
    assert_eq!(digest.len(), 40);
    assert_eq!(digest, digest.to_uppercase());
    assert_eq!(digest, content_digest(&b).unwrap());

    let mut bytes = std::fs::read(&b).unwrap();
    let last = bytes.len() - 1;
    bytes[last] = bytes[last].wrapping_add(1);
    std::fs::write(&b, bytes).unwrap();
    assert_ne!(digest, content_digest(&b).unwrap());
}

#[test]
fn test_tempo_of_click_track_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clicks.wav");
    let rate = TARGET_SAMPLE_RATE as f64;
    let mut signal = vec![0.0; (20.0 * rate) as usize];
    // 120 BPM: one click every 4000 samples
    for start in (0..signal.len()).step_by(4000) {
        for i in 0..200.min(signal.len() - start) {
            let decay = (-(i as f64) / 40.0).exp();
            signal[start + i] = 0.6 * decay * (2.0 * PI * 1000.0 * i as f64 / rate).sin();
        }
    }
    write_wav(&path, &signal, TARGET_SAMPLE_RATE, 1);

    assert_eq!(estimate_bpm(&path).unwrap(), 120);
}

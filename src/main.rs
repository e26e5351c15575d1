//! quadprint CLI
//!
//! - Fingerprint a WAV file (reference or query)
//! - Whole-file content digest
//! - Tempo estimate
//! - Spectrogram / landmark rendering

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use quadprint::{
    Fingerprint, FingerprintKind, ProfileParams, SpectrogramComputer, content_digest,
    estimate_bpm, load_and_prepare_audio, visualize::render_landmarks,
};

/// Landmark audio fingerprinting
#[derive(Parser)]
#[command(name = "quadprint")]
#[command(version)]
#[command(about = "Quad-hash audio fingerprinting toolkit", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute quad hashes for a WAV file
    Fingerprint {
        /// Path to the WAV file
        path: PathBuf,

        /// Fingerprint type (reference, query)
        #[arg(short, long, default_value = "reference")]
        kind: FingerprintKind,
    },

    /// SHA-1 of the raw file bytes
    Digest {
        path: PathBuf,
    },

    /// Estimate tempo in BPM
    Tempo {
        path: PathBuf,
    },

    /// Render the spectrogram with peaks and kept quads to a PNG
    Visualize {
        path: PathBuf,

        /// Output image
        #[arg(short, long, default_value = "landmarks.png")]
        output: PathBuf,

        #[arg(short, long, default_value = "reference")]
        kind: FingerprintKind,
    },
}

#[derive(Serialize)]
struct FingerprintReport {
    source: PathBuf,
    kind: FingerprintKind,
    profile: ProfileParams,
    peaks: usize,
    hashes: Vec<HashEntry>,
}

#[derive(Serialize)]
struct HashEntry {
    hash: String,
    anchor_time: usize,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    let json = cli.format.eq_ignore_ascii_case("json");

    match cli.command {
        Commands::Fingerprint { path, kind } => {
            let fingerprint = Fingerprint::create(&path, kind)
                .with_context(|| format!("fingerprinting {}", path.display()))?;
            let report = FingerprintReport {
                source: path,
                kind,
                profile: kind.profile().params(),
                peaks: fingerprint.peaks().len(),
                hashes: fingerprint
                    .hashes_with_offsets()
                    .map(|(hash, anchor_time)| HashEntry {
                        hash: hash.to_string(),
                        anchor_time,
                    })
                    .collect(),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "{} ({}): {} peaks, {} hashes, {} distinct",
                    report.source.display(),
                    report.kind,
                    report.peaks,
                    report.hashes.len(),
                    fingerprint.hash_set().len()
                );
                for entry in &report.hashes {
                    println!("{}\t{}", entry.hash, entry.anchor_time);
                }
            }
        }

        Commands::Digest { path } => {
            let digest = content_digest(&path)
                .with_context(|| format!("hashing {}", path.display()))?;
            if json {
                println!("{}", serde_json::json!({ "path": path, "digest": digest }));
            } else {
                println!("{}", digest);
            }
        }

        Commands::Tempo { path } => {
            let bpm = estimate_bpm(&path)
                .with_context(|| format!("estimating tempo of {}", path.display()))?;
            if json {
                println!("{}", serde_json::json!({ "path": path, "bpm": bpm }));
            } else {
                println!("{} BPM", bpm);
            }
        }

        Commands::Visualize { path, output, kind } => {
            let samples = load_and_prepare_audio(&path, kind.snip_seconds())
                .with_context(|| format!("loading {}", path.display()))?;
            let spectrogram = SpectrogramComputer::default().compute(&samples);
            let fingerprint = Fingerprint::from_samples(&samples, kind);
            render_landmarks(&spectrogram, fingerprint.peaks(), fingerprint.quads(), &output)?;
        }
    }

    Ok(())
}

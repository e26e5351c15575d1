//! Landmark-based audio fingerprinting.
//!
//! A recording is turned into a set of quad hashes: spectral peaks are grouped
//! four at a time (an anchor plus three companions in a window ahead of it) and
//! each group's relative geometry, normalized in time, is packed into a token.
//! Tokens survive moderate noise, excerpting and ±20% time stretch, which lets
//! a short query clip be looked up in an index of reference recordings.
//!
//! ```no_run
//! use quadprint::{Fingerprint, FingerprintKind};
//!
//! let reference = Fingerprint::create("track.wav", FingerprintKind::Reference)?;
//! let query = Fingerprint::create("clip.wav", FingerprintKind::Query)?;
//! let shared = reference.hash_set().intersection(&query.hash_set()).count();
//! println!("{} shared hashes", shared);
//! # Ok::<(), quadprint::Error>(())
//! ```

pub mod audio;
pub mod config;
pub mod digest;
pub mod error;
pub mod fingerprint;
pub mod hashing;
pub mod peaks;
pub mod profile;
pub mod quads;
pub mod tempo;
pub mod visualize;

pub use audio::{Spectrogram, SpectrogramComputer, load_and_prepare_audio};
pub use digest::content_digest;
pub use error::{Error, Result};
pub use fingerprint::{Fingerprint, PipelineOptions};
pub use hashing::QuadHash;
pub use peaks::Peak;
pub use profile::{FingerprintKind, FingerprintProfile, ProfileParams};
pub use quads::{Quad, QuadEnumeration, QuadGeometry};
pub use tempo::estimate_bpm;

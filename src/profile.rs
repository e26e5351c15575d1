//! The two named fingerprint configurations.
//!
//! All durations are in STFT frames of [`HOP_SIZE`](crate::config::HOP_SIZE)
//! samples (4ms); the filter height is in frequency bins.
//!
//! | profile   | q  | r   | c   | w   | h  |
//! |-----------|----|-----|-----|-----|----|
//! | Reference | 9  | 200 | 345 | 150 | 75 |
//! | Query     | 20 | 378 | 276 | 125 | 60 |
//!
//! Reference: r = 800ms, c = 1380ms. A query played up to ε faster or slower
//! moves the reference window `[c, c + r)` to anywhere inside
//! `[c · (1 - ε), (c + r) · (1 + ε))`, so that is the Query window:
//! c = 276 (1104ms), c + r = 654 (2616ms). The filter is narrowed by ε:
//! `w = 150 / (1 + ε)`, `h = 75 · (1 - ε)`.

use serde::Serialize;
use std::{fmt, str::FromStr};

use crate::config::QUERY_SNIP_SECONDS;
use crate::error::{Error, Result};

/// Raw `(q, r, c, w, h)` values, checked by [`FingerprintProfile::from_params`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ProfileParams {
    pub quads_per_anchor: usize,
    pub window_width: usize,
    pub window_offset: usize,
    pub filter_width: usize,
    pub filter_height: usize,
}

/// Immutable pipeline configuration. Only [`REFERENCE`](Self::REFERENCE) and
/// [`QUERY`](Self::QUERY) exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FingerprintProfile {
    params: ProfileParams,
}

impl FingerprintProfile {
    pub const REFERENCE: Self = Self {
        params: ProfileParams {
            quads_per_anchor: 9,
            window_width: 200,
            window_offset: 345,
            filter_width: 150,
            filter_height: 75,
        },
    };

    pub const QUERY: Self = Self {
        params: ProfileParams {
            quads_per_anchor: 20,
            window_width: 378,
            window_offset: 276,
            filter_width: 125,
            filter_height: 60,
        },
    };

    /// Accepts `params` only if they are exactly one of the named profiles.
    pub fn from_params(params: ProfileParams) -> Result<Self> {
        [Self::REFERENCE, Self::QUERY]
            .into_iter()
            .find(|profile| profile.params == params)
            .ok_or_else(|| {
                Error::InvalidProfile(format!(
                    "(q={}, r={}, c={}, w={}, h={}) is neither Reference nor Query",
                    params.quads_per_anchor,
                    params.window_width,
                    params.window_offset,
                    params.filter_width,
                    params.filter_height
                ))
            })
    }

    /// q: quads kept per anchor.
    pub fn quads_per_anchor(&self) -> usize {
        self.params.quads_per_anchor
    }

    /// r: width of the companion search window.
    pub fn window_width(&self) -> usize {
        self.params.window_width
    }

    /// c: distance from the anchor to the start of the search window.
    pub fn window_offset(&self) -> usize {
        self.params.window_offset
    }

    /// w: time extent of the maximum filter.
    pub fn filter_width(&self) -> usize {
        self.params.filter_width
    }

    /// h: frequency extent of the maximum filter.
    pub fn filter_height(&self) -> usize {
        self.params.filter_height
    }

    pub fn params(&self) -> ProfileParams {
        self.params
    }
}

impl TryFrom<(usize, usize, usize, usize, usize)> for FingerprintProfile {
    type Error = Error;

    fn try_from((q, r, c, w, h): (usize, usize, usize, usize, usize)) -> Result<Self> {
        Self::from_params(ProfileParams {
            quads_per_anchor: q,
            window_width: r,
            window_offset: c,
            filter_width: w,
            filter_height: h,
        })
    }
}

/// Selects the profile and time window of a fingerprint run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintKind {
    /// Full recording under the reference profile.
    Reference,
    /// First [`QUERY_SNIP_SECONDS`] seconds under the query profile.
    Query,
}

impl FingerprintKind {
    pub fn profile(&self) -> FingerprintProfile {
        match self {
            FingerprintKind::Reference => FingerprintProfile::REFERENCE,
            FingerprintKind::Query => FingerprintProfile::QUERY,
        }
    }

    /// Seconds of audio processed from the start, `None` for everything.
    pub fn snip_seconds(&self) -> Option<u32> {
        match self {
            FingerprintKind::Reference => None,
            FingerprintKind::Query => Some(QUERY_SNIP_SECONDS),
        }
    }
}

impl FromStr for FingerprintKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "reference" | "ref" => Ok(FingerprintKind::Reference),
            "query" => Ok(FingerprintKind::Query),
            other => Err(Error::InvalidProfile(format!(
                "unknown fingerprint type '{}', expected 'reference' or 'query'",
                other
            ))),
        }
    }
}

impl fmt::Display for FingerprintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FingerprintKind::Reference => write!(f, "reference"),
            FingerprintKind::Query => write!(f, "query"),
        }
    }
}

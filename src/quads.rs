//! Quad construction and per-anchor selection.
//!
//! Every peak acts as an anchor A. Its companions are the other peaks whose time
//! falls in `[A.time + c, A.time + c + r)`; each 3-subset of them forms a quad.
//! Per anchor only the `q` quads with the largest summed magnitude are kept.

use serde::Serialize;
use std::{cmp::Ordering, collections::BinaryHeap};
use tracing::debug;

use crate::peaks::Peak;
use crate::profile::FingerprintProfile;

/// How many 3-subsets of an anchor's search window are enumerated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum QuadEnumeration {
    /// Every 3-subset of the window.
    #[default]
    Exhaustive,
    /// Every 3-subset of the `n` strongest window peaks.
    Strongest(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    /// Index of the anchor in the peak list the quad was built from.
    pub anchor_index: usize,
    pub anchor: Peak,
    /// Sorted by `(time_bin, freq_bin)`.
    pub companions: [Peak; 3],
}

/// `(Δtime, Δfreq)` of each companion relative to the anchor, in companion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuadGeometry {
    pub offsets: [(i64, i64); 3],
}

impl Quad {
    pub fn new(anchor_index: usize, anchor: Peak, mut companions: [Peak; 3]) -> Self {
        companions.sort_by_key(|p| (p.time_bin, p.freq_bin));
        Self {
            anchor_index,
            anchor,
            companions,
        }
    }

    pub fn geometry(&self) -> QuadGeometry {
        let offset = |p: &Peak| {
            (
                p.time_bin as i64 - self.anchor.time_bin as i64,
                p.freq_bin as i64 - self.anchor.freq_bin as i64,
            )
        };
        QuadGeometry {
            offsets: [
                offset(&self.companions[0]),
                offset(&self.companions[1]),
                offset(&self.companions[2]),
            ],
        }
    }

    /// Sum of the four peak magnitudes.
    pub fn total_magnitude(&self) -> f64 {
        self.anchor.magnitude + self.companions.iter().map(|p| p.magnitude).sum::<f64>()
    }

    fn companion_keys(&self) -> [(usize, usize); 3] {
        self.companions.map(|p| (p.time_bin, p.freq_bin))
    }
}

/// All 3-subsets of `0..n` in lexicographic order.
///
/// Finite with exactly `C(n, 3)` items; clone it to restart.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    indices: [usize; 3],
    remaining: usize,
}

impl Combinations {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            indices: [0, 1, 2],
            remaining: choose3(n),
        }
    }
}

pub fn choose3(n: usize) -> usize {
    if n < 3 {
        0
    } else {
        n * (n - 1) * (n - 2) / 6
    }
}

impl Iterator for Combinations {
    type Item = [usize; 3];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.indices;
        self.remaining -= 1;

        if self.remaining > 0 {
            let mut i = 2;
            while self.indices[i] == self.n - 3 + i {
                i -= 1;
            }
            self.indices[i] += 1;
            for j in i + 1..3 {
                self.indices[j] = self.indices[j - 1] + 1;
            }
        }

        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Combinations {}

/// Finds search windows and enumerates quads over a time-ordered peak list.
#[derive(Debug, Clone, Copy)]
pub struct QuadBuilder<'a> {
    peaks: &'a [Peak],
    window_offset: usize,
    window_width: usize,
    enumeration: QuadEnumeration,
}

impl<'a> QuadBuilder<'a> {
    pub fn new(
        peaks: &'a [Peak],
        window_offset: usize,
        window_width: usize,
        enumeration: QuadEnumeration,
    ) -> Self {
        debug_assert!(peaks.windows(2).all(|w| w[0].time_bin <= w[1].time_bin));
        Self {
            peaks,
            window_offset,
            window_width,
            enumeration,
        }
    }

    pub fn for_profile(
        peaks: &'a [Peak],
        profile: &FingerprintProfile,
        enumeration: QuadEnumeration,
    ) -> Self {
        Self::new(peaks, profile.window_offset(), profile.window_width(), enumeration)
    }

    /// Indices of the peaks in `anchor_index`'s search window, ascending.
    pub fn companions(&self, anchor_index: usize) -> Vec<usize> {
        let anchor_time = self.peaks[anchor_index].time_bin;
        let start = anchor_time + self.window_offset;
        let end = start + self.window_width;

        let lo = self.peaks.partition_point(|p| p.time_bin < start);
        let hi = self.peaks.partition_point(|p| p.time_bin < end);

        let mut window: Vec<usize> = (lo..hi).filter(|&j| j != anchor_index).collect();

        if let QuadEnumeration::Strongest(limit) = self.enumeration {
            if window.len() > limit {
                window.sort_by(|&a, &b| {
                    self.peaks[b]
                        .magnitude
                        .total_cmp(&self.peaks[a].magnitude)
                        .then(a.cmp(&b))
                });
                window.truncate(limit);
                window.sort_unstable();
            }
        }

        window
    }

    /// Quads anchored at `anchor_index`, at most `C(k, 3)` for `k` companions.
    pub fn quads_for_anchor(&self, anchor_index: usize) -> AnchorQuads<'a> {
        let candidates = self.companions(anchor_index);
        AnchorQuads {
            peaks: self.peaks,
            anchor_index,
            combinations: Combinations::new(candidates.len()),
            candidates,
        }
    }
}

/// Iterator over one anchor's quads.
#[derive(Debug, Clone)]
pub struct AnchorQuads<'a> {
    peaks: &'a [Peak],
    anchor_index: usize,
    candidates: Vec<usize>,
    combinations: Combinations,
}

impl Iterator for AnchorQuads<'_> {
    type Item = Quad;

    fn next(&mut self) -> Option<Quad> {
        let anchor = self.peaks[self.anchor_index];
        for [a, b, c] in self.combinations.by_ref() {
            let quad = Quad::new(
                self.anchor_index,
                anchor,
                [
                    self.peaks[self.candidates[a]],
                    self.peaks[self.candidates[b]],
                    self.peaks[self.candidates[c]],
                ],
            );
            // Without a time extent the geometry cannot be normalized.
            if quad.companions[2].time_bin > anchor.time_bin {
                return Some(quad);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.combinations.len()))
    }
}

/// Ordering where `Less` means ranked higher: larger summed magnitude, then
/// earlier anchor, then earlier and lower companions.
pub fn rank_order(a: &Quad, b: &Quad) -> Ordering {
    b.total_magnitude()
        .total_cmp(&a.total_magnitude())
        .then_with(|| {
            (a.anchor.time_bin, a.anchor.freq_bin).cmp(&(b.anchor.time_bin, b.anchor.freq_bin))
        })
        .then_with(|| a.companion_keys().cmp(&b.companion_keys()))
}

/// Heap entry whose greatest element is the worst-ranked quad.
struct Ranked(Quad);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        rank_order(&self.0, &other.0)
    }
}

/// Keeps the top-`q` quads of an anchor.
#[derive(Debug, Clone, Copy)]
pub struct QuadSelector {
    quads_per_anchor: usize,
}

impl QuadSelector {
    pub fn new(quads_per_anchor: usize) -> Self {
        Self { quads_per_anchor }
    }

    /// Best-first, never more than `q` quads. Holds at most `q + 1` in memory.
    pub fn select(&self, quads: impl IntoIterator<Item = Quad>) -> Vec<Quad> {
        if self.quads_per_anchor == 0 {
            return Vec::new();
        }

        let mut heap: BinaryHeap<Ranked> = BinaryHeap::with_capacity(self.quads_per_anchor + 1);
        for quad in quads {
            heap.push(Ranked(quad));
            if heap.len() > self.quads_per_anchor {
                heap.pop();
            }
        }

        heap.into_sorted_vec().into_iter().map(|r| r.0).collect()
    }
}

/// Builds and ranks quads for every anchor in `peaks`, in anchor order.
pub fn strongest_quads(
    peaks: &[Peak],
    profile: &FingerprintProfile,
    enumeration: QuadEnumeration,
) -> Vec<Quad> {
    let builder = QuadBuilder::for_profile(peaks, profile, enumeration);
    let selector = QuadSelector::new(profile.quads_per_anchor());

    let mut selected = Vec::new();
    let mut enumerated = 0usize;
    for anchor_index in 0..peaks.len() {
        let quads = builder.quads_for_anchor(anchor_index);
        enumerated += quads.size_hint().1.unwrap_or(0);
        selected.extend(selector.select(quads));
    }

    debug!(
        "Kept {} of {} candidate quads over {} anchors",
        selected.len(),
        enumerated,
        peaks.len()
    );

    selected
}

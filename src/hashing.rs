use serde::Serialize;
use std::fmt;

use crate::config::{FREQ_DELTA_BITS, FREQ_DELTA_OFFSET, RATIO_BITS};
use crate::quads::{Quad, QuadGeometry};

/// Fixed-width token for one quad's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct QuadHash(pub u64);

impl fmt::Display for QuadHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:011X}", self.0)
    }
}

pub fn hash_quad(quad: &Quad) -> QuadHash {
    encode_geometry(&quad.geometry())
}

/// Packs a canonical quad geometry into a [`QuadHash`].
///
/// The time offsets of the first two companions are divided by the outermost
/// companion's time offset, so a uniformly stretched or compressed quad keeps its
/// token. Frequency offsets are kept as-is.
pub fn encode_geometry(geometry: &QuadGeometry) -> QuadHash {
    // --- Bit Packing Configuration ---
    // 2 time ratios + 3 frequency deltas into 64 bits.
    // - Ratios in [0, 1], 7 bits (0..=127).
    // - Frequency deltas in (-512, 512), offset by 512, 10 bits.
    // Total bits = 2 * 7 + 3 * 10 = 44
    let [(dt_c, _), (dt_d, _), (dt_b, _)] = geometry.offsets;

    let mut hash: u64 = 0;
    let mut current_shift = 0;

    for dt in [dt_c, dt_d] {
        hash |= quantize_ratio(dt, dt_b) << current_shift;
        current_shift += RATIO_BITS;
    }

    for (_, df) in geometry.offsets {
        hash |= pack_freq_delta(df) << current_shift;
        current_shift += FREQ_DELTA_BITS;
    }

    QuadHash(hash)
}

fn quantize_ratio(dt: i64, span: i64) -> u64 {
    if span <= 0 {
        return 0;
    }
    let levels = ((1u64 << RATIO_BITS) - 1) as f64;
    let ratio = (dt as f64 / span as f64).clamp(0.0, 1.0);
    (ratio * levels).round() as u64
}

fn pack_freq_delta(df: i64) -> u64 {
    let max = (1i64 << FREQ_DELTA_BITS) - 1;
    (df + FREQ_DELTA_OFFSET).clamp(0, max) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peaks::Peak;

    fn field(hash: QuadHash, shift: u32, bits: u32) -> u64 {
        (hash.0 >> shift) & ((1 << bits) - 1)
    }

    #[test]
    fn test_bit_layout() {
        let hash = encode_geometry(&QuadGeometry {
            offsets: [(10, 20), (20, -30), (40, 5)],
        });
        assert_eq!(field(hash, 0, 7), 32); // 0.25 * 127 = 31.75
        assert_eq!(field(hash, 7, 7), 64); // 0.5 * 127 = 63.5
        assert_eq!(field(hash, 14, 10), 532);
        assert_eq!(field(hash, 24, 10), 482);
        assert_eq!(field(hash, 34, 10), 517);
        assert_eq!(hash.0 >> 44, 0);
    }

    #[test]
    fn test_uniform_time_stretch_keeps_token() {
        let base = QuadGeometry {
            offsets: [(460, -12), (500, 30), (540, 7)],
        };
        let slower = QuadGeometry {
            offsets: [(552, -12), (600, 30), (648, 7)],
        };
        let faster = QuadGeometry {
            offsets: [(368, -12), (400, 30), (432, 7)],
        };
        assert_eq!(encode_geometry(&base), encode_geometry(&slower));
        assert_eq!(encode_geometry(&base), encode_geometry(&faster));
    }

    #[test]
    fn test_distinct_frequency_shapes_differ() {
        let a = QuadGeometry {
            offsets: [(10, 1), (20, 2), (30, 3)],
        };
        let b = QuadGeometry {
            offsets: [(10, 1), (20, 2), (30, 4)],
        };
        assert_ne!(encode_geometry(&a), encode_geometry(&b));
    }

    #[test]
    fn test_hash_quad_ignores_discovery_order() {
        let p = |t, f| Peak {
            time_bin: t,
            freq_bin: f,
            magnitude: 1.0,
        };
        let anchor = p(100, 200);
        let q1 = Quad::new(0, anchor, [p(450, 210), p(500, 150), p(520, 260)]);
        let q2 = Quad::new(0, anchor, [p(520, 260), p(450, 210), p(500, 150)]);
        assert_eq!(hash_quad(&q1), hash_quad(&q2));
    }

    #[test]
    fn test_display_is_fixed_width_hex() {
        assert_eq!(QuadHash(0xABC).to_string(), "00000000ABC");
        assert_eq!(QuadHash((1 << 44) - 1).to_string(), "FFFFFFFFFFF");
    }
}

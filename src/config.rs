// Audio Processing Parameters
pub const TARGET_SAMPLE_RATE: u32 = 8000;
pub const WINDOW_SIZE: usize = 1024;
/// 32 samples at 8 kHz, one STFT frame every 4ms.
pub const HOP_SIZE: usize = 32;
pub const NUM_FREQ_BINS: usize = WINDOW_SIZE / 2;

// Query Parameters
pub const QUERY_SNIP_SECONDS: u32 = 10;
/// Time-scale variation the query profile absorbs.
pub const EPSILON: f64 = 0.2;

// Peak Finding Parameters
pub const MIN_PEAK_MAGNITUDE: f64 = 1e-6;
pub const DEFAULT_MAX_PEAKS: usize = 250_000;

// Hashing Parameters
pub const RATIO_BITS: u32 = 7;
pub const FREQ_DELTA_BITS: u32 = 10;
pub const FREQ_DELTA_OFFSET: i64 = NUM_FREQ_BINS as i64;

// Tempo Parameters
pub const TEMPO_WINDOW_SIZE: usize = 512;
pub const TEMPO_HOP_SIZE: usize = 80;
pub const MIN_BPM: f64 = 40.0;
pub const MAX_BPM: f64 = 240.0;

// Digest Parameters
pub const DIGEST_BLOCK_SIZE: usize = 4096;

use image::{Rgb, RgbImage};
use std::path::Path;
use tracing::info;

use crate::audio::Spectrogram;
use crate::error::Result;
use crate::peaks::Peak;
use crate::quads::Quad;

const PEAK_COLOR: Rgb<u8> = Rgb([0, 255, 255]);
const ANCHOR_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const COMPANION_COLOR: Rgb<u8> = Rgb([255, 165, 0]);

/// Renders the spectrogram on a log scale with the landmarks drawn on top.
///
/// Time runs left to right, frequency bottom to top. Peaks are cyan, peaks used
/// as quad companions orange and anchors of kept quads red.
pub fn render_landmarks(
    spectrogram: &Spectrogram,
    peaks: &[Peak],
    quads: &[Quad],
    output_path: impl AsRef<Path>,
) -> Result<()> {
    let output_path = output_path.as_ref();
    let imgbuf = draw_landmarks(spectrogram, peaks, quads);
    imgbuf.save(output_path)?;
    info!("Spectrogram with landmarks saved to {}", output_path.display());
    Ok(())
}

fn draw_landmarks(spectrogram: &Spectrogram, peaks: &[Peak], quads: &[Quad]) -> RgbImage {
    let width = spectrogram.num_frames().max(1);
    let height = spectrogram.num_bins().max(1);
    let mut imgbuf = RgbImage::new(width as u32, height as u32);

    if spectrogram.is_empty() {
        return imgbuf;
    }

    // --- Find min/max log magnitude for scaling ---
    let mut min_log_mag = f64::MAX;
    let mut max_log_mag = f64::MIN;
    for time_slice in spectrogram.frames() {
        for &magnitude in time_slice {
            if magnitude < 1e-10 {
                continue;
            }
            let log_mag = (magnitude + 1e-6).log10();
            min_log_mag = min_log_mag.min(log_mag);
            max_log_mag = max_log_mag.max(log_mag);
        }
    }
    let log_mag_range = max_log_mag - min_log_mag;
    let log_mag_range = if log_mag_range < 1e-6 { 1.0 } else { log_mag_range };

    // --- Grayscale background ---
    for (t, time_slice) in spectrogram.frames().iter().enumerate() {
        for (f, &magnitude) in time_slice.iter().enumerate() {
            let log_mag = (magnitude + 1e-6).log10();
            let scaled_val = (log_mag - min_log_mag) / log_mag_range;
            let intensity = (scaled_val.clamp(0.0, 1.0) * 255.0).round() as u8;
            imgbuf.put_pixel(t as u32, (height - 1 - f) as u32, Rgb([intensity; 3]));
        }
    }

    // --- Landmarks, anchors last so they stay visible ---
    for peak in peaks {
        mark(&mut imgbuf, peak, PEAK_COLOR);
    }
    for quad in quads {
        for companion in &quad.companions {
            mark(&mut imgbuf, companion, COMPANION_COLOR);
        }
    }
    for quad in quads {
        mark(&mut imgbuf, &quad.anchor, ANCHOR_COLOR);
    }

    imgbuf
}

/// 3x3 marker, clipped to the image.
fn mark(imgbuf: &mut RgbImage, peak: &Peak, color: Rgb<u8>) {
    let (width, height) = imgbuf.dimensions();
    let x = peak.time_bin as i64;
    let y = height as i64 - 1 - peak.freq_bin as i64;
    for dx in -1..=1 {
        for dy in -1..=1 {
            let (px, py) = (x + dx, y + dy);
            if px >= 0 && py >= 0 && px < width as i64 && py < height as i64 {
                imgbuf.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

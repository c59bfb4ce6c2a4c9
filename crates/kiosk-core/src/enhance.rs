//! Grayscale contrast enhancement and binarization ahead of OCR.

use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;

/// Contrast-Limited Adaptive Histogram Equalization, in place.
///
/// `tiles` × `tiles` grid; `clip_limit` is relative to a uniform histogram, so
/// each bin is capped at `clip_limit * tile_pixels / 256`. Per-tile CDFs are
/// blended bilinearly between tile centers. Images smaller than the grid are
/// left untouched.
pub fn clahe(gray: &mut GrayImage, tiles: u32, clip_limit: f32) {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let t = tiles.max(1) as usize;
    let tile_w = w / t;
    let tile_h = h / t;
    if tile_w == 0 || tile_h == 0 {
        return;
    }
    let tile_pixels = tile_w * tile_h;
    let clip = ((clip_limit * tile_pixels as f32 / 256.0) as u32).max(1);

    let mut cdfs: Vec<[f32; 256]> = Vec::with_capacity(t * t);
    for row in 0..t {
        for col in 0..t {
            let mut hist = [0u32; 256];
            for y in row * tile_h..(row + 1) * tile_h {
                for x in col * tile_w..(col + 1) * tile_w {
                    hist[gray.get_pixel(x as u32, y as u32).0[0] as usize] += 1;
                }
            }

            let mut excess = 0u32;
            for bin in hist.iter_mut() {
                if *bin > clip {
                    excess += *bin - clip;
                    *bin = clip;
                }
            }
            let redist = excess / 256;
            let leftover = (excess % 256) as usize;
            for (i, bin) in hist.iter_mut().enumerate() {
                *bin += redist + u32::from(i < leftover);
            }

            let mut cdf = [0f32; 256];
            let mut acc = 0f32;
            for (slot, &count) in cdf.iter_mut().zip(hist.iter()) {
                acc += count as f32;
                *slot = acc;
            }
            let cdf_min = cdf.iter().copied().find(|&v| v > 0.0).unwrap_or(0.0);
            let denom = tile_pixels as f32 - cdf_min;
            if denom > 0.0 {
                for v in cdf.iter_mut() {
                    *v = ((*v - cdf_min) / denom * 255.0).clamp(0.0, 255.0);
                }
            }
            cdfs.push(cdf);
        }
    }

    for y in 0..h {
        let fy = (y as f32 / tile_h as f32 - 0.5).clamp(0.0, (t - 1) as f32);
        let r0 = fy as usize;
        let r1 = (r0 + 1).min(t - 1);
        let dy = fy - r0 as f32;

        for x in 0..w {
            let fx = (x as f32 / tile_w as f32 - 0.5).clamp(0.0, (t - 1) as f32);
            let c0 = fx as usize;
            let c1 = (c0 + 1).min(t - 1);
            let dx = fx - c0 as f32;

            let pixel = gray.get_pixel(x as u32, y as u32).0[0] as usize;
            let top = cdfs[r0 * t + c0][pixel] * (1.0 - dx) + cdfs[r0 * t + c1][pixel] * dx;
            let bot = cdfs[r1 * t + c0][pixel] * (1.0 - dx) + cdfs[r1 * t + c1][pixel] * dx;
            let val = top * (1.0 - dy) + bot * dy;

            gray.put_pixel(x as u32, y as u32, Luma([val.round().clamp(0.0, 255.0) as u8]));
        }
    }
}

/// Binary threshold at the Otsu level: pixels above it become 255, others 0.
pub fn binarize_otsu(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    threshold(gray, level)
}

/// Binary threshold: pixels strictly above `level` become 255, others 0.
pub fn threshold(gray: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] > level { Luma([255]) } else { Luma([0]) }
    })
}

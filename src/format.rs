//! Pixel-format assembly and the LCD subpixel filter (spec §4.5/§6,
//! component C5).
//!
//! The 5-tap FIR and the R/G/B subpixel-offset convolution follow
//! FreeType's `ft_lcd_filter_fir` in spirit, but weights are normalized by
//! their runtime sum rather than assumed to total 256 — a hardcoded custom
//! filter whose taps don't sum to 256 would otherwise silently darken or
//! brighten the whole glyph.

use crate::bitmap::{Bitmap, PixelMode};

/// FreeType's "default" LCD filter taps (unnormalized, sum 256).
pub const DEFAULT_LCD_WEIGHTS: [u32; 5] = [8, 77, 86, 77, 8];

/// A softer filter that spreads less energy onto neighboring pixels.
pub const LIGHT_LCD_WEIGHTS: [u32; 5] = [0, 85, 86, 85, 0];

/// FreeType's pre-2014 filter, kept for callers matching older renders.
pub const LEGACY_LCD_WEIGHTS: [u32; 5] = [0, 64, 128, 64, 0];

/// Packs a Gray8 coverage buffer directly into a [`Bitmap`] (spec §4.5: Gray
/// is coverage with no further transform).
pub fn pack_gray(cov: &[u8], width: u32, rows: u32) -> Bitmap {
    let mut bmp = Bitmap::new(width, rows, PixelMode::Gray);
    for y in 0..rows {
        let row_start = y as usize * width as usize;
        bmp.row_mut(y).copy_from_slice(&cov[row_start..row_start + width as usize]);
    }
    bmp
}

/// Packs a Gray8 coverage buffer into 1bpp Mono by thresholding at the
/// half-coverage point (spec §4.5).
pub fn pack_mono(cov: &[u8], width: u32, rows: u32) -> Bitmap {
    let mut bmp = Bitmap::new(width, rows, PixelMode::Mono);
    for y in 0..rows {
        let row_start = y as usize * width as usize;
        for x in 0..width {
            let v = cov[row_start + x as usize];
            bmp.set_mono_bit(x, y, v >= 128);
        }
    }
    bmp
}

/// Packs a Gray8 coverage buffer into RGBA, using `color`'s RGB channels
/// and the coverage as alpha (spec §4.5: "coverage composited as alpha over
/// a flat color").
pub fn pack_rgba(cov: &[u8], width: u32, rows: u32, color: [u8; 4]) -> Bitmap {
    let mut bmp = Bitmap::new(width, rows, PixelMode::Rgba);
    for y in 0..rows {
        let row_start = y as usize * width as usize;
        for x in 0..width {
            let alpha = cov[row_start + x as usize];
            let a = (alpha as u32 * color[3] as u32 / 255) as u8;
            bmp.set_rgba(x, y, [color[0], color[1], color[2], a]);
        }
    }
    bmp
}

/// Applies the 5-tap FIR filter, with edge-clamped reads and weights
/// normalized by their runtime sum, to one 1-D run of subpixel coverage
/// samples.
fn lcd_filter_run(samples: &[u8], weights: &[u32; 5]) -> Vec<u8> {
    let sum: u32 = weights.iter().sum();
    let len = samples.len();
    let mut out = vec![0u8; len];
    for i in 0..len {
        let mut acc: u32 = 0;
        for (k, &w) in weights.iter().enumerate() {
            let offset = k as isize - 2;
            let idx = (i as isize + offset).clamp(0, len as isize - 1) as usize;
            acc += samples[idx] as u32 * w;
        }
        out[i] = (acc / sum).min(255) as u8;
    }
    out
}

/// Assembles an LCD-H bitmap from a coverage buffer rasterized at 3x
/// horizontal resolution (spec §4.5). `bgr` swaps the R and B channels for
/// displays wired BGR instead of RGB.
pub fn pack_lcd_h(cov_3x: &[u8], width: u32, rows: u32, weights: &[u32; 5], bgr: bool) -> Bitmap {
    let mut bmp = Bitmap::new(width, rows, PixelMode::LcdH);
    let wide = width as usize * 3;
    for y in 0..rows {
        let row_start = y as usize * wide;
        let filtered = lcd_filter_run(&cov_3x[row_start..row_start + wide], weights);
        for x in 0..width as usize {
            let (r, g, b) = (filtered[x * 3], filtered[x * 3 + 1], filtered[x * 3 + 2]);
            let rgb = if bgr { [b, g, r] } else { [r, g, b] };
            bmp.set_lcd(x as u32, y, rgb);
        }
    }
    bmp
}

/// Assembles an LCD-V bitmap from a coverage buffer rasterized at 3x
/// vertical resolution (spec §4.5). Filtering runs down each column
/// instead of along each row.
pub fn pack_lcd_v(cov_3x: &[u8], width: u32, rows: u32, weights: &[u32; 5], bgr: bool) -> Bitmap {
    let mut bmp = Bitmap::new(width, rows, PixelMode::LcdV);
    let tall = rows as usize * 3;
    let mut column = vec![0u8; tall];
    for x in 0..width as usize {
        for (sub_y, slot) in column.iter_mut().enumerate() {
            *slot = cov_3x[sub_y * width as usize + x];
        }
        let filtered = lcd_filter_run(&column, weights);
        for y in 0..rows as usize {
            let (r, g, b) = (filtered[y * 3], filtered[y * 3 + 1], filtered[y * 3 + 2]);
            let rgb = if bgr { [b, g, r] } else { [r, g, b] };
            bmp.set_lcd(x as u32, y as u32, rgb);
        }
    }
    bmp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_pack_copies_coverage_verbatim() {
        let cov = vec![0u8, 128, 255, 64];
        let bmp = pack_gray(&cov, 2, 2);
        assert_eq!(bmp.get_gray(0, 0), 0);
        assert_eq!(bmp.get_gray(1, 0), 128);
        assert_eq!(bmp.get_gray(0, 1), 255);
        assert_eq!(bmp.get_gray(1, 1), 64);
    }

    #[test]
    fn mono_pack_thresholds_at_half_coverage() {
        let cov = vec![0u8, 127, 128, 255];
        let bmp = pack_mono(&cov, 4, 1);
        assert!(!bmp.get_mono_bit(0, 0));
        assert!(!bmp.get_mono_bit(1, 0));
        assert!(bmp.get_mono_bit(2, 0));
        assert!(bmp.get_mono_bit(3, 0));
    }

    #[test]
    fn rgba_pack_uses_coverage_as_alpha() {
        let cov = vec![0u8, 255];
        let bmp = pack_rgba(&cov, 2, 1, [10, 20, 30, 255]);
        assert_eq!(bmp.get_rgba(0, 0), [10, 20, 30, 0]);
        assert_eq!(bmp.get_rgba(1, 0), [10, 20, 30, 255]);
    }

    #[test]
    fn lcd_filter_is_a_no_op_on_uniform_input() {
        let samples = vec![200u8; 10];
        let out = lcd_filter_run(&samples, &DEFAULT_LCD_WEIGHTS);
        assert!(out.iter().all(|&v| v == 200));
    }

    #[test]
    fn lcd_filter_weights_normalize_regardless_of_sum() {
        // A filter whose taps sum to 100 (not 256) must still be a no-op on
        // uniform input once normalized.
        let weights = [10u32, 20, 40, 20, 10];
        let samples = vec![77u8; 6];
        let out = lcd_filter_run(&samples, &weights);
        assert!(out.iter().all(|&v| v == 77));
    }

    #[test]
    fn pack_lcd_h_splits_triplets_into_rgb() {
        let cov = vec![0u8, 255, 0, 0, 255, 0]; // one pixel's worth, G at full coverage
        let bmp = pack_lcd_h(&cov, 2, 1, &DEFAULT_LCD_WEIGHTS, false);
        // After filtering, the green channel should dominate both pixels'
        // triplet since the lone bright subpixel sits at their G slot.
        let row = bmp.row(0);
        assert!(row[1] > row[0] && row[1] > row[2]);
    }
}

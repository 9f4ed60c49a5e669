//! Shelf-packed glyph texture atlas (spec §4.8, component C8).
//!
//! Grounded in the teacher's `canvas/text_rasterizer.rs` `merge_all_atlases`:
//! that function sorts glyph atlases by key, walks them in order packing
//! left-to-right, and stops adding entries once the combined width would
//! exceed `MAX_GPU_TEXTURE_SIZE` rather than failing outright ("skip what
//! doesn't fit, don't fail"). This module keeps that walk-and-skip posture
//! but replaces the teacher's 1-D horizontal-only layout with the full 2-D
//! shelf packer the spec calls for (sort by height descending, open shelves
//! track remaining width, grow the atlas by doubling when no shelf fits).
//! The `MAX_GPU_TEXTURE_SIZE` constant itself carries over unchanged from
//! `canvas/gpu/utils.rs` as this crate's default maximum atlas dimension.

use std::collections::HashMap;

use crate::bitmap::{Bitmap, PixelMode};

/// Upper bound on atlas width/height, matching the teacher's GPU texture
/// size ceiling (`canvas/gpu/utils.rs::MAX_GPU_TEXTURE_SIZE`).
pub const MAX_GPU_TEXTURE_SIZE: u32 = 8192;

/// Default padding, in pixels, kept around every packed glyph so adjacent
/// glyphs' anti-aliased edges never bleed into a neighbour during bilinear
/// sampling (spec §4.8).
pub const DEFAULT_PADDING: u32 = 1;

/// Glyph identifier, opaque to this crate (spec §3 `map<GlyphId,
/// GlyphMetrics>`). Left as a bare `u32` since glyph-id allocation (cmap
/// lookup, glyph substitution) is an external collaborator's concern.
pub type GlyphId = u32;

/// Placement and font metrics of one glyph packed into an [`Atlas`]
/// (spec §3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    pub glyph_id: GlyphId,
    pub atlas_x: u32,
    pub atlas_y: u32,
    pub width: u32,
    pub height: u32,
    pub bearing_x: f64,
    pub bearing_y: f64,
    pub advance: f64,
}

impl GlyphMetrics {
    /// Normalized `[u0, v0, u1, v1]` texture coordinates of this glyph
    /// within an atlas of `atlas_width x atlas_height` (spec §4.8
    /// "getGlyphUV").
    pub fn uv(&self, atlas_width: u32, atlas_height: u32) -> [f64; 4] {
        let aw = atlas_width as f64;
        let ah = atlas_height as f64;
        [
            self.atlas_x as f64 / aw,
            self.atlas_y as f64 / ah,
            (self.atlas_x + self.width) as f64 / aw,
            (self.atlas_y + self.height) as f64 / ah,
        ]
    }
}

/// A single open shelf: a horizontal strip of fixed `height`, with
/// `cursor_x` tracking how much of its width is already claimed.
struct Shelf {
    y: u32,
    height: u32,
    cursor_x: u32,
}

/// A shelf-packed RGBA glyph atlas (spec §3 `GlyphAtlas = {bitmap, glyphs,
/// fontSize}`, §4.8).
pub struct Atlas {
    bitmap: Bitmap,
    shelves: Vec<Shelf>,
    glyphs: HashMap<GlyphId, GlyphMetrics>,
    padding: u32,
    max_size: u32,
    font_size: f64,
}

impl Atlas {
    /// Starts an atlas at `initial_size x initial_size` (rounded up to the
    /// next power of two), growing up to `max_size` as glyphs are packed.
    pub fn new(initial_size: u32, max_size: u32) -> Self {
        let size = next_power_of_two(initial_size.max(1));
        Atlas {
            bitmap: Bitmap::new(size, size, PixelMode::Rgba),
            shelves: Vec::new(),
            glyphs: HashMap::new(),
            padding: DEFAULT_PADDING,
            max_size: max_size.min(MAX_GPU_TEXTURE_SIZE),
            font_size: 0.0,
        }
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    /// Sets the `fontSize` this atlas was rasterized at (spec §3/§6).
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width
    }

    pub fn height(&self) -> u32 {
        self.bitmap.rows
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    pub fn glyphs(&self) -> &HashMap<GlyphId, GlyphMetrics> {
        &self.glyphs
    }

    /// Finds (or opens) a shelf with room for `w + 2*padding`, growing the
    /// atlas (doubling, up to `max_size`) if none exists. Returns `None`
    /// when even a fresh, max-size atlas has no room — the caller skips
    /// this glyph rather than failing the whole pack (spec §4.8, teacher's
    /// `merge_all_atlases` posture).
    fn place(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        let padded_w = w + 2 * self.padding;
        let padded_h = h + 2 * self.padding;

        loop {
            if let Some(shelf) = self
                .shelves
                .iter_mut()
                .find(|s| s.height >= padded_h && self.bitmap.width - s.cursor_x >= padded_w)
            {
                let x = shelf.cursor_x + self.padding;
                let y = shelf.y + self.padding;
                shelf.cursor_x += padded_w;
                return Some((x, y));
            }

            let next_shelf_y = self.shelves.iter().map(|s| s.y + s.height).max().unwrap_or(0);
            if next_shelf_y + padded_h <= self.bitmap.rows && padded_w <= self.bitmap.width {
                self.shelves.push(Shelf { y: next_shelf_y, height: padded_h, cursor_x: 0 });
                continue;
            }

            if self.bitmap.width >= self.max_size && self.bitmap.rows >= self.max_size {
                return None;
            }
            self.grow();
        }
    }

    fn grow(&mut self) {
        let new_w = (self.bitmap.width * 2).min(self.max_size);
        let new_h = (self.bitmap.rows * 2).min(self.max_size);
        if new_w == self.bitmap.width && new_h == self.bitmap.rows {
            return;
        }
        let mut new_bitmap = Bitmap::new(new_w, new_h, PixelMode::Rgba);
        for y in 0..self.bitmap.rows {
            for x in 0..self.bitmap.width {
                new_bitmap.set_rgba(x, y, self.bitmap.get_rgba(x, y));
            }
        }
        self.bitmap = new_bitmap;
    }

    /// Packs `glyph_bitmap` (an RGBA glyph image, typically from
    /// [`crate::msdf::generate_msdf`] or a coverage-to-RGBA promotion of a
    /// gray raster) into the atlas, recording its [`GlyphMetrics`]. Returns
    /// `false` and packs nothing if the glyph can't fit even after growing
    /// to `max_size` (spec §4.8 "skip what doesn't fit").
    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        &mut self,
        glyph_id: GlyphId,
        glyph_bitmap: &Bitmap,
        bearing_x: f64,
        bearing_y: f64,
        advance: f64,
    ) -> bool {
        let (w, h) = (glyph_bitmap.width, glyph_bitmap.rows);
        let Some((x, y)) = self.place(w, h) else {
            return false;
        };
        for row in 0..h {
            for col in 0..w {
                let px = glyph_bitmap.get_rgba(col, row);
                self.bitmap.set_rgba(x + col, y + row, px);
            }
        }
        self.glyphs.insert(
            glyph_id,
            GlyphMetrics {
                glyph_id,
                atlas_x: x,
                atlas_y: y,
                width: w,
                height: h,
                bearing_x,
                bearing_y,
                advance,
            },
        );
        true
    }
}

fn next_power_of_two(n: u32) -> u32 {
    if n <= 1 {
        return 1;
    }
    1u32 << (32 - (n - 1).leading_zeros())
}

/// Builds an [`Atlas`] from a batch of glyph bitmaps, largest-height-first
/// (spec §4.8 "sort by height descending" — taller glyphs anchor a shelf's
/// height so later, shorter glyphs pack into the same shelf without
/// wasting vertical space).
pub struct AtlasBuilder {
    initial_size: u32,
    max_size: u32,
    padding: u32,
    font_size: f64,
}

impl Default for AtlasBuilder {
    fn default() -> Self {
        AtlasBuilder { initial_size: 256, max_size: MAX_GPU_TEXTURE_SIZE, padding: DEFAULT_PADDING, font_size: 0.0 }
    }
}

impl AtlasBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_size(mut self, size: u32) -> Self {
        self.initial_size = size;
        self
    }

    pub fn max_size(mut self, size: u32) -> Self {
        self.max_size = size.min(MAX_GPU_TEXTURE_SIZE);
        self
    }

    pub fn padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    /// Sets the `fontSize` recorded on the built [`Atlas`] (spec §3/§6).
    pub fn font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    /// Packs every entry in `glyphs` (id, bitmap, bearing_x, bearing_y,
    /// advance), largest height first, skipping (and reporting via the
    /// returned `Vec<GlyphId>` of dropped glyph ids) any that don't fit.
    pub fn build(self, mut glyphs: Vec<(GlyphId, Bitmap, f64, f64, f64)>) -> (Atlas, Vec<GlyphId>) {
        glyphs.sort_by(|a, b| b.1.rows.cmp(&a.1.rows));
        let mut atlas =
            Atlas::new(self.initial_size, self.max_size).with_padding(self.padding).with_font_size(self.font_size);
        let mut dropped = Vec::new();
        for (id, bitmap, bearing_x, bearing_y, advance) in glyphs {
            if !atlas.insert(id, &bitmap, bearing_x, bearing_y, advance) {
                log::warn!("atlas: glyph {id} skipped, no room at max size {}", atlas.max_size);
                dropped.push(id);
            }
        }
        (atlas, dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_glyph(w: u32, h: u32) -> Bitmap {
        let mut b = Bitmap::new(w, h, PixelMode::Rgba);
        for y in 0..h {
            for x in 0..w {
                b.set_rgba(x, y, [255, 255, 255, 255]);
            }
        }
        b
    }

    #[test]
    fn next_power_of_two_rounds_up() {
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(5), 8);
        assert_eq!(next_power_of_two(256), 256);
        assert_eq!(next_power_of_two(257), 512);
    }

    #[test]
    fn single_glyph_packs_at_origin_with_padding() {
        let mut atlas = Atlas::new(64, 256);
        let glyph = solid_glyph(10, 12);
        assert!(atlas.insert(1, &glyph, 0.0, 10.0, 12.0));
        let m = atlas.glyphs()[&1];
        assert_eq!(m.atlas_x, DEFAULT_PADDING);
        assert_eq!(m.atlas_y, DEFAULT_PADDING);
        assert_eq!(m.width, 10);
        assert_eq!(m.height, 12);
    }

    #[test]
    fn second_shorter_glyph_shares_the_first_shelf() {
        let mut atlas = Atlas::new(64, 256);
        atlas.insert(1, &solid_glyph(20, 20), 0.0, 0.0, 0.0);
        atlas.insert(2, &solid_glyph(8, 8), 0.0, 0.0, 0.0);
        let second = atlas.glyphs()[&2];
        assert_eq!(second.atlas_y, DEFAULT_PADDING); // same shelf, y unchanged
        assert!(second.atlas_x > atlas.glyphs()[&1].atlas_x);
    }

    #[test]
    fn atlas_grows_when_initial_size_is_too_small() {
        let mut atlas = Atlas::new(8, 256);
        assert!(atlas.insert(1, &solid_glyph(40, 40), 0.0, 0.0, 0.0));
        assert!(atlas.width() >= 40 + 2 * DEFAULT_PADDING as u32);
    }

    #[test]
    fn oversized_glyph_is_skipped_not_failed() {
        let mut atlas = Atlas::new(8, 16);
        assert!(!atlas.insert(1, &solid_glyph(100, 100), 0.0, 0.0, 0.0));
        assert!(atlas.glyphs().is_empty());
    }

    #[test]
    fn builder_sorts_tallest_first_and_reports_dropped_glyphs() {
        let glyphs = vec![
            (1u32, solid_glyph(10, 5), 0.0, 0.0, 5.0),
            (2u32, solid_glyph(10, 40), 0.0, 0.0, 10.0),
            (3u32, solid_glyph(9000, 9000), 0.0, 0.0, 1.0),
        ];
        let (atlas, dropped) = AtlasBuilder::new().initial_size(64).max_size(256).build(glyphs);
        assert_eq!(dropped, vec![3]);
        // Glyph 2 (height 40) is packed before glyph 1 (height 5), so its
        // shelf is tall enough for glyph 1 to share: both land on the same
        // shelf row. Sorting shortest-first would instead force glyph 2
        // into a second shelf once glyph 1's undersized one is taken.
        assert_eq!(atlas.glyphs()[&1].atlas_y, atlas.glyphs()[&2].atlas_y);
    }

    #[test]
    fn uv_normalizes_to_unit_square() {
        let m = GlyphMetrics {
            glyph_id: 0,
            atlas_x: 10,
            atlas_y: 20,
            width: 5,
            height: 8,
            bearing_x: 0.0,
            bearing_y: 0.0,
            advance: 0.0,
        };
        let uv = m.uv(100, 100);
        assert_eq!(uv, [0.10, 0.20, 0.15, 0.28]);
    }
}

//! FreeType-style analytic scanline rasterizer (spec §4.4, component C4).
//!
//! The area/cover accumulation in [`render_line`]/[`render_hline`] is a
//! direct port of the classic cell-based scanline algorithm described in
//! the Anti-Grain Geometry `rasterizer_cells_aa::render_line` — the same
//! family of algorithm the pack's `larsbrubaker-agg-rust` reference file
//! documents (`examples/other_examples/..._agg-rust__src-font_engine...`).
//! Everything above the line algorithm (path decomposition, banding,
//! pool-overflow retry, fill-rule sweep) follows spec §4.3/§4.4 directly.

use crate::bitmap::{Bitmap, PixelMode};
use crate::cell::{Cell, CellBuffer};
use crate::error::{RasterError, Result};
use crate::fixed::{flatten_cubic, flatten_quad, float_to_fixed, Fixed, DEFAULT_FLATTEN_EPS};
use crate::format;
use crate::path::{FillRule, Path, PathCommand, Point};

/// Caller-supplied render target parameters (spec §6).
#[derive(Debug, Clone)]
pub struct RasterOptions {
    pub width: u32,
    pub rows: u32,
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub pixel_mode: PixelMode,
    pub fill_rule: FillRule,
    /// Design-Y-up to bitmap-Y-down. Default `true`.
    pub flip_y: bool,
    /// Pass-through for future hinting support; ignored by the core.
    pub hinting: bool,
}

impl Default for RasterOptions {
    fn default() -> Self {
        RasterOptions {
            width: 0,
            rows: 0,
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            pixel_mode: PixelMode::Gray,
            fill_rule: FillRule::NonZero,
            flip_y: true,
            hinting: false,
        }
    }
}

impl RasterOptions {
    pub fn new(width: u32, rows: u32) -> Self {
        RasterOptions { width, rows, ..Default::default() }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.offset_x = x;
        self.offset_y = y;
        self
    }

    pub fn with_pixel_mode(mut self, mode: PixelMode) -> Self {
        self.pixel_mode = mode;
        self
    }

    pub fn with_fill_rule(mut self, rule: FillRule) -> Self {
        self.fill_rule = rule;
        self
    }
}

/// Maximum scanlines processed per band (spec §4.4 "Banding").
pub const MAX_BAND_HEIGHT: i32 = 256;

/// Maximum consecutive band-halvings before a pool overflow becomes fatal
/// (spec §4.3, open question: "ample for realistic glyphs but arbitrary").
pub const MAX_HALVINGS: u32 = 32;

const ONE_PIXEL: i64 = crate::fixed::one_pixel();

#[derive(Clone, Copy)]
struct Transform {
    scale_x: f64,
    scale_y: f64,
    offset_x: f64,
    offset_y: f64,
    flip_y: bool,
    /// Device-space height (target rows, already multiplied by `mul_y` for
    /// the LCD-V 3x-vertical pass) that a Y-flip folds around. Flipping
    /// around the full target rather than around zero is what lets a
    /// design-Y-up path placed at a small positive `offset_y` land inside
    /// the bitmap instead of being carried off the top edge.
    target_height: f64,
}

impl Transform {
    fn from_opts(opts: &RasterOptions, mul_x: f64, mul_y: f64) -> Self {
        Transform {
            scale_x: opts.scale * mul_x,
            scale_y: opts.scale * mul_y,
            offset_x: opts.offset_x * mul_x,
            offset_y: opts.offset_y * mul_y,
            flip_y: opts.flip_y,
            target_height: opts.rows as f64 * mul_y,
        }
    }

    fn apply(&self, p: Point) -> Point {
        let x = p.x * self.scale_x + self.offset_x;
        let y = if self.flip_y {
            self.target_height - (p.y * self.scale_y + self.offset_y)
        } else {
            p.y * self.scale_y + self.offset_y
        };
        Point::new(x, y)
    }
}

/// Decomposes `path` into device-space, flattened, closed contours, reusing
/// `scratch`'s outer and inner `Vec` allocations across calls (spec §5:
/// "transient flattening arrays... reset (length cleared, capacity kept)
/// between calls", owned by the rasterizer instance rather than the
/// free-standing decomposer).
/// Returns the number of leading slots in `scratch` that hold a valid
/// contour for this call; trailing slots are left allocated (cleared) for
/// reuse by the next, possibly larger, call.
fn decompose_to_device_contours(path: &Path, transform: &Transform, eps: f64, scratch: &mut Vec<Vec<Point>>) -> usize {
    for v in scratch.iter_mut() {
        v.clear();
    }
    let mut next_slot = 0usize;
    let mut cur_pt = Point::default();
    let mut has_current = false;

    macro_rules! current {
        () => {{
            if next_slot == scratch.len() {
                scratch.push(Vec::new());
            }
            &mut scratch[next_slot]
        }};
    }

    let flush = |scratch: &mut [Vec<Point>], next_slot: &mut usize| {
        if scratch[*next_slot].len() > 1 {
            *next_slot += 1;
        } else {
            scratch[*next_slot].clear();
        }
    };

    for cmd in &path.commands {
        match *cmd {
            PathCommand::Move(p) => {
                if has_current {
                    flush(scratch, &mut next_slot);
                }
                has_current = true;
                let dp = transform.apply(p);
                current!().push(dp);
                cur_pt = dp;
            }
            PathCommand::Line(p) => {
                let dp = transform.apply(p);
                current!().push(dp);
                cur_pt = dp;
            }
            PathCommand::Quad(c1, p) => {
                let dc1 = transform.apply(c1);
                let dp = transform.apply(p);
                flatten_quad(cur_pt, dc1, dp, eps, current!());
                cur_pt = dp;
            }
            PathCommand::Cubic(c1, c2, p) => {
                let dc1 = transform.apply(c1);
                let dc2 = transform.apply(c2);
                let dp = transform.apply(p);
                flatten_cubic(cur_pt, dc1, dc2, dp, eps, current!());
                cur_pt = dp;
            }
            PathCommand::Close => {
                flush(scratch, &mut next_slot);
            }
        }
    }
    if has_current {
        flush(scratch, &mut next_slot);
    }
    next_slot
}

/// Walks a device-space contour, emitting line segments into the cell
/// buffer via [`render_line`], auto-closing back to the contour's start.
fn render_contours(cells: &mut CellBuffer, contours: &[Vec<Point>]) -> Result<()> {
    for contour in contours {
        if contour.len() < 2 {
            continue;
        }
        let start = contour[0];
        let mut x = float_to_fixed(start.x, 1.0);
        let mut y = float_to_fixed(start.y, 1.0);
        cells.set_current_cell(crate::fixed::fixed_to_pixel(x) as i32, crate::fixed::fixed_to_pixel(y) as i32)?;

        for p in &contour[1..] {
            let nx = float_to_fixed(p.x, 1.0);
            let ny = float_to_fixed(p.y, 1.0);
            render_line(cells, x, y, nx, ny)?;
            x = nx;
            y = ny;
        }
        let last = *contour.last().unwrap();
        if (last.x - start.x).abs() > 1e-9 || (last.y - start.y).abs() > 1e-9 {
            let sx = float_to_fixed(start.x, 1.0);
            let sy = float_to_fixed(start.y, 1.0);
            render_line(cells, x, y, sx, sy)?;
        }
    }
    Ok(())
}

/// Renders a single straight line's contribution into the cell buffer,
/// splitting at row boundaries first, then column boundaries within each
/// row (spec §4.4 "Core line algorithm").
fn render_line(cells: &mut CellBuffer, x1: Fixed, y1: Fixed, x2: Fixed, y2: Fixed) -> Result<()> {
    let shift = crate::fixed::PIXEL_BITS;
    let scale = ONE_PIXEL;
    let mask = scale - 1;

    let ey1 = y1 >> shift;
    let ey2 = y2 >> shift;
    let fy1 = y1 & mask;
    let fy2 = y2 & mask;

    if ey1 == ey2 {
        return render_hline(cells, ey1 as i32, x1, fy1, x2, fy2);
    }

    let dx = x2 - x1;
    let mut dy = y2 - y1;

    if dx == 0 {
        let ex = (x1 >> shift) as i32;
        let two_fx = (x1 - (ex as i64 * scale)) * 2;
        let mut first = scale;
        let mut incr = 1i64;
        let mut ey1m = ey1;
        if dy < 0 {
            first = 0;
            incr = -1;
            dy = -dy;
        }
        let mut delta = first - fy1;
        cells.add_area((two_fx * delta) as i32, delta as i32);
        ey1m += incr;
        cells.set_current_cell(ex, ey1m as i32)?;
        delta = first + first - scale;
        let area = two_fx * delta;
        while ey1m != ey2 {
            cells.add_area(area as i32, delta as i32);
            ey1m += incr;
            cells.set_current_cell(ex, ey1m as i32)?;
        }
        delta = fy2 - scale + first;
        cells.add_area((two_fx * delta) as i32, delta as i32);
        return Ok(());
    }

    // Several horizontal spans to render, one per scanline crossed.
    let mut incr = 1i64;
    let mut p = (scale - fy1) * dx;
    let mut first = scale;
    if dy < 0 {
        p = fy1 * dx;
        first = 0;
        incr = -1;
        dy = -dy;
    }

    let mut delta = p / dy;
    let mut modulo = p % dy;
    if modulo < 0 {
        delta -= 1;
        modulo += dy;
    }

    let mut x_from = x1 + delta;
    render_hline(cells, (ey1) as i32, x1, fy1, x_from, first)?;

    let mut ey1m = ey1 + incr;
    cells.set_current_cell((x_from >> shift) as i32, ey1m as i32)?;

    if ey1m != ey2 {
        let p2 = scale * dx;
        let mut lift = p2 / dy;
        let mut rem = p2 % dy;
        if rem < 0 {
            lift -= 1;
            rem += dy;
        }
        modulo -= dy;

        while ey1m != ey2 {
            let mut d = lift;
            modulo += rem;
            if modulo >= 0 {
                modulo -= dy;
                d += 1;
            }
            let x_to = x_from + d;
            render_hline(cells, ey1m as i32, x_from, scale - first, x_to, first)?;
            x_from = x_to;
            ey1m += incr;
            cells.set_current_cell((x_from >> shift) as i32, ey1m as i32)?;
        }
    }
    render_hline(cells, ey1m as i32, x_from, scale - first, x2, fy2)
}

/// Renders the portion of a line contained within a single scanline row,
/// splitting at column boundaries (spec §4.4).
fn render_hline(cells: &mut CellBuffer, ey: i32, x1: Fixed, y1: Fixed, x2: Fixed, y2: Fixed) -> Result<()> {
    let shift = crate::fixed::PIXEL_BITS;
    let scale = ONE_PIXEL;
    let mask = scale - 1;

    let ex1 = (x1 >> shift) as i32;
    let ex2 = (x2 >> shift) as i32;
    let fx1 = x1 & mask;
    let fx2 = x2 & mask;

    if y1 == y2 {
        cells.set_current_cell(ex2, ey)?;
        return Ok(());
    }

    if ex1 == ex2 {
        let delta = y2 - y1;
        cells.add_area(((fx1 + fx2) * delta) as i32, delta as i32);
        return Ok(());
    }

    let mut dx = x2 - x1;
    let mut incr = 1i64;
    let mut p = (scale - fx1) * (y2 - y1);
    let mut first = scale;
    if dx < 0 {
        p = fx1 * (y2 - y1);
        first = 0;
        incr = -1;
        dx = -dx;
    }

    let mut delta = p / dx;
    let mut modulo = p % dx;
    if modulo < 0 {
        delta -= 1;
        modulo += dx;
    }

    cells.add_area(((fx1 + first) * delta) as i32, delta as i32);

    let mut ex1m = ex1 + incr as i32;
    cells.set_current_cell(ex1m, ey)?;
    let mut y = y1 + delta;

    if ex1m != ex2 {
        let p2 = scale * (y2 - y + delta);
        let mut lift = p2 / dx;
        let mut rem = p2 % dx;
        if rem < 0 {
            lift -= 1;
            rem += dx;
        }
        modulo -= dx;

        while ex1m != ex2 {
            let mut d = lift;
            modulo += rem;
            if modulo >= 0 {
                modulo -= dx;
                d += 1;
            }
            cells.add_area((scale * d) as i32, d as i32);
            y += d;
            ex1m += incr as i32;
            cells.set_current_cell(ex1m, ey)?;
        }
    }
    let delta_final = y2 - y;
    cells.add_area(((fx2 + scale - first) * delta_final) as i32, delta_final as i32);
    Ok(())
}

/// Maps an accumulated raw coverage value (`cover * 2 * ONE_PIXEL - area`)
/// into a clamped `0..255` gray level for the requested fill rule
/// (spec §4.4).
fn coverage_from_raw(raw: i64, fill_rule: FillRule) -> u8 {
    let c = (raw.unsigned_abs() >> 9) as i64;
    match fill_rule {
        FillRule::NonZero => c.min(255) as u8,
        FillRule::EvenOdd => {
            let m = c % 512;
            let v = if m >= 256 { 511 - m } else { m };
            v.clamp(0, 255) as u8
        }
    }
}

fn sweep_row(row_cells: &[Cell], width: i32, fill_rule: FillRule, out_row: &mut [u8]) {
    let mut cover: i64 = 0;
    let mut x_cursor: i32 = 0;

    for cell in row_cells {
        if cell.x > x_cursor && cover != 0 {
            let raw = cover * 2 * ONE_PIXEL;
            let gray = coverage_from_raw(raw, fill_rule);
            if gray != 0 {
                let from = x_cursor.clamp(0, width) as usize;
                let to = cell.x.clamp(0, width) as usize;
                for slot in out_row[from..to].iter_mut() {
                    *slot = gray;
                }
            }
        }
        cover += cell.cover as i64;
        let raw = cover * 2 * ONE_PIXEL - cell.area as i64;
        let gray = coverage_from_raw(raw, fill_rule);
        if cell.x >= 0 && cell.x < width {
            out_row[cell.x as usize] = gray;
        }
        x_cursor = cell.x + 1;
    }

    if cover != 0 && x_cursor < width {
        let raw = cover * 2 * ONE_PIXEL;
        let gray = coverage_from_raw(raw, fill_rule);
        if gray != 0 {
            let from = x_cursor.clamp(0, width) as usize;
            for slot in out_row[from..width as usize].iter_mut() {
                *slot = gray;
            }
        }
    }
}

/// Renders `[y0, y1)` of `contours` into `out` (a `width * total_rows`
/// Gray8 buffer), retrying with a halved band on pool overflow
/// (spec §4.3 "pool-overflow protocol").
#[allow(clippy::too_many_arguments)]
fn render_band(
    cells: &mut CellBuffer,
    contours: &[Vec<Point>],
    width: i32,
    y0: i32,
    y1: i32,
    fill_rule: FillRule,
    out: &mut [u8],
    out_width: usize,
    halvings_left: u32,
) -> Result<()> {
    if y1 <= y0 {
        return Ok(());
    }
    cells.reset();
    cells.set_clip(0, i32::MIN, width, i32::MAX);
    cells.set_band_bounds(y0, y1);

    match render_contours(cells, contours) {
        Ok(()) => {
            for (y, row_cells) in cells.iterate_cells() {
                if y < 0 {
                    continue;
                }
                let out_row = &mut out[y as usize * out_width..(y as usize + 1) * out_width];
                sweep_row(&row_cells, width, fill_rule, out_row);
            }
            Ok(())
        }
        Err(RasterError::PoolOverflow { .. }) => {
            if halvings_left == 0 || y1 - y0 <= 1 {
                let requested_bytes = cells.pool_cap() * std::mem::size_of::<Cell>();
                return Err(RasterError::OutOfMemory { requested_bytes });
            }
            let mid = y0 + (y1 - y0) / 2;
            render_band(cells, contours, width, y0, mid, fill_rule, out, out_width, halvings_left - 1)?;
            render_band(cells, contours, width, mid, y1, fill_rule, out, out_width, halvings_left - 1)
        }
        Err(e) => Err(e),
    }
}

/// Default cell pool capacity: generous for typical glyph complexity while
/// still triggering the overflow/halving protocol under stress tests.
pub const DEFAULT_POOL_CAPACITY: usize = 1 << 16;

/// A reusable rasterizer instance. Owns the cell pool and scratch
/// flattening/coverage buffers; cheap to reset and reuse across renders
/// (spec §5: "transient flattening arrays... reset between calls", never
/// reallocated mid-scan).
pub struct Rasterizer {
    cells: CellBuffer,
    /// Flattened device-space contours from the most recent call; outer and
    /// inner `Vec`s keep their capacity across calls, only their length is
    /// reset (spec §5 "Memory discipline").
    contour_scratch: Vec<Vec<Point>>,
    /// Gray8 coverage scratch, sized to the largest `width * rows` rendered
    /// so far; reused instead of reallocated on subsequent, equal-or-smaller
    /// renders.
    coverage_scratch: Vec<u8>,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    pub fn new() -> Self {
        Self::with_pool_capacity(DEFAULT_POOL_CAPACITY)
    }

    pub fn with_pool_capacity(cap: usize) -> Self {
        Rasterizer { cells: CellBuffer::new(cap), contour_scratch: Vec::new(), coverage_scratch: Vec::new() }
    }

    /// Rasterizes `path` into a coverage buffer of `width * rows` Gray8
    /// pixels (no pixel-mode packing yet), banding internally when `rows`
    /// exceeds [`MAX_BAND_HEIGHT`]. Returns a borrow of the rasterizer's
    /// reused coverage scratch buffer.
    fn rasterize_coverage(
        &mut self,
        path: &Path,
        width: u32,
        rows: u32,
        transform: &Transform,
        fill_rule: FillRule,
    ) -> Result<&[u8]> {
        let len = width as usize * rows as usize;
        self.coverage_scratch.clear();
        self.coverage_scratch.resize(len, 0);

        let contour_count = decompose_to_device_contours(path, transform, DEFAULT_FLATTEN_EPS, &mut self.contour_scratch);
        if contour_count == 0 {
            return Ok(&self.coverage_scratch);
        }

        let mut y0 = 0i32;
        let total = rows as i32;
        while y0 < total {
            let y1 = (y0 + MAX_BAND_HEIGHT).min(total);
            render_band(
                &mut self.cells,
                &self.contour_scratch[..contour_count],
                width as i32,
                y0,
                y1,
                fill_rule,
                &mut self.coverage_scratch,
                width as usize,
                MAX_HALVINGS,
            )?;
            y0 = y1;
        }
        Ok(&self.coverage_scratch)
    }

    /// Rasterizes `path` according to `opts`, producing a bitmap in the
    /// requested pixel mode (spec §4.4/§4.5/§6).
    pub fn rasterize(&mut self, path: &Path, opts: &RasterOptions) -> Result<Bitmap> {
        if opts.width == 0 || opts.rows == 0 {
            return Err(RasterError::InvalidDimensions { width: opts.width as i64, rows: opts.rows as i64 });
        }

        match opts.pixel_mode {
            PixelMode::Gray => {
                let transform = Transform::from_opts(opts, 1.0, 1.0);
                let cov = self.rasterize_coverage(path, opts.width, opts.rows, &transform, opts.fill_rule)?;
                Ok(format::pack_gray(cov, opts.width, opts.rows))
            }
            PixelMode::Mono => {
                let transform = Transform::from_opts(opts, 1.0, 1.0);
                let cov = self.rasterize_coverage(path, opts.width, opts.rows, &transform, opts.fill_rule)?;
                Ok(format::pack_mono(cov, opts.width, opts.rows))
            }
            PixelMode::Rgba => {
                let transform = Transform::from_opts(opts, 1.0, 1.0);
                let cov = self.rasterize_coverage(path, opts.width, opts.rows, &transform, opts.fill_rule)?;
                Ok(format::pack_rgba(cov, opts.width, opts.rows, [0, 0, 0, 255]))
            }
            PixelMode::LcdH => {
                let transform = Transform::from_opts(opts, 3.0, 1.0);
                let cov = self.rasterize_coverage(path, opts.width * 3, opts.rows, &transform, opts.fill_rule)?;
                Ok(format::pack_lcd_h(cov, opts.width, opts.rows, &format::DEFAULT_LCD_WEIGHTS, false))
            }
            PixelMode::LcdV => {
                let transform = Transform::from_opts(opts, 1.0, 3.0);
                let cov = self.rasterize_coverage(path, opts.width, opts.rows * 3, &transform, opts.fill_rule)?;
                Ok(format::pack_lcd_v(cov, opts.width, opts.rows, &format::DEFAULT_LCD_WEIGHTS, false))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::FillRule;

    fn unit_square_path() -> Path {
        let mut p = Path::new();
        p.move_to(0.0, 0.0);
        p.line_to(10.0, 0.0);
        p.line_to(10.0, 10.0);
        p.line_to(0.0, 10.0);
        p.close();
        p
    }

    #[test]
    fn scenario_s1_unit_square_gray() {
        let mut r = Rasterizer::new();
        let path = unit_square_path();
        let opts = RasterOptions::new(20, 20).with_offset(5.0, 5.0).with_fill_rule(FillRule::NonZero);
        // Design Y-up: a square from (0,0)-(10,10) sits with its bottom-left
        // at the offset origin once flipped into bitmap space.
        let bmp = r.rasterize(&path, &opts).unwrap();
        assert_eq!(bmp.width, 20);
        assert_eq!(bmp.rows, 20);
        let sum: u64 = bmp.buffer.iter().map(|&b| b as u64).sum();
        // 100 fully-covered interior pixels at 255 plus edge AA from the
        // flip; allow slack around the exact analytic value.
        assert!(sum >= 25000, "sum={sum}");
    }

    #[test]
    fn empty_path_produces_all_zero_bitmap() {
        let mut r = Rasterizer::new();
        let opts = RasterOptions::new(10, 10);
        let bmp = r.rasterize(&Path::new(), &opts).unwrap();
        assert!(bmp.buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn zero_dimensions_are_a_contract_error() {
        let mut r = Rasterizer::new();
        let opts = RasterOptions::new(0, 10);
        let err = r.rasterize(&unit_square_path(), &opts);
        assert!(matches!(err, Err(RasterError::InvalidDimensions { .. })));
    }

    #[test]
    fn gray_output_values_are_in_range() {
        let mut r = Rasterizer::new();
        let opts = RasterOptions::new(30, 30).with_offset(5.0, 5.0).with_scale(1.3);
        let bmp = r.rasterize(&unit_square_path(), &opts).unwrap();
        for &b in &bmp.buffer {
            assert!(b <= 255);
        }
    }

    #[test]
    fn banding_produces_same_coverage_as_single_band() {
        // A tall bitmap forces multiple bands (> MAX_BAND_HEIGHT rows).
        let mut r = Rasterizer::new();
        let mut path = Path::new();
        path.move_to(0.0, 0.0);
        path.line_to(100.0, 0.0);
        path.line_to(100.0, 500.0);
        path.line_to(0.0, 500.0);
        path.close();
        let opts = RasterOptions::new(120, 520).with_offset(10.0, 10.0);
        let bmp = r.rasterize(&path, &opts).unwrap();
        let sum: u64 = bmp.buffer.iter().map(|&b| b as u64).sum();
        assert!(sum > 0);
    }

    #[test]
    fn reused_instance_gives_bit_exact_repeat_renders() {
        // Exercises the shared contour/coverage scratch buffers (spec §5
        // "rasterizing the same path twice with identical parameters is
        // bit-exact reproducible"): a stale leftover contour or coverage
        // byte from a prior, larger render must not leak into a smaller one.
        let mut r = Rasterizer::new();
        let opts = RasterOptions::new(20, 20).with_offset(5.0, 5.0);

        let mut big = Path::new();
        big.move_to(-50.0, -50.0);
        big.line_to(150.0, -50.0);
        big.line_to(150.0, 150.0);
        big.line_to(-50.0, 150.0);
        big.close();
        let _ = r.rasterize(&big, &RasterOptions::new(20, 20).with_offset(5.0, 5.0)).unwrap();

        let square = unit_square_path();
        let first = r.rasterize(&square, &opts).unwrap();
        let second = r.rasterize(&square, &opts).unwrap();
        assert_eq!(first.buffer, second.buffer);
    }

    #[test]
    fn contour_scratch_slots_are_reused_not_reallocated() {
        let mut scratch: Vec<Vec<Point>> = Vec::new();
        let transform =
            Transform { scale_x: 1.0, scale_y: 1.0, offset_x: 0.0, offset_y: 0.0, flip_y: false, target_height: 10.0 };

        let count = decompose_to_device_contours(&unit_square_path(), &transform, DEFAULT_FLATTEN_EPS, &mut scratch);
        assert_eq!(count, 1);
        let cap_after_first = scratch[0].capacity();
        assert!(cap_after_first > 0);

        let mut two_contours = Path::new();
        two_contours.move_to(0.0, 0.0);
        two_contours.line_to(1.0, 0.0);
        two_contours.move_to(5.0, 5.0);
        two_contours.line_to(6.0, 5.0);
        let count2 = decompose_to_device_contours(&two_contours, &transform, DEFAULT_FLATTEN_EPS, &mut scratch);
        assert_eq!(count2, 2);
        // The first slot's allocation survived across calls rather than
        // being dropped and reallocated.
        assert_eq!(scratch[0].capacity(), cap_after_first);
    }
}

//! Sub-pixel cell buffer (spec §4.3, component C3).
//!
//! FreeType's `grays` rasterizer keeps a linked list of cells per scanline
//! using raw pointers and a pool; per §9's redesign note this is
//! reimplemented as an arena `Vec<Cell>` plus `Vec<u32>` row-head indices,
//! with `u32::MAX` as the list-terminator sentinel. Index-based lists are
//! cache-friendly and avoid unsafe pointer juggling. The free-list-style
//! reuse is grounded in the teacher's `canvas/buffer_pool.rs`
//! (`BufferPool::acquire`/`release`) generalized from whole buffers to
//! individual pool slots.

use crate::error::{RasterError, Result};

/// Sentinel marking the end of a per-row cell list, or an unset
/// `current_cell` pointer.
pub const NULL: u32 = u32::MAX;

/// A sub-pixel accumulator for one pixel within one scan-conversion run
/// (spec §3). `area` is signed, in units of `2 * subpixel^2`; `cover`
/// sums vertical crossings leaving the pixel.
///
/// `Pod`/`Zeroable` (the teacher's `canvas/gpu/types.rs` marks every
/// GPU-bound vertex/uniform struct this way) let a debug or atlas-upload
/// caller `bytemuck::cast_slice` a row's cells straight to bytes without a
/// serialization pass.
#[derive(Debug, Copy, Clone, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Cell {
    pub x: i32,
    pub area: i32,
    pub cover: i32,
    pub next: u32,
}

/// Pool-backed per-scanline cell storage for one rasterization band
/// (spec §4.3).
pub struct CellBuffer {
    pool: Vec<Cell>,
    pool_cap: usize,
    /// `y_cells[y - band_min_y]` heads the sorted list of cells on row `y`.
    y_cells: Vec<u32>,
    band_min_y: i32,
    band_max_y: i32,
    clip_x_min: i32,
    clip_y_min: i32,
    clip_x_max: i32,
    clip_y_max: i32,
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    current_cell: u32,
    current_x: i32,
    current_y: i32,
}

impl CellBuffer {
    /// Creates a buffer with room for `pool_cap` cells.
    pub fn new(pool_cap: usize) -> Self {
        CellBuffer {
            pool: Vec::with_capacity(pool_cap),
            pool_cap,
            y_cells: Vec::new(),
            band_min_y: 0,
            band_max_y: 0,
            clip_x_min: i32::MIN,
            clip_y_min: i32::MIN,
            clip_x_max: i32::MAX,
            clip_y_max: i32::MAX,
            min_x: i32::MAX,
            max_x: i32::MIN,
            min_y: i32::MAX,
            max_y: i32::MIN,
            current_cell: NULL,
            current_x: 0,
            current_y: 0,
        }
    }

    /// Installs the active clip rectangle (inclusive on the min side,
    /// exclusive on the max side — i.e. `[x_min, x_max) x [y_min, y_max)`).
    pub fn set_clip(&mut self, x_min: i32, y_min: i32, x_max: i32, y_max: i32) {
        self.clip_x_min = x_min;
        self.clip_y_min = y_min;
        self.clip_x_max = x_max;
        self.clip_y_max = y_max;
    }

    /// Installs a new scan band `[y_min, y_max)`, reallocating the row-head
    /// table.
    pub fn set_band_bounds(&mut self, y_min: i32, y_max: i32) {
        self.band_min_y = y_min;
        self.band_max_y = y_max;
        let height = (y_max - y_min).max(0) as usize;
        self.y_cells = vec![NULL; height];
    }

    /// Empties all cell lists and resets accumulated bounds, without
    /// touching the band/clip rectangle.
    pub fn reset(&mut self) {
        self.pool.clear();
        for head in self.y_cells.iter_mut() {
            *head = NULL;
        }
        self.min_x = i32::MAX;
        self.max_x = i32::MIN;
        self.min_y = i32::MAX;
        self.max_y = i32::MIN;
        self.current_cell = NULL;
    }

    pub fn pool_used(&self) -> usize {
        self.pool.len()
    }

    pub fn pool_cap(&self) -> usize {
        self.pool_cap
    }

    /// Converts a fixed-point coordinate to an integer pixel cell and makes
    /// it the current cell, clipping to the band and clip rectangle. If the
    /// target pixel lies outside either, `current_cell` becomes `None` and
    /// subsequent [`CellBuffer::add_area`] calls are no-ops.
    ///
    /// Returns `Err(RasterError::PoolOverflow)` if a new cell is needed but
    /// the pool is exhausted.
    pub fn set_current_cell(&mut self, x: i32, y: i32) -> Result<()> {
        if x < self.clip_x_min
            || x >= self.clip_x_max
            || y < self.clip_y_min
            || y >= self.clip_y_max
            || y < self.band_min_y
            || y >= self.band_max_y
        {
            self.current_cell = NULL;
            return Ok(());
        }

        let row = (y - self.band_min_y) as usize;
        let mut prev: Option<u32> = None;
        let mut cursor = self.y_cells[row];

        loop {
            if cursor == NULL {
                break;
            }
            let existing_x = self.pool[cursor as usize].x;
            if existing_x >= x {
                break;
            }
            prev = Some(cursor);
            cursor = self.pool[cursor as usize].next;
        }

        if cursor != NULL && self.pool[cursor as usize].x == x {
            self.current_cell = cursor;
        } else {
            if self.pool.len() >= self.pool_cap {
                return Err(RasterError::PoolOverflow { retries: 0 });
            }
            let new_index = self.pool.len() as u32;
            self.pool.push(Cell { x, area: 0, cover: 0, next: cursor });
            match prev {
                Some(p) => self.pool[p as usize].next = new_index,
                None => self.y_cells[row] = new_index,
            }
            self.current_cell = new_index;
        }

        self.current_x = x;
        self.current_y = y;
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        Ok(())
    }

    /// Adds to the current cell's area/cover accumulators. A no-op if the
    /// current cell is unset (pixel outside band/clip).
    pub fn add_area(&mut self, delta_area: i32, delta_cover: i32) {
        if self.current_cell == NULL {
            return;
        }
        let cell = &mut self.pool[self.current_cell as usize];
        cell.area += delta_area;
        cell.cover += delta_cover;
    }

    pub fn current_xy(&self) -> (i32, i32) {
        (self.current_x, self.current_y)
    }

    pub fn has_current_cell(&self) -> bool {
        self.current_cell != NULL
    }

    /// Iterates band rows top-to-bottom, yielding `(y, cells)` where
    /// `cells` is the row's cell list in ascending `x` order.
    pub fn iterate_cells(&self) -> impl Iterator<Item = (i32, Vec<Cell>)> + '_ {
        (0..self.y_cells.len()).filter_map(move |row| {
            let mut head = self.y_cells[row];
            if head == NULL {
                return None;
            }
            let mut cells = Vec::new();
            while head != NULL {
                let c = self.pool[head as usize];
                cells.push(c);
                head = c.next;
            }
            Some((self.band_min_y + row as i32, cells))
        })
    }

    pub fn band_bounds(&self) -> (i32, i32) {
        (self.band_min_y, self.band_max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_lists_stay_strictly_ascending_in_x() {
        let mut cb = CellBuffer::new(64);
        cb.set_clip(0, 0, 100, 100);
        cb.set_band_bounds(0, 100);
        for &x in &[5, 1, 3, 1, 9, 3] {
            cb.set_current_cell(x, 10).unwrap();
            cb.add_area(1, 1);
        }
        let (_, cells) = cb.iterate_cells().next().unwrap();
        let xs: Vec<i32> = cells.iter().map(|c| c.x).collect();
        let mut sorted = xs.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(xs, sorted);
    }

    #[test]
    fn out_of_clip_cell_is_a_noop() {
        let mut cb = CellBuffer::new(16);
        cb.set_clip(0, 0, 10, 10);
        cb.set_band_bounds(0, 10);
        cb.set_current_cell(50, 50).unwrap();
        assert!(!cb.has_current_cell());
        cb.add_area(100, 100); // must not panic
        assert!(cb.iterate_cells().next().is_none());
    }

    #[test]
    fn pool_overflow_is_reported() {
        let mut cb = CellBuffer::new(1);
        cb.set_clip(0, 0, 100, 100);
        cb.set_band_bounds(0, 100);
        cb.set_current_cell(1, 1).unwrap();
        let err = cb.set_current_cell(2, 1);
        assert!(matches!(err, Err(RasterError::PoolOverflow { .. })));
    }

    #[test]
    fn reset_clears_lists_and_bounds() {
        let mut cb = CellBuffer::new(16);
        cb.set_clip(0, 0, 100, 100);
        cb.set_band_bounds(0, 100);
        cb.set_current_cell(1, 1).unwrap();
        cb.add_area(5, 5);
        cb.reset();
        assert_eq!(cb.pool_used(), 0);
        assert!(cb.iterate_cells().next().is_none());
        assert_eq!(cb.min_x, i32::MAX);
    }
}

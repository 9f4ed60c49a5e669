//! `raster_core` — font-format-driven 2D vector rasterizer and
//! glyph-imaging engine.
//!
//! This crate is the outline-rasterization and distance-field *core*: it
//! consumes a [`path::Path`] (move/line/quad/cubic/close commands) and
//! produces anti-aliased, monochrome, LCD-subpixel, RGBA, or MSDF bitmaps,
//! plus a shelf-packed glyph atlas. Font-file parsing, cmap lookup,
//! shaping, hinting execution, and presentation-layer emitters are
//! explicitly out of scope — see each module's doc comment for the exact
//! hand-off contract with those external collaborators.
//!
//! Module layout mirrors the nine cooperating components:
//!
//! | module | component |
//! |---|---|
//! | [`fixed`] | C1 fixed-point & Bézier math |
//! | [`bounds`] | C2 exact bounds engine |
//! | [`cell`] | C3 cell buffer |
//! | [`raster`] | C4 gray raster |
//! | [`format`] | C5 format assembler & LCD filter |
//! | [`stroke`] | C6 stroker & synth transforms |
//! | [`msdf`] | C7 MSDF generator |
//! | [`atlas`] | C8 atlas builder |
//! | [`gradient`] | C9 gradient sampler |

pub mod atlas;
pub mod bitmap;
pub mod bounds;
pub mod cell;
pub mod error;
pub mod fixed;
pub mod format;
pub mod gradient;
pub mod msdf;
pub mod path;
pub mod raster;
pub mod stroke;

pub use atlas::{Atlas, AtlasBuilder, GlyphId, GlyphMetrics};
pub use bitmap::{Bitmap, PixelMode};
pub use bounds::exact_bounds;
pub use error::{RasterError, Result};
pub use gradient::{ColorStop, Gradient};
pub use msdf::{MsdfConfig, MsdfEdge};
pub use path::{BoundingBox, FillRule, Path, PathCommand, Point};
pub use raster::{RasterOptions, Rasterizer};
pub use stroke::{Cap, Join, StrokeOptions};

//! Error variants for the rasterization pipeline (spec §6, §7).
//!
//! Domain no-ops (empty path, fully-clipped path, zero-area stroke) are
//! *not* represented here — they succeed with an all-zero bitmap. Only
//! contract violations and resource exhaustion propagate.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, RasterError>;

/// Errors the core rasterizer can report.
///
/// Numerical edge cases (degenerate curves, near-zero denominators) are
/// handled in-algorithm via tolerance tests and never surfaced as errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RasterError {
    /// No render target was supplied and no span callback was installed.
    #[error("no render target: bitmap is absent and no span sink was provided")]
    EmptyTarget,

    /// `width`/`rows` (or a stroke/atlas dimension) was zero or negative.
    #[error("invalid dimensions: width={width}, rows={rows}")]
    InvalidDimensions {
        /// Requested width in pixels.
        width: i64,
        /// Requested row count in pixels.
        rows: i64,
    },

    /// An unrecognized or unimplemented `PixelMode` tag was requested.
    #[error("unsupported pixel mode: {0}")]
    UnsupportedPixelMode(String),

    /// The cell pool could not satisfy an allocation after the maximum
    /// number of band-halving retries (§4.3).
    #[error("cell pool exhausted after {retries} band-halving retries")]
    PoolOverflow {
        /// Number of halvings attempted before giving up.
        retries: u32,
    },

    /// A scratch or output buffer could not be allocated at the size the
    /// render requires.
    #[error("out of memory: failed to allocate {requested_bytes} bytes")]
    OutOfMemory {
        /// Size of the allocation that failed, in bytes.
        requested_bytes: usize,
    },
}

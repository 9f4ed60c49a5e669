//! Path data model (spec §3, §6).
//!
//! A `Path` is the binary contract with path producers: font outline
//! extractors, SVG parsers, or hand-built shapes all funnel through this
//! tagged command sequence. The core never dispatches virtually on a
//! command — `Rasterizer`/`bounds`/`stroke` all match on the `PathCommand`
//! tag directly in their hot loops (§9 "duck-typed path commands").
//!
//! Producing a `Path` from font glyph outlines is outside this crate's
//! scope (§1), but the command ordering below is deliberately identical to
//! `ttf_parser::OutlineBuilder`'s callbacks (`move_to`/`line_to`/`quad_to`/
//! `curve_to`/`close`), so an adapter is a direct one-to-one mapping with
//! no buffering or reordering required.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point in design-unit (or, after scaling, pixel-unit) space.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// One command in a path's command stream (spec §6).
///
/// `Move` always starts a subpath; `Close` ends one. Two consecutive
/// `Move`s implicitly close-without-join the previous subpath (no line is
/// drawn back to its start).
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PathCommand {
    Move(Point),
    Line(Point),
    /// Quadratic Bézier: one control point, one endpoint.
    Quad(Point, Point),
    /// Cubic Bézier: two control points, one endpoint.
    Cubic(Point, Point, Point),
    Close,
}

/// An axis-aligned bounding box in design units, or absent for an empty
/// path (spec §3, §4.2).
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn point(p: Point) -> Self {
        BoundingBox { x_min: p.x, y_min: p.y, x_max: p.x, y_max: p.y }
    }

    pub fn extend(&mut self, p: Point) {
        self.x_min = self.x_min.min(p.x);
        self.y_min = self.y_min.min(p.y);
        self.x_max = self.x_max.max(p.x);
        self.y_max = self.y_max.max(p.y);
    }

    pub fn union(self, other: BoundingBox) -> BoundingBox {
        BoundingBox {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Expands the box by `amount` on every side. Used by the stroker to
    /// report the expanded bounds of a stroked path (spec S5/invariant 6).
    pub fn expand(self, amount: f64) -> BoundingBox {
        BoundingBox {
            x_min: self.x_min - amount,
            y_min: self.y_min - amount,
            x_max: self.x_max + amount,
            y_max: self.y_max + amount,
        }
    }

    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.x_min <= other.x_min
            && self.y_min <= other.y_min
            && self.x_max >= other.x_max
            && self.y_max >= other.y_max
    }
}

/// An ordered sequence of path commands plus an optional precomputed
/// bounding box (spec §3).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Path {
    pub commands: Vec<PathCommand>,
    pub bounds: Option<BoundingBox>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::Move(Point::new(x, y)));
        self.bounds = None;
        self
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::Line(Point::new(x, y)));
        self.bounds = None;
        self
    }

    pub fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) -> &mut Self {
        self.commands
            .push(PathCommand::Quad(Point::new(cx, cy), Point::new(x, y)));
        self.bounds = None;
        self
    }

    pub fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::Cubic(
            Point::new(c1x, c1y),
            Point::new(c2x, c2y),
            Point::new(x, y),
        ));
        self.bounds = None;
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.commands.push(PathCommand::Close);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns the precomputed bounds if present, otherwise computes them
    /// on the fly via [`crate::bounds::exact_bounds`].
    pub fn bounds_or_compute(&self) -> Option<BoundingBox> {
        self.bounds.or_else(|| crate::bounds::exact_bounds(self))
    }
}

/// Fill rule used to resolve overlapping/self-intersecting subpaths into a
/// single inside/outside decision (spec §4.4, glossary).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_extend_tracks_min_max() {
        let mut b = BoundingBox::point(Point::new(1.0, 1.0));
        b.extend(Point::new(-2.0, 5.0));
        b.extend(Point::new(3.0, -1.0));
        assert_eq!(b.x_min, -2.0);
        assert_eq!(b.y_min, -1.0);
        assert_eq!(b.x_max, 3.0);
        assert_eq!(b.y_max, 5.0);
    }

    #[test]
    fn bounding_box_expand_grows_every_side() {
        let b = BoundingBox { x_min: 0.0, y_min: 0.0, x_max: 10.0, y_max: 0.0 };
        let e = b.expand(5.0);
        assert_eq!(e, BoundingBox { x_min: -5.0, y_min: -5.0, x_max: 15.0, y_max: 5.0 });
    }

    #[test]
    fn path_builder_resets_cached_bounds() {
        let mut p = Path::new();
        p.bounds = Some(BoundingBox::point(Point::new(0.0, 0.0)));
        p.line_to(1.0, 1.0);
        assert!(p.bounds.is_none());
    }
}

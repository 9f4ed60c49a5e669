//! Exact bounding-box engine (spec §4.2, component C2).
//!
//! Grounded in `typst-pixglyph`'s bbox handling (`examples/other_examples/
//! ..._typst-pixglyph...`), which derives a glyph's pixel rect directly from
//! the font's cached bbox; here we compute that bbox analytically from the
//! path itself, since the core has no font cache to read one from.

use crate::fixed::{cubic_extrema, quadratic_extrema, eval_cubic, eval_quad};
use crate::path::{BoundingBox, Path, PathCommand, Point};

/// Computes the tightest axis-aligned bounding box of `path`, or `None` for
/// an empty path (spec §4.2). A path containing only a `Move` yields a
/// degenerate box at that point. `Close` never alters the bounds.
pub fn exact_bounds(path: &Path) -> Option<BoundingBox> {
    let mut bounds: Option<BoundingBox> = None;
    let mut current = Point::new(0.0, 0.0);

    let mut extend = |bounds: &mut Option<BoundingBox>, p: Point| match bounds {
        Some(b) => b.extend(p),
        None => *bounds = Some(BoundingBox::point(p)),
    };

    for cmd in &path.commands {
        match *cmd {
            PathCommand::Move(p) => {
                extend(&mut bounds, p);
                current = p;
            }
            PathCommand::Line(p) => {
                extend(&mut bounds, p);
                current = p;
            }
            PathCommand::Quad(c1, p) => {
                extend(&mut bounds, p);
                for t in quadratic_extrema(current, c1, p) {
                    extend(&mut bounds, eval_quad(current, c1, p, t));
                }
                current = p;
            }
            PathCommand::Cubic(c1, c2, p) => {
                extend(&mut bounds, p);
                for t in cubic_extrema(current, c1, c2, p) {
                    extend(&mut bounds, eval_cubic(current, c1, c2, p, t));
                }
                current = p;
            }
            PathCommand::Close => {
                // Does not alter bounds.
            }
        }
    }

    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_from(cmds: &[PathCommand]) -> Path {
        Path { commands: cmds.to_vec(), bounds: None }
    }

    #[test]
    fn empty_path_has_absent_bounds() {
        assert_eq!(exact_bounds(&Path::new()), None);
    }

    #[test]
    fn close_only_path_has_absent_bounds() {
        let p = path_from(&[PathCommand::Close]);
        assert_eq!(exact_bounds(&p), None);
    }

    #[test]
    fn move_only_path_yields_degenerate_bounds() {
        let p = path_from(&[PathCommand::Move(Point::new(3.0, 4.0))]);
        let b = exact_bounds(&p).unwrap();
        assert_eq!(b, BoundingBox { x_min: 3.0, y_min: 4.0, x_max: 3.0, y_max: 4.0 });
    }

    #[test]
    fn scenario_s1_unit_square() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0);
        p.line_to(10.0, 0.0);
        p.line_to(10.0, 10.0);
        p.line_to(0.0, 10.0);
        p.close();
        let b = exact_bounds(&p).unwrap();
        assert_eq!(b, BoundingBox { x_min: 0.0, y_min: 0.0, x_max: 10.0, y_max: 10.0 });
    }

    #[test]
    fn scenario_s2_quadratic_cap_tight_peak() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0);
        p.quad_to(50.0, 100.0, 100.0, 0.0);
        p.close();
        let b = exact_bounds(&p).unwrap();
        assert_eq!(b, BoundingBox { x_min: 0.0, y_min: 0.0, x_max: 100.0, y_max: 50.0 });
    }

    #[test]
    fn invariant_bounds_cover_dense_curve_sampling() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0);
        p.cubic_to(10.0, 90.0, 90.0, -40.0, 100.0, 20.0);
        let b = exact_bounds(&p).unwrap();
        let p0 = Point::new(0.0, 0.0);
        let c1 = Point::new(10.0, 90.0);
        let c2 = Point::new(90.0, -40.0);
        let p3 = Point::new(100.0, 20.0);
        for i in 0..10_000 {
            let t = i as f64 / 9_999.0;
            let sample = eval_cubic(p0, c1, c2, p3, t);
            assert!(sample.x >= b.x_min - 1e-6 && sample.x <= b.x_max + 1e-6);
            assert!(sample.y >= b.y_min - 1e-6 && sample.y <= b.y_max + 1e-6);
        }
    }
}

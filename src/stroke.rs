//! Stroker & synth path transforms (spec §4.6, component C6).
//!
//! The uniform/asymmetric offset-curve stroker has no direct ancestor in
//! the teacher repo (Motioner draws glyph fills, not stroked outlines), so
//! its join/cap geometry is built from the spec's formulas directly, in
//! the idiom of this crate's own C4 (`raster.rs`) contour decomposition —
//! reusing [`crate::fixed::flatten_quad`]/`flatten_cubic` rather than
//! inventing a second flattener. The synth transforms (`oblique`/
//! `condense`/`transform`/`embolden`) mirror the affine/easing-constant
//! style of the teacher's `canvas/gpu/utils.rs` (`easing_to_gpu`): small
//! pure functions over `f64`, no shared state.

use crate::fixed::{flatten_cubic, flatten_quad, DEFAULT_FLATTEN_EPS, EPSILON};
use crate::path::{BoundingBox, Path, PathCommand, Point};

/// Stroke cap style for the far/near ends of an open contour (spec §4.6).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cap {
    Butt,
    Round,
    Square,
}

/// Stroke join style at interior vertices (spec §4.6).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Join {
    Miter,
    Round,
    Bevel,
}

/// Options for the uniform stroker.
#[derive(Debug, Clone, Copy)]
pub struct StrokeOptions {
    pub width: f64,
    pub cap: Cap,
    pub join: Join,
    pub miter_limit: f64,
    pub flatten_eps: f64,
}

impl Default for StrokeOptions {
    fn default() -> Self {
        StrokeOptions {
            width: 1.0,
            cap: Cap::Butt,
            join: Join::Miter,
            miter_limit: 4.0,
            flatten_eps: DEFAULT_FLATTEN_EPS,
        }
    }
}

impl StrokeOptions {
    pub fn new(width: f64) -> Self {
        StrokeOptions { width, ..Default::default() }
    }
}

/// Turn angle (radians, signed) below which a join is elided and the two
/// edges are treated as collinear (spec §4.6).
const JOIN_ELIDE_THRESHOLD: f64 = 0.01;

/// Bézier kappa: offset of a round cap's control point from its endpoint,
/// `≈ 0.5523 * r` (spec §4.6).
const ROUND_CAP_KAPPA: f64 = 0.5523;

fn unit_dir(a: Point, b: Point) -> Option<Point> {
    let d = b - a;
    let len = (d.x * d.x + d.y * d.y).sqrt();
    if len < EPSILON {
        None
    } else {
        Some(Point::new(d.x / len, d.y / len))
    }
}

/// Asymmetric offset direction, scaled per-axis by the border widths
/// `(wx, wy)` (spec §4.6: `perp = normalize(-dy*wy, dx*wx)`). The result's
/// magnitude is re-expanded along each axis by `(wx, wy)` so the two border
/// widths act as independent radii rather than only steering direction.
fn perp_offset(dir: Point, wx: f64, wy: f64) -> Point {
    let raw = Point::new(-dir.y * wy, dir.x * wx);
    let len = (raw.x * raw.x + raw.y * raw.y).sqrt();
    if len < EPSILON {
        Point::new(0.0, 0.0)
    } else {
        Point::new(raw.x / len * wx, raw.y / len * wy)
    }
}

fn signed_turn_angle(d_in: Point, d_out: Point) -> f64 {
    let cross = d_in.x * d_out.y - d_in.y * d_out.x;
    let dot = d_in.x * d_out.x + d_in.y * d_out.y;
    cross.atan2(dot)
}

/// Flattens `path` into polylines, tagging each with whether it was closed
/// by an explicit `Close` command. Mirrors `raster.rs`'s contour
/// decomposition but in design space (no device transform).
fn flatten_contours(path: &Path, eps: f64) -> Vec<(Vec<Point>, bool)> {
    let mut contours = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let mut closed = false;
    let mut cur_pt = Point::default();
    let mut start_pt = Point::default();

    let flush = |current: &mut Vec<Point>, closed: bool, contours: &mut Vec<(Vec<Point>, bool)>| {
        if current.len() > 1 {
            contours.push((std::mem::take(current), closed));
        } else {
            current.clear();
        }
    };

    for cmd in &path.commands {
        match *cmd {
            PathCommand::Move(p) => {
                flush(&mut current, closed, &mut contours);
                closed = false;
                current.push(p);
                cur_pt = p;
                start_pt = p;
            }
            PathCommand::Line(p) => {
                current.push(p);
                cur_pt = p;
            }
            PathCommand::Quad(c1, p) => {
                flatten_quad(cur_pt, c1, p, eps, &mut current);
                cur_pt = p;
            }
            PathCommand::Cubic(c1, c2, p) => {
                flatten_cubic(cur_pt, c1, c2, p, eps, &mut current);
                cur_pt = p;
            }
            PathCommand::Close => {
                closed = true;
                flush(&mut current, true, &mut contours);
                cur_pt = start_pt;
            }
        }
    }
    flush(&mut current, closed, &mut contours);
    contours
}

/// Emits one interior-vertex join into `out`, given the incoming/outgoing
/// edge unit directions at `vertex` (spec §4.6). `side_sign` is `+1.0` or
/// `-1.0` selecting which offset side is being built.
#[allow(clippy::too_many_arguments)]
fn emit_join(
    out: &mut Vec<Point>,
    vertex: Point,
    d_in: Point,
    d_out: Point,
    wx: f64,
    wy: f64,
    side_sign: f64,
    join: Join,
    miter_limit: f64,
) {
    let angle = signed_turn_angle(d_in, d_out);
    if angle.abs() < JOIN_ELIDE_THRESHOLD {
        out.push(vertex + perp_offset(d_out, wx, wy) * side_sign);
        return;
    }

    let off_in = perp_offset(d_in, wx, wy) * side_sign;
    let off_out = perp_offset(d_out, wx, wy) * side_sign;
    let is_outer = side_sign * angle < 0.0;

    if !is_outer {
        // Inner join: a straight line; overlap with prior geometry is
        // absorbed by the fill rule (spec §4.6).
        out.push(vertex + off_in);
        out.push(vertex + off_out);
        return;
    }

    match join {
        Join::Bevel => {
            out.push(vertex + off_in);
            out.push(vertex + off_out);
        }
        Join::Round => {
            let r_in = (off_in.x * off_in.x + off_in.y * off_in.y).sqrt();
            let r_out = (off_out.x * off_out.x + off_out.y * off_out.y).sqrt();
            let theta = angle.abs();
            let segments = (theta / (std::f64::consts::FRAC_PI_4)).ceil().max(2.0) as u32;
            let len_in = r_in.max(EPSILON);
            let len_out = r_out.max(EPSILON);
            let n_in = Point::new(off_in.x / len_in, off_in.y / len_in);
            let n_out = Point::new(off_out.x / len_out, off_out.y / len_out);
            for k in 0..=segments {
                let t = k as f64 / segments as f64;
                // Normalized-lerp arc: good enough approximation for a
                // join (as opposed to the exact semicircle formula the
                // spec reserves for caps).
                let lx = n_in.x + (n_out.x - n_in.x) * t;
                let ly = n_in.y + (n_out.y - n_in.y) * t;
                let l = (lx * lx + ly * ly).sqrt().max(EPSILON);
                let r = r_in + (r_out - r_in) * t;
                out.push(Point::new(vertex.x + lx / l * r, vertex.y + ly / l * r));
            }
        }
        Join::Miter => {
            let len_in = (off_in.x * off_in.x + off_in.y * off_in.y).sqrt().max(EPSILON);
            let len_out = (off_out.x * off_out.x + off_out.y * off_out.y).sqrt().max(EPSILON);
            let n_in = Point::new(off_in.x / len_in, off_in.y / len_in);
            let n_out = Point::new(off_out.x / len_out, off_out.y / len_out);
            let half = angle.abs() / 2.0;
            let sin_half = half.sin();
            if sin_half.abs() > EPSILON && 1.0 / sin_half > miter_limit {
                out.push(vertex + off_in);
                out.push(vertex + off_out);
                return;
            }
            let bis = Point::new(n_in.x + n_out.x, n_in.y + n_out.y);
            let bis_len = (bis.x * bis.x + bis.y * bis.y).sqrt();
            if bis_len < EPSILON {
                out.push(vertex + off_in);
                out.push(vertex + off_out);
                return;
            }
            let r = (len_in + len_out) * 0.5;
            let cos_half = half.cos().max(EPSILON);
            let dist = r / cos_half;
            out.push(Point::new(vertex.x + bis.x / bis_len * dist, vertex.y + bis.y / bis_len * dist));
        }
    }
}

/// Builds one offset side of a contour (spec §4.6). `side_sign` selects
/// `+1.0` (one side) or `-1.0` (the other); for open contours the returned
/// points run from `points[0]` to `points[last]` in original vertex order.
fn build_side(
    points: &[Point],
    closed: bool,
    wx: f64,
    wy: f64,
    join: Join,
    miter_limit: f64,
    side_sign: f64,
) -> Vec<Point> {
    let n = points.len();
    let edge_count = if closed { n } else { n - 1 };
    let mut dirs = Vec::with_capacity(edge_count);
    for i in 0..edge_count {
        let a = points[i];
        let b = points[(i + 1) % n];
        dirs.push(unit_dir(a, b).unwrap_or(Point::new(1.0, 0.0)));
    }

    let mut out = Vec::new();
    if !closed {
        out.push(points[0] + perp_offset(dirs[0], wx, wy) * side_sign);
        for i in 1..n - 1 {
            emit_join(&mut out, points[i], dirs[i - 1], dirs[i], wx, wy, side_sign, join, miter_limit);
        }
        out.push(points[n - 1] + perp_offset(dirs[edge_count - 1], wx, wy) * side_sign);
    } else {
        for i in 0..n {
            let d_in = dirs[(i + edge_count - 1) % edge_count];
            let d_out = dirs[i % edge_count];
            emit_join(&mut out, points[i], d_in, d_out, wx, wy, side_sign, join, miter_limit);
        }
    }
    out
}

/// Emits a round/square/butt cap connecting `from` to `to` around `center`,
/// with `tangent` pointing in the direction of travel past the endpoint
/// (spec §4.6).
fn emit_cap(path: &mut Path, center: Point, tangent: Point, from: Point, to: Point, cap: Cap, r: f64) {
    match cap {
        Cap::Butt => {
            path.line_to(to.x, to.y);
        }
        Cap::Square => {
            let ext = tangent * r;
            path.line_to(from.x + ext.x, from.y + ext.y);
            path.line_to(to.x + ext.x, to.y + ext.y);
            path.line_to(to.x, to.y);
        }
        Cap::Round => {
            // Two quadratics meeting at the cap's apex, each control point
            // pulled out along `tangent` by the Bézier circle-approximation
            // kappa (spec §4.6).
            let apex = center + tangent * r;
            let c1 = from + tangent * (r * ROUND_CAP_KAPPA);
            path.quad_to(c1.x, c1.y, apex.x, apex.y);
            let c2 = to + tangent * (r * ROUND_CAP_KAPPA);
            path.quad_to(c2.x, c2.y, to.x, to.y);
        }
    }
}

fn emit_closed_ring(out: &mut Path, points: &[Point]) {
    if points.is_empty() {
        return;
    }
    out.move_to(points[0].x, points[0].y);
    for p in &points[1..] {
        out.line_to(p.x, p.y);
    }
    out.close();
}

/// Strokes `path` with a uniform width (spec §4.6 "Uniform stroker"),
/// producing a filled outline path. A non-positive width is a domain
/// no-op (spec §7 "zero-area stroke") and yields an empty path.
pub fn stroke_path(path: &Path, opts: &StrokeOptions) -> Path {
    stroke_path_asymmetric(path, opts.width, opts.width, opts.join, opts.miter_limit, opts.cap, opts.flatten_eps)
}

/// Strokes `path` with independent X/Y border widths (spec §4.6
/// "Asymmetric stroker"). `cap` only matters for open contours.
#[allow(clippy::too_many_arguments)]
pub fn stroke_path_asymmetric(
    path: &Path,
    width_x: f64,
    width_y: f64,
    join: Join,
    miter_limit: f64,
    cap: Cap,
    flatten_eps: f64,
) -> Path {
    if width_x <= 0.0 || width_y <= 0.0 {
        return Path::new();
    }
    let wx = width_x / 2.0;
    let wy = width_y / 2.0;
    let contours = flatten_contours(path, flatten_eps);

    let mut out = Path::new();
    for (points, closed) in contours {
        if points.len() < 2 {
            continue;
        }
        if closed {
            let outer = build_side(&points, true, wx, wy, join, miter_limit, 1.0);
            let mut inner = build_side(&points, true, wx, wy, join, miter_limit, -1.0);
            inner.reverse();
            emit_closed_ring(&mut out, &outer);
            emit_closed_ring(&mut out, &inner);
        } else {
            let n = points.len();
            let side_pos = build_side(&points, false, wx, wy, join, miter_limit, 1.0);
            let side_neg = build_side(&points, false, wx, wy, join, miter_limit, -1.0);
            let end_tangent = unit_dir(points[n - 2], points[n - 1]).unwrap_or(Point::new(1.0, 0.0));
            let start_tangent = unit_dir(points[1], points[0]).unwrap_or(Point::new(-1.0, 0.0));
            let r = (wx + wy) * 0.5;

            out.move_to(side_pos[0].x, side_pos[0].y);
            for p in &side_pos[1..] {
                out.line_to(p.x, p.y);
            }
            emit_cap(&mut out, points[n - 1], end_tangent, *side_pos.last().unwrap(), side_neg[side_neg.len() - 1], cap, r);
            for p in side_neg[..side_neg.len() - 1].iter().rev() {
                out.line_to(p.x, p.y);
            }
            emit_cap(&mut out, points[0], start_tangent, side_neg[0], side_pos[0], cap, r);
            out.close();
        }
    }
    out
}

/// Applies `f` to every point of `path` (on-curve and control points
/// alike), preserving the exact command structure (spec §4.6 "All synth
/// operations preserve command structure").
fn map_path(path: &Path, f: impl Fn(Point) -> Point) -> Path {
    let commands = path
        .commands
        .iter()
        .map(|cmd| match *cmd {
            PathCommand::Move(p) => PathCommand::Move(f(p)),
            PathCommand::Line(p) => PathCommand::Line(f(p)),
            PathCommand::Quad(c1, p) => PathCommand::Quad(f(c1), f(p)),
            PathCommand::Cubic(c1, c2, p) => PathCommand::Cubic(f(c1), f(c2), f(p)),
            PathCommand::Close => PathCommand::Close,
        })
        .collect();
    Path { commands, bounds: None }
}

/// Shears every point by `slant * y` along X (spec §4.6 `oblique`). `slant`
/// is the tangent of the shear angle (`0.2 ≈ 12°`).
pub fn oblique_path(path: &Path, slant: f64) -> Path {
    map_path(path, |p| Point::new(p.x + slant * p.y, p.y))
}

/// Scales every point's X coordinate by `factor`, leaving Y untouched
/// (spec §4.6 `condense`).
pub fn condense_path(path: &Path, factor: f64) -> Path {
    map_path(path, |p| Point::new(p.x * factor, p.y))
}

/// General affine transform `(x', y') = (a*x + c*y + e, b*x + d*y + f)`
/// (spec §4.6 `transform`). If `path.bounds` is already known, the new
/// bounds are derived analytically from the transformed corners instead of
/// re-running C2.
pub fn transform_path(path: &Path, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Path {
    let apply = |p: Point| Point::new(a * p.x + c * p.y + e, b * p.x + d * p.y + f);
    let mut out = map_path(path, apply);
    if let Some(bb) = path.bounds {
        let corners = [
            Point::new(bb.x_min, bb.y_min),
            Point::new(bb.x_max, bb.y_min),
            Point::new(bb.x_max, bb.y_max),
            Point::new(bb.x_min, bb.y_max),
        ];
        let mut new_bounds = BoundingBox::point(apply(corners[0]));
        for corner in &corners[1..] {
            new_bounds.extend(apply(*corner));
        }
        out.bounds = Some(new_bounds);
    }
    out
}

fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    let mut area = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        area += a.x * b.y - b.x * a.y;
    }
    area * 0.5
}

/// Maximum per-vertex offset multiplier at acute corners, bounding spikes
/// (spec §4.6 `embolden`).
const EMBOLDEN_SPIKE_CAP: f64 = 3.0;

/// Approximates an outward contour offset via per-vertex averaged edge
/// normals (spec §4.6 `embolden`). Winding is derived from the signed area
/// so the offset sign is correct for both CW and CCW contours; a
/// zero-area (self-overlapping) contour is treated as CCW (open question,
/// see DESIGN.md).
pub fn embolden_path(path: &Path, strength: f64, flatten_eps: f64) -> Path {
    let contours = flatten_contours(path, flatten_eps);
    let mut out = Path::new();
    for (points, closed) in contours {
        let n = points.len();
        if n < 2 {
            continue;
        }
        if n < 3 {
            emit_open_polyline(&mut out, &points, closed);
            continue;
        }
        let winding = if signed_area(&points) >= 0.0 { 1.0 } else { -1.0 };
        let mut new_points = Vec::with_capacity(n);
        for i in 0..n {
            let prev_idx = if i == 0 { None } else { Some(i - 1) };
            let next_idx = if i + 1 == n { None } else { Some(i + 1) };
            let (prev_idx, next_idx) = if closed {
                (Some((i + n - 1) % n), Some((i + 1) % n))
            } else {
                (prev_idx, next_idx)
            };

            let d_in = prev_idx.and_then(|pi| unit_dir(points[pi], points[i]));
            let d_out = next_idx.and_then(|ni| unit_dir(points[i], points[ni]));

            let n_in = d_in.map(|d| Point::new(-d.y, d.x) * winding);
            let n_out = d_out.map(|d| Point::new(-d.y, d.x) * winding);

            let (normal, scale) = match (n_in, n_out) {
                (Some(a), Some(b)) => {
                    let avg = Point::new(a.x + b.x, a.y + b.y);
                    let len = (avg.x * avg.x + avg.y * avg.y).sqrt();
                    let cos_theta = (a.x * b.x + a.y * b.y).clamp(-1.0, 1.0);
                    let cos_half = ((1.0 + cos_theta) * 0.5).sqrt().max(EPSILON);
                    let scale = (1.0 / cos_half).min(EMBOLDEN_SPIKE_CAP);
                    if len < EPSILON {
                        (a, scale)
                    } else {
                        (Point::new(avg.x / len, avg.y / len), scale)
                    }
                }
                (Some(a), None) => (a, 1.0),
                (None, Some(b)) => (b, 1.0),
                (None, None) => (Point::new(0.0, 0.0), 1.0),
            };
            let offset = normal * (strength * scale);
            new_points.push(points[i] + offset);
        }
        emit_open_polyline(&mut out, &new_points, closed);
    }
    out
}

fn emit_open_polyline(out: &mut Path, points: &[Point], closed: bool) {
    if points.is_empty() {
        return;
    }
    out.move_to(points[0].x, points[0].y);
    for p in &points[1..] {
        out.line_to(p.x, p.y);
    }
    if closed {
        out.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizontal_line() -> Path {
        let mut p = Path::new();
        p.move_to(0.0, 0.0);
        p.line_to(100.0, 0.0);
        p
    }

    #[test]
    fn scenario_s5_stroke_expansion_butt_cap() {
        let path = horizontal_line();
        let opts = StrokeOptions { width: 10.0, cap: Cap::Butt, ..Default::default() };
        let stroked = stroke_path(&path, &opts);
        let bounds = crate::bounds::exact_bounds(&stroked).unwrap();
        assert!((bounds.x_min - 0.0).abs() < 1e-9);
        assert!((bounds.x_max - 100.0).abs() < 1e-9);
        assert!((bounds.y_min + 5.0).abs() < 1e-9);
        assert!((bounds.y_max - 5.0).abs() < 1e-9);
    }

    #[test]
    fn invariant_stroke_bounds_contain_original_expanded_by_half_width() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0);
        path.line_to(10.0, 0.0);
        path.line_to(10.0, 10.0);
        path.line_to(0.0, 10.0);
        path.close();
        let opts = StrokeOptions::new(4.0);
        let stroked = stroke_path(&path, &opts);
        let original_bounds = crate::bounds::exact_bounds(&path).unwrap();
        let stroked_bounds = crate::bounds::exact_bounds(&stroked).unwrap();
        let expanded = original_bounds.expand(2.0);
        assert!(stroked_bounds.contains(&expanded) || expanded.contains(&stroked_bounds));
    }

    #[test]
    fn zero_width_stroke_is_domain_noop() {
        let path = horizontal_line();
        let opts = StrokeOptions::new(0.0);
        let stroked = stroke_path(&path, &opts);
        assert!(stroked.is_empty());
    }

    #[test]
    fn scenario_7_zero_slant_oblique_is_pointwise_identity() {
        let mut path = Path::new();
        path.move_to(1.0, 2.0);
        path.quad_to(3.0, 4.0, 5.0, 6.0);
        let result = oblique_path(&path, 0.0);
        assert_eq!(result.commands, path.commands);
    }

    #[test]
    fn scenario_8_affine_round_trip_within_tolerance() {
        let mut path = Path::new();
        path.move_to(1.0, 2.0);
        path.line_to(3.0, -4.0);
        path.cubic_to(5.0, 6.0, 7.0, 8.0, 9.0, 10.0);

        // M = [[2,0],[0,3]], translate (5,-1); inverse undoes both.
        let transformed = transform_path(&path, 2.0, 0.0, 0.0, 3.0, 5.0, -1.0);
        let restored = transform_path(&transformed, 0.5, 0.0, 0.0, 1.0 / 3.0, -2.5, 1.0 / 3.0);

        for (a, b) in path.commands.iter().zip(restored.commands.iter()) {
            match (a, b) {
                (PathCommand::Move(p0), PathCommand::Move(p1))
                | (PathCommand::Line(p0), PathCommand::Line(p1)) => {
                    assert!((p0.x - p1.x).abs() < 1e-9);
                    assert!((p0.y - p1.y).abs() < 1e-9);
                }
                (PathCommand::Cubic(c1a, c2a, pa), PathCommand::Cubic(c1b, c2b, pb)) => {
                    assert!((c1a.x - c1b.x).abs() < 1e-9 && (c1a.y - c1b.y).abs() < 1e-9);
                    assert!((c2a.x - c2b.x).abs() < 1e-9 && (c2a.y - c2b.y).abs() < 1e-9);
                    assert!((pa.x - pb.x).abs() < 1e-9 && (pa.y - pb.y).abs() < 1e-9);
                }
                _ => panic!("command shape mismatch"),
            }
        }
    }

    #[test]
    fn condense_scales_x_only() {
        let mut path = Path::new();
        path.move_to(10.0, 20.0);
        let result = condense_path(&path, 0.5);
        match result.commands[0] {
            PathCommand::Move(p) => {
                assert!((p.x - 5.0).abs() < 1e-9);
                assert!((p.y - 20.0).abs() < 1e-9);
            }
            _ => panic!("expected Move"),
        }
    }

    #[test]
    fn embolden_expands_a_ccw_square_outward() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0);
        path.line_to(10.0, 0.0);
        path.line_to(10.0, 10.0);
        path.line_to(0.0, 10.0);
        path.close();
        let embossed = embolden_path(&path, 1.0, DEFAULT_FLATTEN_EPS);
        let bounds = crate::bounds::exact_bounds(&embossed).unwrap();
        let original = crate::bounds::exact_bounds(&path).unwrap();
        assert!(bounds.x_min < original.x_min);
        assert!(bounds.x_max > original.x_max);
        assert!(bounds.y_min < original.y_min);
        assert!(bounds.y_max > original.y_max);
    }
}

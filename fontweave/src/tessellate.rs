//! Triangulation of glyph outlines.
//!
//! Contours are flattened to polylines, grouped into outer rings and holes
//! by even-odd nesting, and each group is triangulated by ear clipping
//! after its holes have been bridged into the outer ring.

use kurbo::{BezPath, PathEl};

use crate::outline::Contour;

/// A mesh vertex in font units.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
}

impl Vertex {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

const EPSILON: f64 = 1e-9;

type Ring = Vec<kurbo::Point>;

/// Triangulate a set of closed contours.
///
/// Returns a flat list where each consecutive group of three vertices is a
/// counter-clockwise triangle. The result is deterministic for a given input.
pub fn tessellate(contours: &[Contour], tolerance: f64) -> Vec<Vertex> {
    let rings: Vec<Ring> = contours
        .iter()
        .filter_map(|contour| {
            let mut path = BezPath::new();
            contour.append_to_path(&mut path);
            flatten_ring(&path, tolerance)
        })
        .collect();
    let mut vertices = Vec::new();
    for (outer, holes) in group_rings(rings) {
        let polygon = bridge_holes(outer, holes);
        ear_clip(polygon, &mut vertices);
    }
    log::trace!("tessellated {} contours into {} triangles", contours.len(), vertices.len() / 3);
    vertices
}

/// Flatten a single closed subpath into a ring without repeated points.
fn flatten_ring(path: &BezPath, tolerance: f64) -> Option<Ring> {
    let mut ring: Ring = Vec::new();
    kurbo::flatten(path.iter(), tolerance, |el| match el {
        PathEl::MoveTo(p) | PathEl::LineTo(p) => {
            if ring.last() != Some(&p) {
                ring.push(p);
            }
        }
        _ => (),
    });
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    (ring.len() >= 3 && signed_area(&ring).abs() > EPSILON).then_some(ring)
}

/// Twice the signed area; positive for counter-clockwise rings.
fn signed_area(ring: &[kurbo::Point]) -> f64 {
    let mut area = 0.0;
    for (i, a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        area += a.x * b.y - b.x * a.y;
    }
    area
}

fn contains_point(ring: &[kurbo::Point], point: kurbo::Point) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for (i, a) in ring.iter().enumerate() {
        let b = ring[j];
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Pair each outer ring with the holes directly inside it.
///
/// A ring enclosed by an even number of others is an outer ring, otherwise a
/// hole. Outer rings are made counter-clockwise and holes clockwise.
fn group_rings(rings: Vec<Ring>) -> Vec<(Ring, Vec<Ring>)> {
    let enclosing: Vec<Vec<usize>> = rings
        .iter()
        .enumerate()
        .map(|(i, ring)| {
            (0..rings.len())
                .filter(|&j| j != i && contains_point(&rings[j], ring[0]))
                .collect()
        })
        .collect();
    let depth = |i: usize| enclosing[i].len();
    let mut groups: Vec<(usize, Ring, Vec<Ring>)> = Vec::new();
    let mut holes: Vec<(usize, Ring)> = Vec::new();
    for (i, mut ring) in rings.into_iter().enumerate() {
        let is_outer = depth(i) % 2 == 0;
        if (signed_area(&ring) > 0.0) != is_outer {
            ring.reverse();
        }
        if is_outer {
            groups.push((i, ring, Vec::new()));
        } else {
            holes.push((i, ring));
        }
    }
    for (i, hole) in holes {
        // the innermost enclosing ring is the deepest one
        let parent = enclosing[i].iter().copied().max_by_key(|&j| depth(j));
        if let Some(group) = parent.and_then(|p| groups.iter_mut().find(|g| g.0 == p)) {
            group.2.push(hole);
        }
    }
    groups
        .into_iter()
        .map(|(_, outer, holes)| (outer, holes))
        .collect()
}

/// Join holes to the outer ring with zero-width bridges, producing a single
/// counter-clockwise polygon.
fn bridge_holes(outer: Ring, mut holes: Vec<Ring>) -> Ring {
    // rightmost holes first so that later bridges never cross earlier ones
    holes.sort_by(|a, b| max_x(b).total_cmp(&max_x(a)));
    let mut polygon = outer;
    for (n, hole) in holes.iter().enumerate() {
        let Some(hole_ix) = (0..hole.len()).max_by(|&a, &b| hole[a].x.total_cmp(&hole[b].x))
        else {
            continue;
        };
        let from = hole[hole_ix];
        let remaining = &holes[n + 1..];
        let candidate = (0..polygon.len())
            .filter(|&i| {
                let to = polygon[i];
                !crosses_any(from, to, &polygon)
                    && !crosses_any(from, to, hole)
                    && remaining.iter().all(|h| !crosses_any(from, to, h))
            })
            .min_by(|&a, &b| {
                (polygon[a] - from)
                    .hypot2()
                    .total_cmp(&(polygon[b] - from).hypot2())
            });
        let Some(poly_ix) = candidate else {
            log::debug!("no visible bridge for hole, skipping");
            continue;
        };
        let mut joined = Vec::with_capacity(polygon.len() + hole.len() + 2);
        joined.extend_from_slice(&polygon[..=poly_ix]);
        joined.extend_from_slice(&hole[hole_ix..]);
        joined.extend_from_slice(&hole[..=hole_ix]);
        joined.extend_from_slice(&polygon[poly_ix..]);
        polygon = joined;
    }
    polygon
}

fn max_x(ring: &Ring) -> f64 {
    ring.iter().map(|p| p.x).fold(f64::MIN, f64::max)
}

/// `true` if segment `a`-`b` properly crosses an edge of `ring`.
///
/// Edges sharing an endpoint with the segment are ignored.
fn crosses_any(a: kurbo::Point, b: kurbo::Point, ring: &[kurbo::Point]) -> bool {
    (0..ring.len()).any(|i| {
        let c = ring[i];
        let d = ring[(i + 1) % ring.len()];
        if c == a || c == b || d == a || d == b {
            return false;
        }
        segments_intersect(a, b, c, d)
    })
}

fn cross(o: kurbo::Point, a: kurbo::Point, b: kurbo::Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn segments_intersect(a: kurbo::Point, b: kurbo::Point, c: kurbo::Point, d: kurbo::Point) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    let on_segment = |p: kurbo::Point, q: kurbo::Point, r: kurbo::Point| {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };
    (d1 == 0.0 && on_segment(c, d, a))
        || (d2 == 0.0 && on_segment(c, d, b))
        || (d3 == 0.0 && on_segment(a, b, c))
        || (d4 == 0.0 && on_segment(a, b, d))
}

fn point_in_triangle(p: kurbo::Point, a: kurbo::Point, b: kurbo::Point, c: kurbo::Point) -> bool {
    cross(a, b, p) >= 0.0 && cross(b, c, p) >= 0.0 && cross(c, a, p) >= 0.0
}

/// Ear clipping for a counter-clockwise polygon that may contain bridges.
fn ear_clip(polygon: Ring, out: &mut Vec<Vertex>) {
    let mut indices: Vec<usize> = (0..polygon.len()).collect();
    let vertex = |p: kurbo::Point| Vertex::new(p.x as f32, p.y as f32);
    while indices.len() > 3 {
        let len = indices.len();
        let mut clipped = false;
        for i in 0..len {
            let prev = polygon[indices[(i + len - 1) % len]];
            let curr = polygon[indices[i]];
            let next = polygon[indices[(i + 1) % len]];
            let turn = cross(prev, curr, next);
            if turn.abs() <= EPSILON {
                // collinear or a bridge spike; drop without emitting
                indices.remove(i);
                clipped = true;
                break;
            }
            if turn < 0.0 {
                continue;
            }
            let blocked = indices.iter().any(|&j| {
                let p = polygon[j];
                p != prev && p != curr && p != next && point_in_triangle(p, prev, curr, next)
            });
            if !blocked {
                out.extend([vertex(prev), vertex(curr), vertex(next)]);
                indices.remove(i);
                clipped = true;
                break;
            }
        }
        if !clipped {
            log::debug!("ear clipping stalled with {} vertices remaining", indices.len());
            return;
        }
    }
    if let [a, b, c] = indices[..] {
        if cross(polygon[a], polygon[b], polygon[c]) > EPSILON {
            out.extend([vertex(polygon[a]), vertex(polygon[b]), vertex(polygon[c])]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::ContourPoint;

    fn polygon(points: &[(f32, f32)]) -> Contour {
        Contour::new(
            points
                .iter()
                .map(|&(x, y)| ContourPoint::new(x, y, true))
                .collect(),
        )
    }

    fn mesh_area(mesh: &[Vertex]) -> f64 {
        mesh.chunks_exact(3)
            .map(|tri| {
                let [a, b, c] = [tri[0], tri[1], tri[2]];
                ((b.x - a.x) as f64 * (c.y - a.y) as f64 - (b.y - a.y) as f64 * (c.x - a.x) as f64)
                    / 2.0
            })
            .sum()
    }

    fn assert_ccw(mesh: &[Vertex]) {
        for tri in mesh.chunks_exact(3) {
            let area = (tri[1].x - tri[0].x) * (tri[2].y - tri[0].y)
                - (tri[1].y - tri[0].y) * (tri[2].x - tri[0].x);
            assert!(area > 0.0, "triangle {tri:?} is not counter-clockwise");
        }
    }

    #[test]
    fn clockwise_square() {
        let square = polygon(&[(0.0, 0.0), (0.0, 100.0), (100.0, 100.0), (100.0, 0.0)]);
        let mesh = tessellate(&[square], 0.25);
        assert_eq!(mesh.len(), 6);
        assert_ccw(&mesh);
        assert!((mesh_area(&mesh) - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn concave_polygon() {
        // an "L" shape
        let l_shape = polygon(&[
            (0.0, 0.0),
            (100.0, 0.0),
            (100.0, 20.0),
            (20.0, 20.0),
            (20.0, 100.0),
            (0.0, 100.0),
        ]);
        let mesh = tessellate(&[l_shape], 0.25);
        assert_eq!(mesh.len(), 12);
        assert_ccw(&mesh);
        assert!((mesh_area(&mesh) - 3_600.0).abs() < 1e-6);
    }

    #[test]
    fn square_with_hole() {
        let outer = polygon(&[(0.0, 0.0), (0.0, 100.0), (100.0, 100.0), (100.0, 0.0)]);
        let hole = polygon(&[(25.0, 25.0), (75.0, 25.0), (75.0, 75.0), (25.0, 75.0)]);
        let mesh = tessellate(&[outer, hole], 0.25);
        assert_ccw(&mesh);
        assert!((mesh_area(&mesh) - 7_500.0).abs() < 1e-6);
    }

    #[test]
    fn island_inside_hole() {
        let outer = polygon(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)]);
        let hole = polygon(&[(10.0, 10.0), (90.0, 10.0), (90.0, 90.0), (10.0, 90.0)]);
        let island = polygon(&[(40.0, 40.0), (60.0, 40.0), (60.0, 60.0), (40.0, 60.0)]);
        let mesh = tessellate(&[outer, hole, island], 0.25);
        assert_ccw(&mesh);
        assert!((mesh_area(&mesh) - (10_000.0 - 6_400.0 + 400.0)).abs() < 1e-6);
    }

    #[test]
    fn curves_are_flattened() {
        // a circle-like shape built from four quadratic arcs
        let circle = Contour::new(vec![
            ContourPoint::new(100.0, 0.0, true),
            ContourPoint::new(100.0, 100.0, false),
            ContourPoint::new(0.0, 100.0, true),
            ContourPoint::new(-100.0, 100.0, false),
            ContourPoint::new(-100.0, 0.0, true),
            ContourPoint::new(-100.0, -100.0, false),
            ContourPoint::new(0.0, -100.0, true),
            ContourPoint::new(100.0, -100.0, false),
        ]);
        let coarse = tessellate(std::slice::from_ref(&circle), 10.0);
        let fine = tessellate(std::slice::from_ref(&circle), 0.1);
        assert!(fine.len() > coarse.len());
        assert_ccw(&fine);
        // a parabolic segment covers 2/3 of its control triangle
        let expected = 20_000.0 + 4.0 * (2.0 / 3.0) * 5_000.0;
        assert!((mesh_area(&fine) - expected).abs() < expected * 0.01);
    }

    #[test]
    fn degenerate_contours_are_skipped() {
        let line = polygon(&[(0.0, 0.0), (50.0, 0.0), (100.0, 0.0)]);
        let point = polygon(&[(5.0, 5.0)]);
        assert!(tessellate(&[line, point], 0.25).is_empty());
    }

    #[test]
    fn deterministic() {
        let outer = polygon(&[(0.0, 0.0), (0.0, 100.0), (100.0, 100.0), (100.0, 0.0)]);
        let hole = polygon(&[(25.0, 25.0), (75.0, 25.0), (75.0, 75.0), (25.0, 75.0)]);
        let contours = [outer, hole];
        assert_eq!(tessellate(&contours, 0.25), tessellate(&contours, 0.25));
    }
}

//! Resolved glyph outlines.
//!
//! Composite glyphs are flattened into the contours of their components at
//! load time, so every [`GlyphOutline`] is a self-contained list of
//! quadratic contours in font units.

use std::sync::OnceLock;

use kurbo::BezPath;
use types::{BoundingBox, GlyphId, Point};

use crate::{
    read::ReadError,
    tables::{
        glyf::{Anchor, Component, CompositeGlyphFlags, Glyf, Glyph, Transform},
        loca::Loca,
    },
    tessellate::{self, Vertex},
};

/// Errors that may occur when resolving a glyph outline.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OutlineError {
    #[error("glyph {0} is not present in the loca table")]
    GlyphNotFound(GlyphId),
    #[error("composite recursion limit ({limit}) exceeded at component {glyph}")]
    RecursionLimitExceeded { glyph: GlyphId, limit: usize },
    #[error("invalid anchor point index ({1}) for composite glyph {0}")]
    InvalidAnchorPoint(GlyphId, u16),
    #[error("malformed data for glyph {0}: {1}")]
    Read(GlyphId, ReadError),
}

/// A point in a resolved contour.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContourPoint {
    pub point: Point<f32>,
    pub on_curve: bool,
}

impl ContourPoint {
    pub fn new(x: f32, y: f32, on_curve: bool) -> Self {
        Self {
            point: Point::new(x, y),
            on_curve,
        }
    }
}

/// A closed sequence of on and off-curve points.
///
/// The last point implicitly connects back to the first.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contour {
    points: Vec<ContourPoint>,
}

impl Contour {
    pub fn new(points: Vec<ContourPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[ContourPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append this contour to a path, converting implied on-curve points.
    pub fn append_to_path(&self, path: &mut BezPath) {
        let points = &self.points;
        let Some(first_on) = points.iter().position(|p| p.on_curve) else {
            // all points off-curve: start at the midpoint of the first two
            let Some(first) = points.first() else {
                return;
            };
            let last = points[points.len() - 1];
            let start = last.point.midpoint(first.point);
            path.move_to(to_kurbo(start));
            emit_segments(path, points.iter().copied(), start);
            path.close_path();
            return;
        };
        let start = points[first_on].point;
        path.move_to(to_kurbo(start));
        let rotated = points[first_on + 1..]
            .iter()
            .chain(&points[..first_on])
            .copied();
        emit_segments(path, rotated, start);
        path.close_path();
    }
}

fn emit_segments(path: &mut BezPath, points: impl Iterator<Item = ContourPoint>, start: Point<f32>) {
    let mut pending_control: Option<Point<f32>> = None;
    for point in points {
        match (pending_control, point.on_curve) {
            (None, true) => path.line_to(to_kurbo(point.point)),
            (None, false) => pending_control = Some(point.point),
            (Some(control), true) => {
                path.quad_to(to_kurbo(control), to_kurbo(point.point));
                pending_control = None;
            }
            (Some(control), false) => {
                let implied = control.midpoint(point.point);
                path.quad_to(to_kurbo(control), to_kurbo(implied));
                pending_control = Some(point.point);
            }
        }
    }
    if let Some(control) = pending_control {
        path.quad_to(to_kurbo(control), to_kurbo(start));
    }
}

fn to_kurbo(point: Point<f32>) -> kurbo::Point {
    kurbo::Point::new(point.x as f64, point.y as f64)
}

/// The outline and horizontal metrics for one glyph.
#[derive(Clone, Debug)]
pub struct GlyphOutline {
    advance_width: u16,
    left_side_bearing: i16,
    valid: bool,
    contours: Vec<Contour>,
    tolerance: f64,
    mesh: OnceLock<Vec<Vertex>>,
}

impl GlyphOutline {
    pub(crate) fn new(
        advance_width: u16,
        left_side_bearing: i16,
        contours: Vec<Contour>,
        tolerance: f64,
    ) -> Self {
        Self {
            advance_width,
            left_side_bearing,
            valid: true,
            contours,
            tolerance,
            mesh: OnceLock::new(),
        }
    }

    /// An outline for a glyph whose data could not be loaded.
    pub(crate) const fn invalid(advance_width: u16, left_side_bearing: i16) -> Self {
        Self {
            advance_width,
            left_side_bearing,
            valid: false,
            contours: Vec::new(),
            tolerance: 0.0,
            mesh: OnceLock::new(),
        }
    }

    pub fn advance_width(&self) -> u16 {
        self.advance_width
    }

    pub fn left_side_bearing(&self) -> i16 {
        self.left_side_bearing
    }

    /// `false` if the glyph's source data could not be parsed.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// `true` if there is nothing to draw, as for a space.
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    /// The bounds of all points, including off-curve points.
    pub fn bbox(&self) -> Option<BoundingBox<f32>> {
        BoundingBox::from_points(
            self.contours
                .iter()
                .flat_map(|c| c.points())
                .map(|p| p.point),
        )
    }

    /// Convert the outline to a path.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        for contour in &self.contours {
            contour.append_to_path(&mut path);
        }
        path
    }

    /// The triangulated outline, as a flat list where every three vertices
    /// form a triangle.
    ///
    /// Computed on first use and cached; invalid outlines always produce an
    /// empty mesh.
    pub fn mesh(&self) -> &[Vertex] {
        self.mesh.get_or_init(|| {
            if !self.valid || self.contours.is_empty() {
                return Vec::new();
            }
            tessellate::tessellate(&self.contours, self.tolerance)
        })
    }

    /// The mesh as raw bytes, suitable for upload to a vertex buffer.
    pub fn mesh_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.mesh())
    }

    /// `true` if the mesh has already been computed.
    pub fn is_tessellated(&self) -> bool {
        self.mesh.get().is_some()
    }
}

/// The state of a glyph in the resolution cache.
#[derive(Clone, Debug)]
enum Resolution {
    Unvisited,
    /// Resolved successfully; `height` is the composite nesting depth needed.
    Resolved { height: usize, contours: Vec<Contour> },
    /// Needs more nesting depth than `remaining`.
    TooDeep { remaining: usize },
    Failed(OutlineError),
}

/// Resolves glyphs, including nested composites, into contour lists.
///
/// Results are cached per glyph along with the nesting depth they require,
/// so shared components are parsed once and cycles fail quickly.
pub(crate) struct OutlineLoader<'a> {
    glyf: Glyf<'a>,
    loca: &'a Loca,
    max_depth: usize,
    cache: Vec<Resolution>,
}

impl<'a> OutlineLoader<'a> {
    pub(crate) fn new(glyf: Glyf<'a>, loca: &'a Loca, max_depth: usize) -> Self {
        Self {
            glyf,
            loca,
            max_depth,
            cache: vec![Resolution::Unvisited; loca.len()],
        }
    }

    /// Load the fully resolved contours for a glyph.
    pub(crate) fn load(&mut self, gid: GlyphId) -> Result<Vec<Contour>, OutlineError> {
        self.resolve(gid, self.max_depth).map(|(_, contours)| contours)
    }

    /// Resolve a glyph allowing at most `remaining_depth` levels of
    /// composite nesting beneath it.
    fn resolve(
        &mut self,
        gid: GlyphId,
        remaining_depth: usize,
    ) -> Result<(usize, Vec<Contour>), OutlineError> {
        let idx = gid.to_u16() as usize;
        let recursion_error = OutlineError::RecursionLimitExceeded {
            glyph: gid,
            limit: self.max_depth,
        };
        match self.cache.get(idx) {
            None => return Err(OutlineError::GlyphNotFound(gid)),
            Some(Resolution::Resolved { height, contours }) => {
                return if *height <= remaining_depth {
                    Ok((*height, contours.clone()))
                } else {
                    Err(recursion_error)
                };
            }
            Some(Resolution::TooDeep { remaining }) if remaining_depth <= *remaining => {
                return Err(recursion_error);
            }
            Some(Resolution::Failed(err)) => return Err(err.clone()),
            _ => (),
        }
        let result = self.resolve_uncached(gid, remaining_depth);
        self.cache[idx] = match &result {
            Ok((height, contours)) => Resolution::Resolved {
                height: *height,
                contours: contours.clone(),
            },
            Err(OutlineError::RecursionLimitExceeded { .. }) => Resolution::TooDeep {
                remaining: remaining_depth,
            },
            Err(err) => Resolution::Failed(err.clone()),
        };
        result
    }

    fn resolve_uncached(
        &mut self,
        gid: GlyphId,
        remaining_depth: usize,
    ) -> Result<(usize, Vec<Contour>), OutlineError> {
        let range = self
            .loca
            .glyph_range(gid)
            .ok_or(OutlineError::GlyphNotFound(gid))?;
        let glyph = self
            .glyf
            .glyph(range)
            .map_err(|e| OutlineError::Read(gid, e))?;
        match glyph {
            None => Ok((0, Vec::new())),
            Some(Glyph::Simple(simple)) => {
                let contours = simple
                    .contours()
                    .map(|points| {
                        Contour::new(
                            points
                                .iter()
                                .map(|p| ContourPoint::new(p.x as f32, p.y as f32, p.on_curve))
                                .collect(),
                        )
                    })
                    .collect();
                Ok((0, contours))
            }
            Some(Glyph::Composite(composite)) => {
                if remaining_depth == 0 {
                    return Err(OutlineError::RecursionLimitExceeded {
                        glyph: gid,
                        limit: self.max_depth,
                    });
                }
                let mut height = 0;
                let mut contours: Vec<Contour> = Vec::new();
                for component in &composite.components {
                    let (child_height, child) =
                        self.resolve(component.glyph, remaining_depth - 1)?;
                    height = height.max(child_height + 1);
                    let placed = place_component(gid, component, &contours, child)?;
                    contours.extend(placed);
                }
                Ok((height, contours))
            }
        }
    }
}

/// Transform a component's contours and move them to their anchor.
fn place_component(
    gid: GlyphId,
    component: &Component,
    base: &[Contour],
    mut child: Vec<Contour>,
) -> Result<Vec<Contour>, OutlineError> {
    let transform = &component.transform;
    if !transform.is_identity() {
        for point in child.iter_mut().flat_map(|c| c.points.iter_mut()) {
            point.point = apply(transform, point.point);
        }
    }
    let offset = match component.anchor {
        Anchor::Offset { x, y } => {
            let mut offset = Point::new(x as f32, y as f32);
            let scaled = component
                .flags
                .contains(CompositeGlyphFlags::SCALED_COMPONENT_OFFSET)
                && !component
                    .flags
                    .contains(CompositeGlyphFlags::UNSCALED_COMPONENT_OFFSET);
            if scaled && !transform.is_identity() {
                let x_scale = transform.xx.to_f32().hypot(transform.xy.to_f32());
                let y_scale = transform.yy.to_f32().hypot(transform.yx.to_f32());
                offset = Point::new(offset.x * x_scale, offset.y * y_scale);
            }
            offset
        }
        Anchor::Point {
            base: base_ix,
            component: component_ix,
        } => {
            let base_point = nth_point(base, base_ix as usize)
                .ok_or(OutlineError::InvalidAnchorPoint(gid, base_ix))?;
            let component_point = nth_point(&child, component_ix as usize)
                .ok_or(OutlineError::InvalidAnchorPoint(gid, component_ix))?;
            base_point - component_point
        }
    };
    if offset != Point::default() {
        for point in child.iter_mut().flat_map(|c| c.points.iter_mut()) {
            point.point += offset;
        }
    }
    Ok(child)
}

fn apply(transform: &Transform, point: Point<f32>) -> Point<f32> {
    let (xx, yx, xy, yy) = (
        transform.xx.to_f32(),
        transform.yx.to_f32(),
        transform.xy.to_f32(),
        transform.yy.to_f32(),
    );
    Point::new(point.x * xx + point.y * xy, point.x * yx + point.y * yy)
}

fn nth_point(contours: &[Contour], index: usize) -> Option<Point<f32>> {
    contours
        .iter()
        .flat_map(|c| c.points())
        .nth(index)
        .map(|p| p.point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_data::FontData;
    use fontweave_test_data::glyf::{self as test_data, ComponentSpec};
    use pretty_assertions::assert_eq;

    const TRIANGLE: &[&[(i16, i16, bool)]] = &[&[(0, 0, true), (100, 0, true), (50, 100, true)]];

    fn with_loader<R>(glyphs: &[Vec<u8>], max_depth: usize, f: impl FnOnce(OutlineLoader) -> R) -> R {
        let (glyf, loca) = test_data::glyf_and_loca(glyphs);
        let loca = Loca::read(FontData::new(&loca), true, glyphs.len() as u16).unwrap();
        let loader = OutlineLoader::new(Glyf::new(FontData::new(&glyf)), &loca, max_depth);
        f(loader)
    }

    fn on_curve_points(contours: &[Contour]) -> Vec<(f32, f32)> {
        contours
            .iter()
            .flat_map(|c| c.points())
            .map(|p| (p.point.x, p.point.y))
            .collect()
    }

    #[test]
    fn offset_and_scaled_components() {
        let glyphs = vec![
            test_data::simple_glyph(TRIANGLE),
            test_data::composite_glyph(&[
                ComponentSpec::offset(0, 0, 0),
                ComponentSpec::offset(0, 200, 10).with_scale(0.5),
            ]),
        ];
        with_loader(&glyphs, 32, |mut loader| {
            let contours = loader.load(GlyphId::new(1)).unwrap();
            assert_eq!(contours.len(), 2);
            assert_eq!(
                on_curve_points(&contours),
                vec![
                    (0.0, 0.0),
                    (100.0, 0.0),
                    (50.0, 100.0),
                    (200.0, 10.0),
                    (250.0, 10.0),
                    (225.0, 60.0),
                ]
            );
        });
    }

    #[test]
    fn scaled_component_offset() {
        let glyphs = vec![
            test_data::simple_glyph(TRIANGLE),
            test_data::composite_glyph(&[ComponentSpec::offset(0, 100, 100)
                .with_scale(0.5)
                .with_scaled_offset()]),
        ];
        with_loader(&glyphs, 32, |mut loader| {
            let contours = loader.load(GlyphId::new(1)).unwrap();
            assert_eq!(contours[0].points()[0].point, Point::new(50.0, 50.0));
        });
    }

    #[test]
    fn two_by_two_rotation() {
        let glyphs = vec![
            test_data::simple_glyph(TRIANGLE),
            // rotate 90 degrees counter-clockwise
            test_data::composite_glyph(&[
                ComponentSpec::offset(0, 0, 0).with_two_by_two([0.0, 1.0, -1.0, 0.0])
            ]),
        ];
        with_loader(&glyphs, 32, |mut loader| {
            let contours = loader.load(GlyphId::new(1)).unwrap();
            assert_eq!(
                on_curve_points(&contours),
                vec![(0.0, 0.0), (0.0, 100.0), (-100.0, 50.0)]
            );
        });
    }

    #[test]
    fn point_matched_anchor() {
        let glyphs = vec![
            test_data::simple_glyph(TRIANGLE),
            // align point 0 of the second triangle with point 2 of the first
            test_data::composite_glyph(&[
                ComponentSpec::offset(0, 0, 0),
                ComponentSpec::point(0, 2, 0),
            ]),
            test_data::composite_glyph(&[
                ComponentSpec::offset(0, 0, 0),
                ComponentSpec::point(0, 9, 0),
            ]),
        ];
        with_loader(&glyphs, 32, |mut loader| {
            let contours = loader.load(GlyphId::new(1)).unwrap();
            assert_eq!(contours[1].points()[0].point, Point::new(50.0, 100.0));
            assert_eq!(contours[1].points()[1].point, Point::new(150.0, 100.0));
            assert_eq!(
                loader.load(GlyphId::new(2)),
                Err(OutlineError::InvalidAnchorPoint(GlyphId::new(2), 9))
            );
        });
    }

    #[test]
    fn self_reference_exceeds_recursion_limit() {
        let glyphs = vec![
            test_data::simple_glyph(TRIANGLE),
            test_data::composite_glyph(&[
                ComponentSpec::offset(1, 0, 0),
                ComponentSpec::offset(1, 10, 0),
            ]),
        ];
        with_loader(&glyphs, 32, |mut loader| {
            assert!(matches!(
                loader.load(GlyphId::new(1)),
                Err(OutlineError::RecursionLimitExceeded { limit: 32, .. })
            ));
            // unaffected
            assert_eq!(loader.load(GlyphId::new(0)).unwrap().len(), 1);
        });
    }

    #[test]
    fn nesting_depth_is_bounded() {
        // 3 -> 2 -> 1 -> 0, three levels of composite nesting
        let glyphs = vec![
            test_data::simple_glyph(TRIANGLE),
            test_data::composite_glyph(&[ComponentSpec::offset(0, 1, 0)]),
            test_data::composite_glyph(&[ComponentSpec::offset(1, 1, 0)]),
            test_data::composite_glyph(&[ComponentSpec::offset(2, 1, 0)]),
        ];
        with_loader(&glyphs, 2, |mut loader| {
            // resolving 2 first caches it with its height
            assert!(loader.load(GlyphId::new(2)).is_ok());
            assert!(matches!(
                loader.load(GlyphId::new(3)),
                Err(OutlineError::RecursionLimitExceeded { .. })
            ));
        });
        with_loader(&glyphs, 3, |mut loader| {
            let contours = loader.load(GlyphId::new(3)).unwrap();
            assert_eq!(contours[0].points()[0].point, Point::new(3.0, 0.0));
        });
    }

    #[test]
    fn missing_component() {
        let glyphs = vec![test_data::composite_glyph(&[ComponentSpec::offset(7, 0, 0)])];
        with_loader(&glyphs, 32, |mut loader| {
            assert_eq!(
                loader.load(GlyphId::new(0)),
                Err(OutlineError::GlyphNotFound(GlyphId::new(7)))
            );
        });
    }

    #[test]
    fn path_with_implied_points() {
        let contour = Contour::new(vec![
            ContourPoint::new(0.0, 0.0, false),
            ContourPoint::new(10.0, 0.0, true),
            ContourPoint::new(10.0, 10.0, false),
            ContourPoint::new(0.0, 10.0, false),
        ]);
        let mut path = BezPath::new();
        contour.append_to_path(&mut path);
        assert_eq!(path.to_svg(), "M10,0 Q10,10 5,10 Q0,10 0,5 Q0,0 10,0 Z");
    }

    #[test]
    fn path_all_off_curve() {
        let contour = Contour::new(vec![
            ContourPoint::new(0.0, 0.0, false),
            ContourPoint::new(10.0, 0.0, false),
            ContourPoint::new(10.0, 10.0, false),
            ContourPoint::new(0.0, 10.0, false),
        ]);
        let mut path = BezPath::new();
        contour.append_to_path(&mut path);
        assert_eq!(
            path.to_svg(),
            "M0,5 Q0,0 5,0 Q10,0 10,5 Q10,10 5,10 Q0,10 0,5 Z"
        );
    }

    #[test]
    fn invalid_outline_has_empty_mesh() {
        let outline = GlyphOutline::invalid(500, 0);
        assert!(!outline.is_valid());
        assert!(outline.mesh().is_empty());
        assert!(outline.bbox().is_none());
    }
}

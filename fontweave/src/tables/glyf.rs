//! The [glyf (Glyph Data)](https://docs.microsoft.com/en-us/typography/opentype/spec/glyf) table

use std::ops::Range;

use types::{BoundingBox, F2Dot14, GlyphId, Tag};

use crate::{
    font_data::{Cursor, FontData},
    read::{FontRead, ReadError},
};

/// 'glyf'
pub const TAG: Tag = Tag::new(b"glyf");

/// The glyph data table.
///
/// Glyphs are located with offsets from the `loca` table.
#[derive(Clone, Copy, Debug)]
pub struct Glyf<'a> {
    data: FontData<'a>,
}

impl<'a> Glyf<'a> {
    pub fn new(data: FontData<'a>) -> Self {
        Self { data }
    }

    /// Parse the glyph occupying `range`.
    ///
    /// Returns `Ok(None)` for an empty range, which describes a glyph with
    /// no outline.
    pub fn glyph(&self, range: Range<usize>) -> Result<Option<Glyph>, ReadError> {
        if range.start == range.end && range.start <= self.data.len() {
            return Ok(None);
        }
        if range.start >= self.data.len() {
            return Err(ReadError::OutOfBounds);
        }
        let data = self.data.slice(range).ok_or(ReadError::OutOfBounds)?;
        Glyph::read(data).map(Some)
    }
}

/// A parsed glyph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Glyph {
    Simple(SimpleGlyph),
    Composite(CompositeGlyph),
}

impl FontRead<'_> for Glyph {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let number_of_contours: i16 = cursor.read()?;
        let bbox = BoundingBox {
            x_min: cursor.read()?,
            y_min: cursor.read()?,
            x_max: cursor.read()?,
            y_max: cursor.read()?,
        };
        if number_of_contours >= 0 {
            SimpleGlyph::read(cursor, number_of_contours as usize, bbox).map(Glyph::Simple)
        } else {
            CompositeGlyph::read(cursor, bbox).map(Glyph::Composite)
        }
    }
}

/// Point with an associated on-curve flag in a simple glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurvePoint {
    /// X coordinate.
    pub x: i16,
    /// Y coordinate.
    pub y: i16,
    /// True if this is an on-curve point.
    pub on_curve: bool,
}

impl CurvePoint {
    pub fn new(x: i16, y: i16, on_curve: bool) -> Self {
        Self { x, y, on_curve }
    }

    /// Convenience method to construct an on-curve point
    pub fn on_curve(x: i16, y: i16) -> Self {
        Self::new(x, y, true)
    }

    /// Convenience method to construct an off-curve point
    pub fn off_curve(x: i16, y: i16) -> Self {
        Self::new(x, y, false)
    }
}

/// Flags for points of a simple glyph.
mod point_flags {
    pub const ON_CURVE_POINT: u8 = 0x01;
    pub const X_SHORT_VECTOR: u8 = 0x02;
    pub const Y_SHORT_VECTOR: u8 = 0x04;
    pub const REPEAT_FLAG: u8 = 0x08;
    pub const X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR: u8 = 0x10;
    pub const Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR: u8 = 0x20;
}

/// A glyph described by its own contours.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimpleGlyph {
    pub bbox: BoundingBox<i16>,
    /// Index of the last point of each contour.
    pub end_pts_of_contours: Vec<u16>,
    pub points: Vec<CurvePoint>,
}

impl SimpleGlyph {
    fn read(
        mut cursor: Cursor,
        number_of_contours: usize,
        bbox: BoundingBox<i16>,
    ) -> Result<Self, ReadError> {
        let end_pts_of_contours: Vec<u16> = cursor.read_array(number_of_contours)?;
        if end_pts_of_contours.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ReadError::MalformedData("contour end points are not ascending"));
        }
        let n_points = end_pts_of_contours
            .last()
            .map(|last| *last as usize + 1)
            .unwrap_or(0);
        let instruction_length: u16 = cursor.read()?;
        cursor.advance_by(instruction_length as usize);

        let mut flags = Vec::with_capacity(n_points);
        while flags.len() < n_points {
            let flag: u8 = cursor.read()?;
            let count = if flag & point_flags::REPEAT_FLAG != 0 {
                (cursor.read::<u8>()? as usize + 1).min(n_points - flags.len())
            } else {
                1
            };
            flags.extend(std::iter::repeat(flag).take(count));
        }

        let xs = read_coordinates(
            &mut cursor,
            &flags,
            point_flags::X_SHORT_VECTOR,
            point_flags::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR,
        )?;
        let ys = read_coordinates(
            &mut cursor,
            &flags,
            point_flags::Y_SHORT_VECTOR,
            point_flags::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR,
        )?;
        let points = flags
            .iter()
            .zip(xs.into_iter().zip(ys))
            .map(|(flag, (x, y))| CurvePoint::new(x, y, flag & point_flags::ON_CURVE_POINT != 0))
            .collect();
        Ok(SimpleGlyph {
            bbox,
            end_pts_of_contours,
            points,
        })
    }

    /// Returns the points of each contour, in order.
    pub fn contours(&self) -> impl Iterator<Item = &[CurvePoint]> + '_ {
        let mut start = 0;
        self.end_pts_of_contours.iter().map(move |end| {
            let end = *end as usize + 1;
            let contour = &self.points[start..end];
            start = end;
            contour
        })
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }
}

fn read_coordinates(
    cursor: &mut Cursor,
    flags: &[u8],
    short_bit: u8,
    same_or_positive_bit: u8,
) -> Result<Vec<i16>, ReadError> {
    let mut value = 0i16;
    flags
        .iter()
        .map(|flag| {
            let delta = if flag & short_bit != 0 {
                let magnitude = cursor.read::<u8>()? as i16;
                if flag & same_or_positive_bit != 0 {
                    magnitude
                } else {
                    -magnitude
                }
            } else if flag & same_or_positive_bit != 0 {
                0
            } else {
                cursor.read::<i16>()?
            };
            value = value.wrapping_add(delta);
            Ok(value)
        })
        .collect()
}

/// Flags for a composite glyph component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CompositeGlyphFlags(u16);

impl CompositeGlyphFlags {
    pub const ARG_1_AND_2_ARE_WORDS: Self = Self(0x0001);
    pub const ARGS_ARE_XY_VALUES: Self = Self(0x0002);
    pub const ROUND_XY_TO_GRID: Self = Self(0x0004);
    pub const WE_HAVE_A_SCALE: Self = Self(0x0008);
    pub const MORE_COMPONENTS: Self = Self(0x0020);
    pub const WE_HAVE_AN_X_AND_Y_SCALE: Self = Self(0x0040);
    pub const WE_HAVE_A_TWO_BY_TWO: Self = Self(0x0080);
    pub const WE_HAVE_INSTRUCTIONS: Self = Self(0x0100);
    pub const USE_MY_METRICS: Self = Self(0x0200);
    pub const OVERLAP_COMPOUND: Self = Self(0x0400);
    pub const SCALED_COMPONENT_OFFSET: Self = Self(0x0800);
    pub const UNSCALED_COMPONENT_OFFSET: Self = Self(0x1000);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for CompositeGlyphFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Transform for a composite component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transform {
    /// X scale factor.
    pub xx: F2Dot14,
    /// YX skew factor.
    pub yx: F2Dot14,
    /// XY skew factor.
    pub xy: F2Dot14,
    /// Y scale factor.
    pub yy: F2Dot14,
}

impl Transform {
    /// `true` if this is the identity transform.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            xx: F2Dot14::ONE,
            yx: F2Dot14::ZERO,
            xy: F2Dot14::ZERO,
            yy: F2Dot14::ONE,
        }
    }
}

/// Anchor position for a composite component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Offset the component by a vector.
    Offset { x: i16, y: i16 },
    /// Align point `component` of the component with point `base` of the
    /// glyph assembled so far.
    Point { base: u16, component: u16 },
}

/// A reference to another glyph. Part of [CompositeGlyph].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Component {
    /// Component flags.
    pub flags: CompositeGlyphFlags,
    /// Glyph identifier.
    pub glyph: GlyphId,
    /// Anchor for component placement.
    pub anchor: Anchor,
    /// Component transformation matrix.
    pub transform: Transform,
}

/// A glyph assembled from transformed references to other glyphs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeGlyph {
    pub bbox: BoundingBox<i16>,
    pub components: Vec<Component>,
}

impl CompositeGlyph {
    fn read(mut cursor: Cursor, bbox: BoundingBox<i16>) -> Result<Self, ReadError> {
        let mut components = Vec::new();
        loop {
            let flags = CompositeGlyphFlags(cursor.read()?);
            let glyph: GlyphId = cursor.read()?;
            let args_are_words = flags.contains(CompositeGlyphFlags::ARG_1_AND_2_ARE_WORDS);
            let args_are_xy_values = flags.contains(CompositeGlyphFlags::ARGS_ARE_XY_VALUES);
            let anchor = match (args_are_xy_values, args_are_words) {
                (true, true) => Anchor::Offset {
                    x: cursor.read()?,
                    y: cursor.read()?,
                },
                (true, false) => Anchor::Offset {
                    x: cursor.read::<i8>()? as _,
                    y: cursor.read::<i8>()? as _,
                },
                (false, true) => Anchor::Point {
                    base: cursor.read()?,
                    component: cursor.read()?,
                },
                (false, false) => Anchor::Point {
                    base: cursor.read::<u8>()? as _,
                    component: cursor.read::<u8>()? as _,
                },
            };
            let mut transform = Transform::default();
            if flags.contains(CompositeGlyphFlags::WE_HAVE_A_SCALE) {
                transform.xx = cursor.read()?;
                transform.yy = transform.xx;
            } else if flags.contains(CompositeGlyphFlags::WE_HAVE_AN_X_AND_Y_SCALE) {
                transform.xx = cursor.read()?;
                transform.yy = cursor.read()?;
            } else if flags.contains(CompositeGlyphFlags::WE_HAVE_A_TWO_BY_TWO) {
                transform.xx = cursor.read()?;
                transform.yx = cursor.read()?;
                transform.xy = cursor.read()?;
                transform.yy = cursor.read()?;
            }
            components.push(Component {
                flags,
                glyph,
                anchor,
                transform,
            });
            if !flags.contains(CompositeGlyphFlags::MORE_COMPONENTS) {
                break;
            }
        }
        Ok(CompositeGlyph { bbox, components })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fontweave_test_data::glyf as test_data;
    use pretty_assertions::assert_eq;

    fn read_glyph(bytes: &[u8]) -> Glyph {
        Glyph::read(FontData::new(bytes)).unwrap()
    }

    #[test]
    fn compressed_simple_glyph() {
        let Glyph::Simple(glyph) = read_glyph(test_data::SQUARE_WITH_CURVE) else {
            panic!("expected simple glyph");
        };
        assert_eq!(glyph.end_pts_of_contours, vec![4]);
        assert_eq!(
            glyph.points,
            vec![
                CurvePoint::on_curve(100, 0),
                CurvePoint::on_curve(100, 500),
                CurvePoint::off_curve(300, 700),
                CurvePoint::on_curve(500, 500),
                CurvePoint::on_curve(500, 0),
            ]
        );
        assert_eq!(glyph.bbox.y_max, 700);
    }

    #[test]
    fn contours_split_at_end_points() {
        let bytes = test_data::simple_glyph(&[
            &[(0, 0, true), (10, 0, true), (10, 10, true)],
            &[(2, 2, true), (4, 2, false), (4, 4, true), (2, 4, true)],
        ]);
        let Glyph::Simple(glyph) = read_glyph(&bytes) else {
            panic!("expected simple glyph");
        };
        let contours: Vec<_> = glyph.contours().collect();
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].len(), 3);
        assert_eq!(contours[1].len(), 4);
        assert_eq!(contours[1][1], CurvePoint::off_curve(4, 2));
        assert_eq!(glyph.num_points(), 7);
    }

    #[test]
    fn zero_contours() {
        let bytes = test_data::simple_glyph(&[]);
        let Glyph::Simple(glyph) = read_glyph(&bytes) else {
            panic!("expected simple glyph");
        };
        assert!(glyph.points.is_empty());
        assert_eq!(glyph.contours().count(), 0);
    }

    #[test]
    fn truncated_coordinates() {
        let bytes = &test_data::SQUARE_WITH_CURVE[..test_data::SQUARE_WITH_CURVE.len() - 3];
        assert!(Glyph::read(FontData::new(bytes)).is_err());
    }

    #[test]
    fn composite_components() {
        let bytes = test_data::composite_glyph(&[
            test_data::ComponentSpec::offset(3, 150, -20),
            test_data::ComponentSpec::offset(4, 0, 0).with_scale(0.5),
            test_data::ComponentSpec::point(5, 2, 0).with_two_by_two([0.0, 1.0, -1.0, 0.0]),
        ]);
        let Glyph::Composite(glyph) = read_glyph(&bytes) else {
            panic!("expected composite glyph");
        };
        assert_eq!(glyph.components.len(), 3);
        let first = &glyph.components[0];
        assert_eq!(first.glyph, GlyphId::new(3));
        assert_eq!(first.anchor, Anchor::Offset { x: 150, y: -20 });
        assert!(first.transform.is_identity());
        let second = &glyph.components[1];
        assert_eq!(second.transform.xx, F2Dot14::from_f32(0.5));
        assert_eq!(second.transform.yy, F2Dot14::from_f32(0.5));
        let third = &glyph.components[2];
        assert_eq!(third.anchor, Anchor::Point { base: 2, component: 0 });
        assert_eq!(third.transform.yx, F2Dot14::ONE);
        assert_eq!(third.transform.xy, F2Dot14::from_f32(-1.0));
        assert!(!third.flags.contains(CompositeGlyphFlags::MORE_COMPONENTS));
    }

    #[test]
    fn empty_and_out_of_range_glyphs() {
        let data = [0u8; 20];
        let glyf = Glyf::new(FontData::new(&data));
        assert_eq!(glyf.glyph(4..4), Ok(None));
        assert_eq!(glyf.glyph(20..20), Ok(None));
        assert_eq!(glyf.glyph(20..30), Err(ReadError::OutOfBounds));
        assert_eq!(glyf.glyph(10..40), Err(ReadError::OutOfBounds));
    }
}

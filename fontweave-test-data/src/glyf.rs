//! glyf test data

use fontweave_types::{F2Dot14, GlyphId};

use crate::bebuffer::BeBuffer;

/// A one-contour glyph using short, repeated-coordinate and long vectors.
///
/// Points: (100,0) (100,500) off(300,700) (500,500) (500,0)
#[rustfmt::skip]
pub static SQUARE_WITH_CURVE: &[u8] = &[
    0x00, 0x01,             // numberOfContours 1
    0x00, 0x64, 0x00, 0x00, // xMin 100, yMin 0
    0x01, 0xF4, 0x02, 0xBC, // xMax 500, yMax 700
    0x00, 0x04,             // endPtsOfContours [4]
    0x00, 0x00,             // instructionLength 0
    0x33, 0x11, 0x36, 0x17, 0x11, // flags
    0x64, 0xC8, 0xC8,       // x: +100, same, +200, +200, same
    0x01, 0xF4,             // y: same, +500
    0xC8, 0xC8,             //    +200, -200
    0xFE, 0x0C,             //    -500
];

/// Encode a simple glyph from contours of `(x, y, on_curve)` points.
///
/// Coordinates are always written as 16-bit deltas, and runs of identical
/// flags use the repeat flag.
pub fn simple_glyph(contours: &[&[(i16, i16, bool)]]) -> Vec<u8> {
    let points: Vec<_> = contours.iter().flat_map(|c| c.iter().copied()).collect();
    let (x_min, x_max) = min_max(points.iter().map(|p| p.0));
    let (y_min, y_max) = min_max(points.iter().map(|p| p.1));
    let mut buf = BeBuffer::new()
        .push(contours.len() as i16)
        .extend([x_min, y_min, x_max, y_max]);
    let mut end = 0u16;
    for contour in contours {
        end += contour.len() as u16;
        buf = buf.push(end - 1);
    }
    buf = buf.push(0u16);

    let flags: Vec<u8> = points.iter().map(|p| p.2 as u8).collect();
    let mut i = 0;
    while i < flags.len() {
        let run = flags[i..]
            .iter()
            .take(256)
            .take_while(|f| **f == flags[i])
            .count();
        if run > 1 {
            buf = buf.push(flags[i] | 0x08).push((run - 1) as u8);
        } else {
            buf = buf.push(flags[i]);
        }
        i += run;
    }
    let deltas = |coords: Vec<i16>| {
        let mut prev = 0i16;
        coords
            .into_iter()
            .map(move |v| {
                let delta = v.wrapping_sub(prev);
                prev = v;
                delta
            })
            .collect::<Vec<_>>()
    };
    buf = buf.extend(deltas(points.iter().map(|p| p.0).collect()));
    buf = buf.extend(deltas(points.iter().map(|p| p.1).collect()));
    buf.into_vec()
}

fn min_max(values: impl Iterator<Item = i16>) -> (i16, i16) {
    values.fold(None, |acc: Option<(i16, i16)>, v| match acc {
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        None => Some((v, v)),
    })
    .unwrap_or((0, 0))
}

/// Placement of a component.
#[derive(Clone, Copy, Debug)]
pub enum ComponentAnchor {
    Offset(i16, i16),
    Point(u16, u16),
}

/// Transform of a component.
#[derive(Clone, Copy, Debug)]
pub enum ComponentScale {
    None,
    Uniform(f32),
    XY(f32, f32),
    TwoByTwo([f32; 4]),
}

/// A description of one component of a composite glyph.
#[derive(Clone, Copy, Debug)]
pub struct ComponentSpec {
    pub glyph: GlyphId,
    pub anchor: ComponentAnchor,
    pub scale: ComponentScale,
    pub scaled_offset: bool,
}

impl ComponentSpec {
    pub fn offset(glyph: u16, x: i16, y: i16) -> Self {
        Self {
            glyph: GlyphId::new(glyph),
            anchor: ComponentAnchor::Offset(x, y),
            scale: ComponentScale::None,
            scaled_offset: false,
        }
    }

    pub fn point(glyph: u16, base: u16, component: u16) -> Self {
        Self {
            glyph: GlyphId::new(glyph),
            anchor: ComponentAnchor::Point(base, component),
            scale: ComponentScale::None,
            scaled_offset: false,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = ComponentScale::Uniform(scale);
        self
    }

    pub fn with_xy_scale(mut self, x: f32, y: f32) -> Self {
        self.scale = ComponentScale::XY(x, y);
        self
    }

    pub fn with_two_by_two(mut self, matrix: [f32; 4]) -> Self {
        self.scale = ComponentScale::TwoByTwo(matrix);
        self
    }

    pub fn with_scaled_offset(mut self) -> Self {
        self.scaled_offset = true;
        self
    }
}

/// Encode a composite glyph. The bounding box is left empty.
pub fn composite_glyph(components: &[ComponentSpec]) -> Vec<u8> {
    let mut buf = BeBuffer::new().push(-1i16).extend([0i16; 4]);
    for (i, component) in components.iter().enumerate() {
        let mut flags = 0u16;
        if i + 1 < components.len() {
            flags |= 0x0020;
        }
        if component.scaled_offset {
            flags |= 0x0800;
        }
        let args: BeBuffer = match component.anchor {
            ComponentAnchor::Offset(x, y) => {
                flags |= 0x0002;
                match (i8::try_from(x), i8::try_from(y)) {
                    (Ok(x), Ok(y)) => BeBuffer::new().push(x).push(y),
                    _ => {
                        flags |= 0x0001;
                        BeBuffer::new().push(x).push(y)
                    }
                }
            }
            ComponentAnchor::Point(base, comp) => match (u8::try_from(base), u8::try_from(comp)) {
                (Ok(base), Ok(comp)) => BeBuffer::new().push(base).push(comp),
                _ => {
                    flags |= 0x0001;
                    BeBuffer::new().push(base).push(comp)
                }
            },
        };
        let scale: Vec<F2Dot14> = match component.scale {
            ComponentScale::None => vec![],
            ComponentScale::Uniform(s) => {
                flags |= 0x0008;
                vec![F2Dot14::from_f32(s)]
            }
            ComponentScale::XY(x, y) => {
                flags |= 0x0040;
                vec![F2Dot14::from_f32(x), F2Dot14::from_f32(y)]
            }
            ComponentScale::TwoByTwo(m) => {
                flags |= 0x0080;
                m.iter().map(|v| F2Dot14::from_f32(*v)).collect()
            }
        };
        buf = buf
            .push(flags)
            .push(component.glyph)
            .append(&args)
            .extend(scale);
    }
    buf.into_vec()
}

/// Lay out encoded glyphs into `glyf` and long-format `loca` tables.
///
/// Each glyph is padded to an even length; empty entries become empty glyphs.
pub fn glyf_and_loca(glyphs: &[Vec<u8>]) -> (Vec<u8>, Vec<u8>) {
    let mut glyf = Vec::new();
    let mut loca = BeBuffer::new().push(0u32);
    for glyph in glyphs {
        glyf.extend_from_slice(glyph);
        if glyf.len() % 2 != 0 {
            glyf.push(0);
        }
        loca = loca.push(glyf.len() as u32);
    }
    (glyf, loca.into_vec())
}

//! Complete fonts assembled from the table builders.

use fontweave_types::Tag;

use crate::{
    cmap, font_builder::FontBuilder, glyf, glyf::ComponentSpec, gsub, kern, tables,
};

/// Glyph ids in [`simple_font`].
pub mod gids {
    pub const NOTDEF: u16 = 0;
    pub const SPACE: u16 = 1;
    pub const F: u16 = 2;
    pub const I: u16 = 3;
    pub const A: u16 = 4;
    pub const F_F_I: u16 = 5;
    pub const F_I: u16 = 6;
    pub const A_ALT: u16 = 7;
    /// `f` and `i` placed side by side as components.
    pub const F_I_COMPOSITE: u16 = 8;
    /// A composite that references itself.
    pub const CYCLE: u16 = 9;
    /// A square with a square hole.
    pub const O: u16 = 10;
    /// Truncated glyph data.
    pub const BROKEN: u16 = 11;
    pub const NUM_GLYPHS: u16 = 12;
}

pub const FAMILY_NAME: &str = "Weave Sans";
pub const FULL_NAME: &str = "Weave Sans Regular";
pub const UNITS_PER_EM: u16 = 1000;

fn rect(x0: i16, y0: i16, x1: i16, y1: i16) -> Vec<(i16, i16, bool)> {
    // clockwise, as TrueType outer contours are
    vec![(x0, y0, true), (x0, y1, true), (x1, y1, true), (x1, y0, true)]
}

fn rect_glyph(x0: i16, y0: i16, x1: i16, y1: i16) -> Vec<u8> {
    glyf::simple_glyph(&[&rect(x0, y0, x1, y1)])
}

/// The glyph outlines of [`simple_font`], in glyph id order.
pub fn simple_font_glyphs() -> Vec<Vec<u8>> {
    let hole: Vec<_> = rect(150, 150, 450, 450).into_iter().rev().collect();
    vec![
        rect_glyph(50, 0, 450, 700),
        Vec::new(),
        rect_glyph(0, 0, 200, 700),
        rect_glyph(0, 0, 100, 500),
        glyf::simple_glyph(&[&[
            (0, 0, true),
            (0, 500, false),
            (250, 500, true),
            (500, 500, false),
            (500, 0, true),
        ]]),
        rect_glyph(0, 0, 700, 700),
        rect_glyph(0, 0, 500, 700),
        rect_glyph(0, 0, 450, 450),
        glyf::composite_glyph(&[
            ComponentSpec::offset(gids::F, 0, 0),
            ComponentSpec::offset(gids::I, 250, 0),
        ]),
        glyf::composite_glyph(&[ComponentSpec::offset(gids::CYCLE, 10, 0)]),
        glyf::simple_glyph(&[&rect(0, 0, 600, 600), &hole]),
        // one contour declared, nothing else
        vec![0, 1, 0, 0, 0, 0, 0, 0, 0, 0],
    ]
}

/// A small TrueType font exercising every supported table.
///
/// - cmap: space, `a`, `f`, `i` and `o`
/// - kern: `f i` = -20, `a f` = 15
/// - GSUB: `liga` (ffi, fi), `salt` (a -> a.alt), `smcp` (a -> a.alt by delta)
/// - hmtx: ten long metrics, the last two glyphs reuse the final advance
pub fn simple_font() -> Vec<u8> {
    let (glyf_data, loca) = glyf::glyf_and_loca(&simple_font_glyphs());
    let metrics: Vec<(u16, i16)> = (0..10).map(|i| (500 + i * 10, i as i16)).collect();
    let cmap_data = cmap::windows_unicode_cmap(&cmap::format4_from_pairs(&[
        (0x20, gids::SPACE),
        (0x61, gids::A),
        (0x66, gids::F),
        (0x69, gids::I),
        (0x6F, gids::O),
    ]));
    let kern_data = kern::kern_table(&[kern::format0(&[
        (gids::F, gids::I, -20),
        (gids::A, gids::F, 15),
    ])]);
    let gsub_data = gsub::gsub(
        &[
            (Tag::new(b"liga"), &[0][..]),
            (Tag::new(b"salt"), &[1][..]),
            (Tag::new(b"smcp"), &[2][..]),
        ],
        &[
            gsub::lookup(
                4,
                0,
                &[gsub::ligature(
                    &[gids::F],
                    &[&[
                        (gids::F_F_I, &[gids::F, gids::I][..]),
                        (gids::F_I, &[gids::I][..]),
                    ]],
                )],
                None,
            ),
            gsub::lookup(3, 0, &[gsub::alternate(&[gids::A], &[&[gids::A_ALT]])], None),
            gsub::lookup(
                1,
                0,
                &[gsub::single_format1(&[gids::A], (gids::A_ALT - gids::A) as i16)],
                None,
            ),
        ],
    );
    FontBuilder::new()
        .add_raw(Tag::new(b"head"), tables::head(UNITS_PER_EM, 9, true).into_vec())
        .add_raw(Tag::new(b"hhea"), tables::hhea(800, -200, 100, 10).into_vec())
        .add_raw(Tag::new(b"maxp"), tables::maxp(gids::NUM_GLYPHS).into_vec())
        .add_raw(Tag::new(b"hmtx"), tables::hmtx(&metrics, &[-5, -6]).into_vec())
        .add_raw(
            Tag::new(b"name"),
            tables::name(&[
                (1, 0, 0, 4, "Mac Name"),
                (3, 1, 0x409, 1, FAMILY_NAME),
                (3, 1, 0x409, 2, "Regular"),
                (3, 1, 0x409, 4, FULL_NAME),
                (3, 1, 0x409, 5, "Version 1.000"),
            ])
            .into_vec(),
        )
        .add_raw(Tag::new(b"cmap"), cmap_data)
        .add_raw(Tag::new(b"glyf"), glyf_data)
        .add_raw(Tag::new(b"loca"), loca)
        .add_raw(Tag::new(b"kern"), kern_data)
        .add_raw(Tag::new(b"GSUB"), gsub_data)
        .build()
}

/// A font with only the tables required to pass the directory check.
pub fn minimal_font() -> Vec<u8> {
    FontBuilder::new()
        .add_raw(Tag::new(b"maxp"), tables::maxp(1).into_vec())
        .build()
}

//! The loaded font and its queries.

use types::{GlyphId, Tag};

use crate::{
    error::{Diagnostic, Diagnostics, FontError},
    font_data::FontData,
    options::LoadOptions,
    outline::{GlyphOutline, OutlineLoader},
    read::{FontRead, ReadError, TopLevelTable},
    substitution::{self, FeatureSelection, GlyphBuffer, Limits},
    table_directory::TableDirectory,
    tables::{
        cmap::Cmap,
        gdef::Gdef,
        glyf::{self, Glyf},
        gsub::Gsub,
        head::Head,
        hhea::Hhea,
        hmtx::{self, Hmtx},
        kern::Kern,
        loca::{self, Loca},
        maxp::Maxp,
        name::{name_id, Name},
    },
};

/// Returned for glyph ids past the end of the font.
static MISSING_OUTLINE: GlyphOutline = GlyphOutline::invalid(0, 0);

/// A parsed font.
///
/// All tables are read when the font is constructed; problems that do not
/// prevent loading are recorded as [diagnostics](Font::diagnostics) and the
/// affected data falls back to an empty default. Queries never fail.
///
/// A `Font` is immutable and can be shared between threads.
#[derive(Debug)]
pub struct Font {
    family_name: String,
    subfamily_name: String,
    full_name: String,
    version: String,
    units_per_em: u16,
    lowest_rec_ppem: u16,
    ascender: i16,
    descender: i16,
    line_gap: i16,
    num_glyphs: u16,
    cmap: Cmap,
    kern: Kern,
    outlines: Vec<GlyphOutline>,
    gsub: Option<Gsub>,
    gdef: Option<Gdef>,
    options: LoadOptions,
    diagnostics: Vec<Diagnostic>,
}

impl Font {
    /// Load a font with the default options.
    pub fn new(data: &[u8]) -> Result<Self, FontError> {
        Self::with_options(data, LoadOptions::default())
    }

    /// Load a font.
    ///
    /// Only an unreadable table directory is an error.
    pub fn with_options(data: &[u8], options: LoadOptions) -> Result<Self, FontError> {
        let directory = TableDirectory::read(FontData::new(data))?;
        log::debug!(
            "loading font: {} tables, {} bytes",
            directory.table_records().len(),
            data.len()
        );
        let mut diagnostics = Diagnostics::default();

        let head: Head = load_table(&directory, &mut diagnostics);
        let hhea: Hhea = load_table(&directory, &mut diagnostics);
        let maxp: Maxp = load_table(&directory, &mut diagnostics);
        let name: Name = load_table(&directory, &mut diagnostics);
        let num_glyphs = maxp.num_glyphs;
        let hmtx = load_with(
            hmtx::TAG,
            directory.data_for_tag(hmtx::TAG),
            &mut diagnostics,
            |data| Hmtx::read(data, hhea.number_of_h_metrics, num_glyphs),
        )
        .unwrap_or_default();

        let cmap: Cmap = load_table(&directory, &mut diagnostics);
        if directory.contains(Cmap::TAG) && cmap.subtable().is_none() {
            diagnostics.table(Cmap::TAG, "no Windows-Unicode subtable found");
        }

        let kern: Kern = load_table(&directory, &mut diagnostics);
        for skipped in kern.skipped_subtables() {
            diagnostics.table(
                Kern::TAG,
                format!(
                    "skipped subtable {}: format {}, coverage 0x{:04X}",
                    skipped.index, skipped.format, skipped.coverage
                ),
            );
        }

        let gsub: Option<Gsub> = load_optional(&directory, &mut diagnostics, true);
        if let Some(gsub) = &gsub {
            for (lookup, lookup_type, format) in gsub.unimplemented_subtables() {
                diagnostics.table(
                    Gsub::TAG,
                    format!("lookup {lookup}: unsupported subtable type {lookup_type} format {format}"),
                );
            }
            for (lookup, lookup_type, format, err) in gsub.malformed_subtables() {
                diagnostics.table(
                    Gsub::TAG,
                    format!("lookup {lookup}: malformed subtable type {lookup_type} format {format} dropped: {err}"),
                );
            }
        }
        let gdef: Option<Gdef> = load_optional(&directory, &mut diagnostics, false);

        let outlines = load_outlines(&directory, &head, &hmtx, num_glyphs, &options, &mut diagnostics);

        let name_or_empty = |id| name.get(id).unwrap_or_default().to_owned();
        let font = Font {
            family_name: name_or_empty(name_id::FAMILY_NAME),
            subfamily_name: name_or_empty(name_id::SUBFAMILY_NAME),
            full_name: name_or_empty(name_id::FULL_NAME),
            version: name_or_empty(name_id::VERSION_STRING),
            units_per_em: head.units_per_em,
            lowest_rec_ppem: head.lowest_rec_ppem,
            ascender: hhea.ascender,
            descender: hhea.descender,
            line_gap: hhea.line_gap,
            num_glyphs,
            cmap,
            kern,
            outlines,
            gsub,
            gdef,
            options,
            diagnostics: diagnostics.into_inner(),
        };
        log::debug!(
            "loaded '{}': {} glyphs, {} diagnostics",
            font.full_name,
            font.num_glyphs,
            font.diagnostics.len()
        );
        Ok(font)
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn subfamily_name(&self) -> &str {
        &self.subfamily_name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn version_string(&self) -> &str {
        &self.version
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// Smallest readable size in pixels.
    pub fn lowest_rec_ppem(&self) -> u16 {
        self.lowest_rec_ppem
    }

    pub fn ascender(&self) -> i16 {
        self.ascender
    }

    pub fn descender(&self) -> i16 {
        self.descender
    }

    pub fn line_gap(&self) -> i16 {
        self.line_gap
    }

    /// Recommended distance between baselines: ascender - descender + line gap.
    pub fn line_space(&self) -> i32 {
        self.ascender as i32 - self.descender as i32 + self.line_gap as i32
    }

    pub fn num_glyphs(&self) -> u16 {
        self.num_glyphs
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Problems found while loading, in the order they were found.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn charmap(&self) -> &Cmap {
        &self.cmap
    }

    pub fn kern(&self) -> &Kern {
        &self.kern
    }

    pub fn gsub(&self) -> Option<&Gsub> {
        self.gsub.as_ref()
    }

    pub fn gdef(&self) -> Option<&Gdef> {
        self.gdef.as_ref()
    }

    /// The glyph for a character or codepoint, or `.notdef`.
    ///
    /// ```
    /// # let data = fontweave_test_data::fonts::simple_font();
    /// use fontweave::{types::GlyphId, Font};
    ///
    /// let font = Font::new(&data).unwrap();
    /// assert_ne!(font.glyph_for_char('a'), GlyphId::NOTDEF);
    /// assert_eq!(font.glyph_for_char(0x10FFFFu32), GlyphId::NOTDEF);
    /// ```
    pub fn glyph_for_char(&self, codepoint: impl Into<u32>) -> GlyphId {
        self.cmap.map_codepoint(codepoint)
    }

    /// Map every character of `text` to a glyph.
    pub fn glyphs_for_str(&self, text: &str) -> GlyphBuffer {
        text.chars().map(|c| self.glyph_for_char(c)).collect()
    }

    /// The kerning adjustment between two glyphs, or 0.
    pub fn kerning(&self, left: GlyphId, right: GlyphId) -> i16 {
        self.kern.get(left, right)
    }

    /// The outline for a glyph.
    ///
    /// Glyph ids past the end of the font get a shared invalid, empty outline.
    pub fn outline(&self, gid: GlyphId) -> &GlyphOutline {
        self.outlines
            .get(gid.to_u16() as usize)
            .unwrap_or(&MISSING_OUTLINE)
    }

    /// All outlines, indexed by glyph id.
    pub fn outlines(&self) -> &[GlyphOutline] {
        &self.outlines
    }

    /// The distinct GSUB feature tags, in feature list order.
    pub fn gsub_features(&self) -> Vec<Tag> {
        let mut tags: Vec<Tag> = Vec::new();
        for record in self
            .gsub
            .iter()
            .flat_map(|gsub| &gsub.feature_list.feature_records)
        {
            if !tags.contains(&record.feature_tag) {
                tags.push(record.feature_tag);
            }
        }
        tags
    }

    /// Apply the lookups of `feature` to `buffer`.
    ///
    /// Lookups run in lookup list order, not in the order the feature lists
    /// them, and each lookup runs once even if it is listed twice. A feature
    /// the font does not have leaves the buffer unchanged.
    pub fn substitute(&self, buffer: &mut GlyphBuffer, feature: Tag) {
        self.substitute_with(buffer, &FeatureSelection::new(feature))
    }

    /// Apply a feature, resolved through the requested script and language.
    pub fn substitute_with(&self, buffer: &mut GlyphBuffer, selection: &FeatureSelection) {
        let Some(gsub) = &self.gsub else {
            return;
        };
        let limits = Limits {
            max_nesting_level: self.options.max_nesting_level,
            max_lookup_operations: self.options.max_lookup_operations,
        };
        substitution::apply_feature(gsub, self.gdef.as_ref(), selection, limits, buffer);
    }
}

/// Read table data with `read`, recording a diagnostic if it is missing or
/// malformed.
fn load_with<'a, T>(
    tag: Tag,
    data: Option<FontData<'a>>,
    diagnostics: &mut Diagnostics,
    read: impl FnOnce(FontData<'a>) -> Result<T, ReadError>,
) -> Option<T> {
    let Some(data) = data else {
        diagnostics.table(tag, "table is missing");
        return None;
    };
    match read(data) {
        Ok(table) => {
            log::debug!("read '{tag}' ({} bytes)", data.len());
            Some(table)
        }
        Err(err) => {
            diagnostics.table(tag, format!("malformed table dropped: {err}"));
            None
        }
    }
}

/// Load a table, falling back to its default.
fn load_table<'a, T>(directory: &TableDirectory<'a>, diagnostics: &mut Diagnostics) -> T
where
    T: TopLevelTable + FontRead<'a> + Default,
{
    load_with(T::TAG, directory.data_for_tag(T::TAG), diagnostics, T::read).unwrap_or_default()
}

/// Load a table that may be absent; `report_missing` records a diagnostic
/// when it is.
fn load_optional<'a, T>(
    directory: &TableDirectory<'a>,
    diagnostics: &mut Diagnostics,
    report_missing: bool,
) -> Option<T>
where
    T: TopLevelTable + FontRead<'a>,
{
    let data = directory.data_for_tag(T::TAG);
    if data.is_none() && !report_missing {
        return None;
    }
    load_with(T::TAG, data, diagnostics, T::read)
}

fn load_outlines(
    directory: &TableDirectory,
    head: &Head,
    hmtx: &Hmtx,
    num_glyphs: u16,
    options: &LoadOptions,
    diagnostics: &mut Diagnostics,
) -> Vec<GlyphOutline> {
    let invalid = |gid: GlyphId| {
        let metric = hmtx.metric(gid);
        GlyphOutline::invalid(metric.advance, metric.side_bearing)
    };
    let loca = load_with(
        loca::TAG,
        directory.data_for_tag(loca::TAG),
        diagnostics,
        |data| Loca::read(data, head.long_loca, num_glyphs),
    );
    let glyf_data = directory.data_for_tag(glyf::TAG);
    if glyf_data.is_none() {
        diagnostics.table(glyf::TAG, "table is missing");
    }
    let (Some(loca), Some(glyf_data)) = (loca, glyf_data) else {
        return (0..num_glyphs).map(GlyphId::new).map(invalid).collect();
    };
    let mut loader = OutlineLoader::new(Glyf::new(glyf_data), &loca, options.max_composite_depth);
    (0..num_glyphs)
        .map(GlyphId::new)
        .map(|gid| match loader.load(gid) {
            Ok(contours) => {
                let metric = hmtx.metric(gid);
                GlyphOutline::new(
                    metric.advance,
                    metric.side_bearing,
                    contours,
                    options.tessellation_tolerance(),
                )
            }
            Err(err) => {
                diagnostics.glyph(glyf::TAG, gid, err.to_string());
                invalid(gid)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fontweave_test_data::{fonts, BeBuffer, FontBuilder};

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn font_is_send_and_sync() {
        assert_send_sync::<Font>();
    }

    #[test]
    fn bad_signature_is_fatal() {
        let data = BeBuffer::new().push(0xDEADBEEFu32).push(0u16).extend([0u16; 3]);
        assert_eq!(
            Font::new(data.as_slice()).unwrap_err(),
            FontError::InvalidFontSignature(0xDEADBEEF)
        );
    }

    #[test]
    fn truncated_directory_is_fatal() {
        let data = BeBuffer::new().push(0x00010000u32).push(3u16);
        assert_eq!(
            Font::new(data.as_slice()).unwrap_err(),
            FontError::Read(ReadError::OutOfBounds)
        );
    }

    #[test]
    fn missing_tables_are_diagnosed() {
        let font = Font::new(&fonts::minimal_font()).unwrap();
        let missing: Vec<_> = font
            .diagnostics()
            .iter()
            .filter(|diag| diag.message == "table is missing")
            .map(|diag| diag.table)
            .collect();
        for tag in [b"head", b"hhea", b"name", b"hmtx", b"cmap", b"kern", b"GSUB", b"loca", b"glyf"] {
            assert!(missing.contains(&Tag::new(tag)), "{}", Tag::new(tag));
        }
        // GDEF is only consulted when present
        assert!(!missing.contains(&Tag::new(b"GDEF")));
        assert_eq!(font.units_per_em(), 1000);
        assert_eq!(font.full_name(), "");
        assert!(font.outlines().iter().all(|outline| !outline.is_valid()));
    }

    #[test]
    fn malformed_optional_table_is_dropped() {
        let data = FontBuilder::new()
            .add_raw(Tag::new(b"maxp"), fontweave_test_data::tables::maxp(0).into_vec())
            .add_raw(Tag::new(b"kern"), vec![0u8, 0])
            .add_raw(Tag::new(b"GSUB"), vec![0u8, 2, 0, 0])
            .build();
        let font = Font::new(&data).unwrap();
        let messages: Vec<_> = font
            .diagnostics()
            .iter()
            .map(|diag| diag.to_string())
            .collect();
        assert!(messages.contains(&"kern: malformed table dropped: An offset was out of bounds".to_string()));
        assert!(messages.contains(&"GSUB: malformed table dropped: Invalid format '2'".to_string()));
        assert!(font.gsub().is_none());
        assert_eq!(font.kerning(GlyphId::new(1), GlyphId::new(2)), 0);
    }
}

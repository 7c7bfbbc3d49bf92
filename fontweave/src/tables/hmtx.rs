//! The [hmtx (Horizontal Metrics)](https://docs.microsoft.com/en-us/typography/opentype/spec/hmtx) table

use types::{GlyphId, Tag};

use crate::{font_data::FontData, read::ReadError};

/// 'hmtx'
pub const TAG: Tag = Tag::new(b"hmtx");

/// Advance width and left side bearing for one glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LongMetric {
    pub advance: u16,
    pub side_bearing: i16,
}

/// Horizontal metrics for every glyph.
///
/// Glyphs past the end of the long metrics array share the final advance
/// width and take their side bearing from the trailing bearing array.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Hmtx {
    h_metrics: Vec<LongMetric>,
    left_side_bearings: Vec<i16>,
}

impl Hmtx {
    pub fn read(data: FontData, number_of_h_metrics: u16, num_glyphs: u16) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let h_metrics = (0..number_of_h_metrics)
            .map(|_| {
                Ok(LongMetric {
                    advance: cursor.read()?,
                    side_bearing: cursor.read()?,
                })
            })
            .collect::<Result<Vec<_>, ReadError>>()?;
        let num_bearings = num_glyphs.saturating_sub(number_of_h_metrics);
        let left_side_bearings = cursor.read_array(num_bearings as usize)?;
        Ok(Hmtx {
            h_metrics,
            left_side_bearings,
        })
    }

    /// The metrics for a glyph, or zeroes if there is no data.
    pub fn metric(&self, gid: GlyphId) -> LongMetric {
        let ix = gid.to_u16() as usize;
        if let Some(metric) = self.h_metrics.get(ix) {
            return *metric;
        }
        let advance = self.h_metrics.last().map(|m| m.advance).unwrap_or(0);
        let side_bearing = ix
            .checked_sub(self.h_metrics.len())
            .and_then(|i| self.left_side_bearings.get(i))
            .copied()
            .unwrap_or(0);
        LongMetric {
            advance,
            side_bearing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fontweave_test_data::tables;

    #[test]
    fn trailing_glyphs_share_last_advance() {
        let data = tables::hmtx(&[(500, 10), (600, 20)], &[-5, 7]);
        let hmtx = Hmtx::read(FontData::new(&data), 2, 4).unwrap();
        assert_eq!(
            hmtx.metric(GlyphId::new(1)),
            LongMetric {
                advance: 600,
                side_bearing: 20
            }
        );
        assert_eq!(
            hmtx.metric(GlyphId::new(3)),
            LongMetric {
                advance: 600,
                side_bearing: 7
            }
        );
        // beyond num_glyphs
        assert_eq!(hmtx.metric(GlyphId::new(9)).side_bearing, 0);
    }

    #[test]
    fn truncated() {
        let data = tables::hmtx(&[(500, 10)], &[]);
        assert!(Hmtx::read(FontData::new(&data), 2, 2).is_err());
    }
}

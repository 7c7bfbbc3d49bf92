//! Settings that control font loading.

/// Maximum nesting depth when resolving composite glyphs.
pub const GLYF_COMPOSITE_RECURSION_LIMIT: usize = 32;

/// Maximum depth of nested lookups invoked from contextual substitutions.
pub const MAX_NESTING_LEVEL: usize = 64;

/// Maximum number of subtable applications in a single substitution call.
pub const MAX_LOOKUP_OPERATIONS: usize = 35_000;

/// The default flattening tolerance for tessellation, in font units.
pub const DEFAULT_TESSELLATION_TOLERANCE: f64 = 0.25;

/// Options for loading a [`Font`](crate::Font).
///
/// ```
/// use fontweave::LoadOptions;
///
/// let options = LoadOptions::default()
///     .with_tessellation_tolerance(1.0)
///     .with_max_composite_depth(8);
/// assert_eq!(options.max_composite_depth, 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadOptions {
    /// Composite glyphs nested deeper than this are marked invalid.
    pub max_composite_depth: usize,
    tessellation_tolerance: f64,
    /// Maximum depth of nested lookups during contextual substitution.
    pub max_nesting_level: usize,
    /// Maximum number of subtable applications per substitution call.
    pub max_lookup_operations: usize,
}

impl LoadOptions {
    pub fn with_max_composite_depth(mut self, depth: usize) -> Self {
        self.max_composite_depth = depth;
        self
    }

    /// Set the flattening tolerance. Non-positive or non-finite values are
    /// replaced with the default.
    pub fn with_tessellation_tolerance(mut self, tolerance: f64) -> Self {
        self.tessellation_tolerance = checked_tolerance(tolerance);
        self
    }

    /// Maximum distance, in font units, between a curve and its flattened
    /// polyline when tessellating.
    pub fn tessellation_tolerance(&self) -> f64 {
        // deserialized options skip the builder
        checked_tolerance(self.tessellation_tolerance)
    }

    pub fn with_max_nesting_level(mut self, level: usize) -> Self {
        self.max_nesting_level = level;
        self
    }

    pub fn with_max_lookup_operations(mut self, count: usize) -> Self {
        self.max_lookup_operations = count;
        self
    }
}

fn checked_tolerance(tolerance: f64) -> f64 {
    if tolerance.is_finite() && tolerance > 0.0 {
        tolerance
    } else {
        DEFAULT_TESSELLATION_TOLERANCE
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_composite_depth: GLYF_COMPOSITE_RECURSION_LIMIT,
            tessellation_tolerance: DEFAULT_TESSELLATION_TOLERANCE,
            max_nesting_level: MAX_NESTING_LEVEL,
            max_lookup_operations: MAX_LOOKUP_OPERATIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_tolerance_falls_back() {
        let options = LoadOptions::default().with_tessellation_tolerance(-3.0);
        assert_eq!(options.tessellation_tolerance(), DEFAULT_TESSELLATION_TOLERANCE);
        let options = LoadOptions::default().with_tessellation_tolerance(f64::NAN);
        assert_eq!(options.tessellation_tolerance(), DEFAULT_TESSELLATION_TOLERANCE);
        let options = LoadOptions::default().with_tessellation_tolerance(0.0);
        assert_eq!(options.tessellation_tolerance(), DEFAULT_TESSELLATION_TOLERANCE);
        let options = LoadOptions::default().with_tessellation_tolerance(2.5);
        assert_eq!(options.tessellation_tolerance(), 2.5);
    }

    #[test]
    fn stored_zero_tolerance_is_not_used() {
        let options = LoadOptions {
            tessellation_tolerance: 0.0,
            ..LoadOptions::default()
        };
        assert_eq!(options.tessellation_tolerance(), DEFAULT_TESSELLATION_TOLERANCE);
    }
}

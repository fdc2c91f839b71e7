use serde::{Deserialize, Serialize};

use crate::model::types::FeatureType;
use crate::types::Span;

/// One exonic interval of a transcript. Immutable value type.
///
/// Coordinates are 1-based inclusive, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Exon {
    pub start: u32,
    pub end: u32,
    #[serde(rename = "type")]
    pub feature_type: FeatureType,
}

impl Exon {
    pub fn new(start: u32, end: u32, feature_type: FeatureType) -> Self {
        debug_assert!(start <= end, "Exon requires start <= end");
        Self {
            start,
            end,
            feature_type,
        }
    }

    #[inline]
    pub fn span(self) -> Span {
        Span::new(self.start, self.end)
    }

    /// Inclusive length in bases.
    #[inline]
    pub fn length(self) -> u32 {
        self.span().len()
    }

    #[inline]
    pub fn overlap_len(self, other: Exon) -> u32 {
        self.span().overlap_len(other.span())
    }

    #[inline]
    pub fn overlaps(self, other: Exon) -> bool {
        self.overlap_len(other) > 0
    }
}

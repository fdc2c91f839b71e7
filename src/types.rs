use std::fmt;

use serde::{Deserialize, Serialize};

/// Genomic strand/orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = ".")]
    Unknown,
}

impl Strand {
    /// Parse column 7 of a GFF3 line.
    ///
    /// Annotation files in the wild carry '.', '?' or garbage here; anything
    /// that is not '+' or '-' becomes `Unknown` rather than failing the row.
    pub fn from_gff3(s: &str) -> Self {
        match s {
            "+" => Strand::Plus,
            "-" => Strand::Minus,
            _ => Strand::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strand::Plus => "+",
            Strand::Minus => "-",
            Strand::Unknown => ".",
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contiguous genomic interval.
/// Coordinates are 1-based, inclusive on both ends: [start, end].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Create a new span. Requires start <= end (the record parser rejects
    /// file rows that violate this).
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "Span requires start <= end");
        Self { start, end }
    }

    /// Inclusive length: a single-base span has length 1.
    #[inline]
    pub fn len(self) -> u32 {
        self.end - self.start + 1
    }

    #[inline]
    pub fn intersects(self, other: Span) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Number of overlapping bases, 0 when the spans are disjoint.
    #[inline]
    pub fn overlap_len(self, other: Span) -> u32 {
        if !self.intersects(other) {
            return 0;
        }
        self.end.min(other.end) - self.start.max(other.start) + 1
    }

    /// Overlap length normalized by the shorter of the two spans.
    ///
    /// 1.0 means the shorter span is fully contained in the longer one,
    /// 0.0 means no overlap at all.
    pub fn overlap_ratio(self, other: Span) -> f64 {
        let overlap = self.overlap_len(other);
        if overlap == 0 {
            return 0.0;
        }
        overlap as f64 / self.len().min(other.len()) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strand_from_gff3_is_lenient() {
        assert_eq!(Strand::from_gff3("+"), Strand::Plus);
        assert_eq!(Strand::from_gff3("-"), Strand::Minus);
        assert_eq!(Strand::from_gff3("."), Strand::Unknown);
        assert_eq!(Strand::from_gff3("?"), Strand::Unknown);
        assert_eq!(Strand::from_gff3("x"), Strand::Unknown);
    }

    #[test]
    fn span_len_is_inclusive() {
        assert_eq!(Span::new(100, 100).len(), 1);
        assert_eq!(Span::new(1000, 2000).len(), 1001);
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = Span::new(100, 200);
        let b = Span::new(150, 250);
        let c = Span::new(300, 400);

        assert_eq!(a.overlap_len(b), b.overlap_len(a));
        assert_eq!(a.overlap_len(b), 51);
        assert_eq!(a.overlap_len(c), c.overlap_len(a));
        assert_eq!(a.overlap_len(c), 0);
    }

    #[test]
    fn touching_endpoints_count_as_one_base() {
        let a = Span::new(100, 200);
        let b = Span::new(200, 300);
        assert!(a.intersects(b));
        assert_eq!(a.overlap_len(b), 1);
    }

    #[test]
    fn ratio_uses_shorter_span() {
        // [1000,2000] vs [1500,2500]: 501 shared bases over min(1001, 1001).
        let a = Span::new(1000, 2000);
        let b = Span::new(1500, 2500);
        let ratio = a.overlap_ratio(b);
        assert!((ratio - 501.0 / 1001.0).abs() < 1e-12);
        assert!(ratio >= 0.5);
        assert!(ratio < 0.6);

        // Contained span scores 1.0.
        let inner = Span::new(1200, 1300);
        assert_eq!(a.overlap_ratio(inner), 1.0);
    }
}

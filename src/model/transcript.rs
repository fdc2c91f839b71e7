use serde::{Deserialize, Serialize};

use crate::model::exon::Exon;
use crate::types::{Span, Strand};

/// A transcript: an ordered run of exons on one chromosome and strand.
///
/// Instances are materialized by the annotation builder once all of their
/// exons are known; there is no way to grow one afterwards. The exon list is
/// sorted ascending by start at construction, whatever order the file
/// delivered the rows in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(rename = "transcript_id")]
    pub id: String,
    pub chrom: String,
    pub strand: Strand,
    exons: Vec<Exon>,
}

impl Transcript {
    pub fn new(
        id: impl Into<String>,
        chrom: impl Into<String>,
        strand: Strand,
        mut exons: Vec<Exon>,
    ) -> Self {
        exons.sort_by_key(|e| e.start);
        Self {
            id: id.into(),
            chrom: chrom.into(),
            strand,
            exons,
        }
    }

    /// Exons sorted ascending by start.
    pub fn exons(&self) -> &[Exon] {
        &self.exons
    }

    /// Genomic bounds: min start / max end over all exons.
    ///
    /// `None` for a transcript that ended up with no exons; such a
    /// transcript contributes nothing to its gene's bounds and is never a
    /// match candidate.
    pub fn span(&self) -> Option<Span> {
        let start = self.exons.iter().map(|e| e.start).min()?;
        // Sorted by start only, so the widest end can sit anywhere.
        let end = self.exons.iter().map(|e| e.end).max()?;
        Some(Span::new(start, end))
    }
}

use serde::{Deserialize, Serialize};

use crate::model::transcript::Transcript;
use crate::types::{Span, Strand};

/// A gene: a set of transcripts at one locus.
///
/// `start`/`end` are either the explicit coordinates of a `gene` feature row
/// or, for genes only ever referenced as a transcript parent, the min/max
/// over all transcript exon bounds. A gene that got neither (no explicit row
/// and no exon-bearing transcripts) keeps `None` bounds; callers treat that
/// as an unresolved gene, not an error.
///
/// Transcripts are owned exclusively by their gene, in file insertion order.
/// The builder filters out chrom/strand-inconsistent transcripts before a
/// `Gene` is ever constructed, so a finished gene never holds one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    #[serde(rename = "gene_id")]
    pub id: String,
    pub chrom: String,
    pub strand: Strand,
    pub start: Option<u32>,
    pub end: Option<u32>,
    transcripts: Vec<Transcript>,
}

impl Gene {
    /// Materialize a gene from its final transcript list.
    ///
    /// `explicit` carries the coordinates of a `gene` feature row when one
    /// was present; otherwise bounds are computed here from the transcripts.
    pub fn new(
        id: impl Into<String>,
        chrom: impl Into<String>,
        strand: Strand,
        explicit: Option<Span>,
        transcripts: Vec<Transcript>,
    ) -> Self {
        let (start, end) = match explicit {
            Some(span) => (Some(span.start), Some(span.end)),
            None => {
                let spans: Vec<Span> = transcripts.iter().filter_map(|tx| tx.span()).collect();
                let start = spans.iter().map(|s| s.start).min();
                let end = spans.iter().map(|s| s.end).max();
                (start, end)
            }
        };

        Self {
            id: id.into(),
            chrom: chrom.into(),
            strand,
            start,
            end,
            transcripts,
        }
    }

    /// Transcripts in file insertion order.
    pub fn transcripts(&self) -> &[Transcript] {
        &self.transcripts
    }

    /// Genomic bounds, `None` for an unresolved gene.
    pub fn span(&self) -> Option<Span> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(Span::new(start, end)),
            _ => None,
        }
    }
}

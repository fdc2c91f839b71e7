use serde::Serialize;

use crate::compare::matcher::best_matching_transcript;
use crate::model::{Exon, Gene, Transcript};

/// A reference exon paired with an overlapping predicted exon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExonPair {
    #[serde(rename = "ref")]
    pub reference: Exon,
    #[serde(rename = "pred")]
    pub predicted: Exon,
}

/// Exon-level diff between one reference and one predicted transcript.
///
/// The four buckets are ordered by reference exon position (matched,
/// partial, missing) or predicted exon position (extra), following each
/// transcript's sorted exon list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TranscriptDiff {
    /// Overlapping pairs with exactly equal start and end.
    pub matched: Vec<ExonPair>,
    /// Overlapping pairs with shifted boundaries.
    pub partial: Vec<ExonPair>,
    /// Reference exons with no overlapping predicted exon.
    pub missing: Vec<Exon>,
    /// Predicted exons with no overlapping reference exon.
    pub extra: Vec<Exon>,
}

impl TranscriptDiff {
    /// True when every exon on both sides matched exactly.
    pub fn is_identical(&self) -> bool {
        self.partial.is_empty() && self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Classify every exon of two transcripts by pairwise overlap.
///
/// Exact coordinate equality is the sole matched/partial discriminator;
/// there is no tolerance window and the exon/CDS distinction is ignored by
/// the decision (but carried through in the reported exons). One exon may
/// overlap several on the other side and then appears in several pairs; no
/// one-to-one assignment is enforced.
pub fn compare_transcripts(reference: &Transcript, predicted: &Transcript) -> TranscriptDiff {
    let mut diff = TranscriptDiff::default();

    for &ref_exon in reference.exons() {
        let mut overlapped = false;
        for &pred_exon in predicted.exons() {
            if !ref_exon.overlaps(pred_exon) {
                continue;
            }
            overlapped = true;
            let pair = ExonPair {
                reference: ref_exon,
                predicted: pred_exon,
            };
            if ref_exon.start == pred_exon.start && ref_exon.end == pred_exon.end {
                diff.matched.push(pair);
            } else {
                diff.partial.push(pair);
            }
        }
        if !overlapped {
            diff.missing.push(ref_exon);
        }
    }

    for &pred_exon in predicted.exons() {
        if !reference.exons().iter().any(|&r| pred_exon.overlaps(r)) {
            diff.extra.push(pred_exon);
        }
    }

    diff
}

/// Diff of one matched transcript pair, ready for transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptComparison {
    pub reference_transcript: String,
    pub predicted_transcript: String,
    #[serde(flatten)]
    pub diff: TranscriptDiff,
}

/// Compare two genes transcript by transcript.
///
/// Every predicted transcript is paired with its best-matching reference
/// transcript (strand-gated span overlap, see
/// [`best_matching_transcript`]); predicted transcripts with no acceptable
/// partner above `min_overlap` produce no entry.
pub fn compare_genes(
    reference: &Gene,
    predicted: &Gene,
    min_overlap: f64,
) -> Vec<TranscriptComparison> {
    let mut comparisons = Vec::new();

    for pred_tx in predicted.transcripts() {
        let Some(ref_tx) = best_matching_transcript(pred_tx, reference.transcripts(), min_overlap)
        else {
            continue;
        };
        comparisons.push(TranscriptComparison {
            reference_transcript: ref_tx.id.clone(),
            predicted_transcript: pred_tx.id.clone(),
            diff: compare_transcripts(ref_tx, pred_tx),
        });
    }

    comparisons
}

use std::collections::HashMap;

use serde::Serialize;

use crate::annotation::Annotation;
use crate::model::{Gene, Transcript};
use crate::types::Strand;

/// Default minimum overlap ratio for transcript pairing.
pub const DEFAULT_MIN_OVERLAP: f64 = 0.1;

/// One accepted reference/predicted gene pairing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneOverlap {
    pub ref_id: String,
    pub pred_id: String,
    pub overlap_ratio: f64,
}

/// Pair reference and predicted genes by genomic overlap.
///
/// Both collections are partitioned into `(chrom, strand)` buckets first:
/// genes on different contigs or strands never pair, and the all-pairs scan
/// runs only within one locus bucket rather than across the whole genome.
/// Pairs whose spans intersect with an overlap ratio (normalized by the
/// shorter gene) of at least `overlap_threshold` are kept, sorted by ratio
/// descending. Genes with unresolved bounds never match.
pub fn find_matching_genes(
    reference: &Annotation,
    predicted: &Annotation,
    overlap_threshold: f64,
) -> Vec<GeneOverlap> {
    let ref_buckets = bucket_by_locus(reference);
    let pred_buckets = bucket_by_locus(predicted);

    let mut matches = Vec::new();
    for (locus, ref_genes) in &ref_buckets {
        let Some(pred_genes) = pred_buckets.get(locus) else {
            continue;
        };

        for ref_gene in ref_genes {
            let Some(ref_span) = ref_gene.span() else {
                continue;
            };
            for pred_gene in pred_genes {
                let Some(pred_span) = pred_gene.span() else {
                    continue;
                };
                if !ref_span.intersects(pred_span) {
                    continue;
                }
                let ratio = ref_span.overlap_ratio(pred_span);
                if ratio >= overlap_threshold {
                    matches.push(GeneOverlap {
                        ref_id: ref_gene.id.clone(),
                        pred_id: pred_gene.id.clone(),
                        overlap_ratio: ratio,
                    });
                }
            }
        }
    }

    // Ratio descending; ties broken by ids so the output never depends on
    // map traversal order.
    matches.sort_by(|a, b| {
        b.overlap_ratio
            .total_cmp(&a.overlap_ratio)
            .then_with(|| a.ref_id.cmp(&b.ref_id))
            .then_with(|| a.pred_id.cmp(&b.pred_id))
    });
    matches
}

fn bucket_by_locus(annotation: &Annotation) -> HashMap<(&str, Strand), Vec<&Gene>> {
    let mut buckets: HashMap<(&str, Strand), Vec<&Gene>> = HashMap::new();
    for gene in annotation.genes().values() {
        buckets
            .entry((gene.chrom.as_str(), gene.strand))
            .or_default()
            .push(gene);
    }
    buckets
}

/// Span overlap ratio between two transcripts; 0.0 when either has no
/// exons (and therefore no bounds).
pub fn transcript_overlap_ratio(a: &Transcript, b: &Transcript) -> f64 {
    match (a.span(), b.span()) {
        (Some(sa), Some(sb)) => sa.overlap_ratio(sb),
        _ => 0.0,
    }
}

/// Among `candidates`, the reference transcript with the highest span
/// overlap ratio against `predicted`.
///
/// A strand mismatch disqualifies a candidate regardless of overlap. The
/// first candidate reaching the best score wins; `None` when the best score
/// stays below `min_overlap` (see [`DEFAULT_MIN_OVERLAP`]).
pub fn best_matching_transcript<'a>(
    predicted: &Transcript,
    candidates: &'a [Transcript],
    min_overlap: f64,
) -> Option<&'a Transcript> {
    let mut best: Option<&'a Transcript> = None;
    let mut best_score = 0.0_f64;

    for candidate in candidates {
        if candidate.strand != predicted.strand {
            continue;
        }
        let score = transcript_overlap_ratio(predicted, candidate);
        if score > best_score {
            best = Some(candidate);
            best_score = score;
        }
    }

    if best_score >= min_overlap {
        best
    } else {
        None
    }
}

pub mod diff;
pub mod matcher;

pub use diff::{compare_genes, compare_transcripts, ExonPair, TranscriptComparison, TranscriptDiff};
pub use matcher::{
    best_matching_transcript, find_matching_genes, transcript_overlap_ratio, GeneOverlap,
    DEFAULT_MIN_OVERLAP,
};

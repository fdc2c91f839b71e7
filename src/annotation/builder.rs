use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

use flate2::read::GzDecoder;
use log::debug;
use serde::Serialize;

use crate::annotation::io::{GffReader, GffRecord, ParseError};
use crate::model::{Exon, FeatureType, Gene, Transcript};
use crate::types::{Span, Strand};

/// Row-level diagnostics accumulated during one parse pass.
///
/// The default policy drops problem rows silently; these counters are how a
/// caller can still see what was lost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Data rows that parsed into records.
    pub records: u64,
    /// Rows with the wrong column count or unusable coordinates.
    pub skipped_malformed: u64,
    /// Rows missing a required attribute for their feature type.
    pub skipped_missing_attribute: u64,
    /// Buffered exons whose parent transcript was never declared.
    pub dangling_exons: u64,
    /// Transcripts dropped for disagreeing with their gene's chrom/strand.
    pub dropped_transcripts: u64,
    /// Genes synthesized for parent ids without an explicit gene row.
    pub synthesized_genes: u64,
}

/// High-level builder for parsing GFF3 into an [`Annotation`].
///
/// Lenient by default: malformed rows and rows missing required attributes
/// are skipped and counted, never fatal. `strict(true)` turns both into
/// errors for callers that want to reject broken files outright.
#[derive(Debug, Clone, Default)]
pub struct AnnotationBuilder {
    strict: bool,
}

impl AnnotationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail on malformed rows and missing required attributes instead of
    /// skipping them. I/O errors are fatal in either mode.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Parse annotation text already held in memory.
    pub fn parse_str(&self, content: &str) -> Result<Annotation, ParseError> {
        self.build_from_reader(Cursor::new(content.as_bytes()))
    }

    /// Parse from anything implementing `BufRead`.
    pub fn build_from_reader<R: BufRead>(&self, reader: R) -> Result<Annotation, ParseError> {
        let mut state = ParseState::default();

        for rec in GffReader::new(reader).records() {
            let rec = match rec {
                Ok(rec) => rec,
                Err(err @ (ParseError::Io { .. } | ParseError::IoPath { .. })) => return Err(err),
                Err(err) => {
                    if self.strict {
                        return Err(err);
                    }
                    state.stats.skipped_malformed += 1;
                    debug!("skipping unparseable row: {err}");
                    continue;
                }
            };

            state.stats.records += 1;

            if let Err(err) = state.dispatch(&rec) {
                if self.strict {
                    return Err(err);
                }
                state.stats.skipped_missing_attribute += 1;
                debug!(
                    "skipping {} row at {}:{}-{}: {err}",
                    rec.feature_type, rec.chrom, rec.start, rec.end
                );
            }
        }

        Ok(state.finish())
    }

    /// Parse from a file path; `.gz` input is decompressed transparently.
    pub fn build_from_path<P: AsRef<Path>>(&self, path: P) -> Result<Annotation, ParseError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ParseError::IoPath {
            path: path.display().to_string(),
            source: e,
        })?;

        let is_gz = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("gz"))
            .unwrap_or(false);

        if is_gz {
            self.build_from_reader(BufReader::new(GzDecoder::new(file)))
        } else {
            self.build_from_reader(BufReader::new(file))
        }
    }
}

/// Seed of a gene before transcripts are attached: the row (or transcript)
/// that introduced it, plus explicit bounds when a `gene` row supplied them.
#[derive(Debug, Clone)]
struct GeneSeed {
    chrom: String,
    strand: Strand,
    span: Option<Span>,
}

/// Seed of a transcript: locus plus the parent-gene id it named.
#[derive(Debug, Clone)]
struct TxSeed {
    chrom: String,
    strand: Strand,
    parent: String,
}

/// Accumulated parse state; `finish` runs the linking passes and
/// materializes the immutable model.
#[derive(Debug, Default)]
struct ParseState {
    gene_seeds: HashMap<String, GeneSeed>,
    tx_seeds: HashMap<String, TxSeed>,
    /// Transcript declaration order; genes keep their transcripts in this
    /// order and gene synthesis follows it deterministically.
    tx_order: Vec<String>,
    /// Exons buffered under their destination transcript id. Exon rows may
    /// precede the row that declares their transcript.
    exon_buffer: HashMap<String, Vec<Exon>>,
    stats: ParseStats,
}

impl ParseState {
    fn declare_transcript(&mut self, id: &str, parent: &str, rec: &GffRecord) {
        // Create-once: repeated declaration rows for the same id must not
        // reset an already-seeded transcript.
        if !self.tx_seeds.contains_key(id) {
            self.tx_seeds.insert(
                id.to_string(),
                TxSeed {
                    chrom: rec.chrom.clone(),
                    strand: rec.strand,
                    parent: parent.to_string(),
                },
            );
            self.tx_order.push(id.to_string());
        }
    }

    fn buffer_exon(&mut self, key: &str, rec: &GffRecord, feature_type: FeatureType) {
        self.exon_buffer
            .entry(key.to_string())
            .or_default()
            .push(Exon::new(rec.start, rec.end, feature_type));
    }

    fn dispatch(&mut self, rec: &GffRecord) -> Result<(), ParseError> {
        match rec.feature_type.as_str() {
            "gene" => {
                let id = rec.get_required("ID")?;
                // A later row redefining the same gene id wins.
                self.gene_seeds.insert(
                    id.to_string(),
                    GeneSeed {
                        chrom: rec.chrom.clone(),
                        strand: rec.strand,
                        span: Some(rec.span()),
                    },
                );
            }

            "mRNA" | "transcript" => {
                let id = rec.get_required("ID")?.to_string();
                let parent = rec.get_required("Parent")?;
                self.declare_transcript(&id, parent, rec);
            }

            "exon" => {
                // Alternate file convention: the exon row itself declares
                // its transcript via ID plus Parent/geneID.
                let declared = match (
                    rec.get_optional("ID"),
                    rec.attributes.first_of(&["Parent", "geneID"]),
                ) {
                    (Some(id), Some(gene_ref)) => {
                        let (id, gene_ref) = (id.to_string(), gene_ref.to_string());
                        self.declare_transcript(&id, &gene_ref, rec);
                        Some(id)
                    }
                    _ => None,
                };

                // The interval lands under Parent when present; a
                // declaration-only row (ID + geneID) carries its own
                // interval.
                let key = match rec.get_optional("Parent") {
                    Some(parent) => parent.to_string(),
                    None => match declared {
                        Some(id) => id,
                        None => rec.get_required("Parent")?.to_string(),
                    },
                };
                self.buffer_exon(&key, rec, FeatureType::Exon);
            }

            "CDS" => {
                let parent = rec.get_required("Parent")?.to_string();
                self.buffer_exon(&parent, rec, FeatureType::Cds);
            }

            // Any other feature type carries no structure we model.
            _ => {}
        }

        Ok(())
    }

    fn finish(mut self) -> Annotation {
        // Attach buffered exons to transcripts that were actually declared.
        let mut tx_exons: HashMap<String, Vec<Exon>> = HashMap::new();
        for (key, exons) in self.exon_buffer.drain() {
            if self.tx_seeds.contains_key(&key) {
                tx_exons.insert(key, exons);
            } else {
                self.stats.dangling_exons += exons.len() as u64;
                debug!(
                    "dropping {} exon(s) with undeclared parent transcript '{}'",
                    exons.len(),
                    key
                );
            }
        }

        // Synthesize genes for parent ids that never had a gene row, taking
        // chrom/strand from the first transcript that referenced them.
        for tx_id in &self.tx_order {
            let seed = &self.tx_seeds[tx_id];
            if !self.gene_seeds.contains_key(&seed.parent) {
                self.gene_seeds.insert(
                    seed.parent.clone(),
                    GeneSeed {
                        chrom: seed.chrom.clone(),
                        strand: seed.strand,
                        span: None,
                    },
                );
                self.stats.synthesized_genes += 1;
            }
        }

        // Materialize transcripts in declaration order, grouped by gene.
        let mut gene_transcripts: HashMap<String, Vec<Transcript>> = HashMap::new();
        for tx_id in std::mem::take(&mut self.tx_order) {
            let seed = self
                .tx_seeds
                .remove(&tx_id)
                .expect("every ordered transcript id has a seed");
            let exons = tx_exons.remove(&tx_id).unwrap_or_default();
            let tx = Transcript::new(tx_id, seed.chrom, seed.strand, exons);
            gene_transcripts.entry(seed.parent).or_default().push(tx);
        }

        // Materialize genes: consistency filter, then bounds.
        let mut genes = HashMap::with_capacity(self.gene_seeds.len());
        for (gene_id, seed) in self.gene_seeds.drain() {
            let mut transcripts = gene_transcripts.remove(&gene_id).unwrap_or_default();
            let before = transcripts.len();
            transcripts.retain(|tx| tx.chrom == seed.chrom && tx.strand == seed.strand);
            let dropped = before - transcripts.len();
            if dropped > 0 {
                self.stats.dropped_transcripts += dropped as u64;
                debug!(
                    "gene '{}': dropped {} transcript(s) with mismatched chrom/strand",
                    gene_id, dropped
                );
            }

            genes.insert(
                gene_id.clone(),
                Gene::new(gene_id, seed.chrom, seed.strand, seed.span, transcripts),
            );
        }

        Annotation {
            genes,
            stats: self.stats,
        }
    }
}

/// Lookup failure for a gene id absent from a parsed mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneNotFound {
    pub id: String,
}

impl fmt::Display for GeneNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gene '{}' not found in annotation", self.id)
    }
}

impl std::error::Error for GeneNotFound {}

/// The product of one parse pass: the gene mapping plus diagnostics.
///
/// Owns every gene (which in turn own their transcripts and exons); the
/// model is immutable from here on.
#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    genes: HashMap<String, Gene>,
    stats: ParseStats,
}

impl Annotation {
    pub fn genes(&self) -> &HashMap<String, Gene> {
        &self.genes
    }

    pub fn gene(&self, id: &str) -> Option<&Gene> {
        self.genes.get(id)
    }

    /// Lookup that reports absence as an error instead of `None` — the one
    /// condition callers are expected to surface to their users.
    pub fn require_gene(&self, id: &str) -> Result<&Gene, GeneNotFound> {
        self.gene(id).ok_or_else(|| GeneNotFound { id: id.to_string() })
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn stats(&self) -> ParseStats {
        self.stats
    }
}

/// Human-readable summary for logging and the CLI; per-chromosome counts
/// plus the diagnostics counters.
impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n_transcripts: usize = self.genes.values().map(|g| g.transcripts().len()).sum();
        let n_exons: usize = self
            .genes
            .values()
            .flat_map(|g| g.transcripts())
            .map(|tx| tx.exons().len())
            .sum();

        let mut per_chrom: HashMap<&str, (usize, usize)> = HashMap::new();
        for gene in self.genes.values() {
            let entry = per_chrom.entry(gene.chrom.as_str()).or_default();
            entry.0 += 1;
            entry.1 += gene.transcripts().len();
        }

        writeln!(
            f,
            "Annotation: {} genes, {} transcripts, {} exons, {} chromosomes",
            self.genes.len(),
            n_transcripts,
            n_exons,
            per_chrom.len()
        )?;

        let mut chroms: Vec<&str> = per_chrom.keys().copied().collect();
        chroms.sort_unstable();
        for chrom in chroms {
            let (genes, transcripts) = per_chrom[chrom];
            writeln!(f, "  - {}: genes={}, transcripts={}", chrom, genes, transcripts)?;
        }

        let s = &self.stats;
        write!(
            f,
            "  rows={} skipped_malformed={} skipped_missing_attribute={} dangling_exons={} dropped_transcripts={} synthesized_genes={}",
            s.records,
            s.skipped_malformed,
            s.skipped_missing_attribute,
            s.dangling_exons,
            s.dropped_transcripts,
            s.synthesized_genes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(content: &str) -> Annotation {
        AnnotationBuilder::new().parse_str(content).unwrap()
    }

    #[test]
    fn exons_sorted_regardless_of_file_order() {
        let gff = "\
chr1\tsrc\tgene\t100\t400\t.\t+\t.\tID=gene1
chr1\tsrc\tmRNA\t100\t400\t.\t+\t.\tID=tx1;Parent=gene1
chr1\tsrc\texon\t300\t400\t.\t+\t.\tParent=tx1
chr1\tsrc\texon\t100\t200\t.\t+\t.\tParent=tx1
";
        let ann = parse(gff);
        let gene = ann.gene("gene1").unwrap();
        let tx = &gene.transcripts()[0];
        let starts: Vec<u32> = tx.exons().iter().map(|e| e.start).collect();
        assert_eq!(starts, vec![100, 300]);
    }

    #[test]
    fn exons_may_precede_their_transcript_row() {
        let gff = "\
chr1\tsrc\texon\t100\t200\t.\t+\t.\tParent=tx1
chr1\tsrc\tmRNA\t100\t200\t.\t+\t.\tID=tx1;Parent=gene1
";
        let ann = parse(gff);
        let gene = ann.gene("gene1").unwrap();
        assert_eq!(gene.transcripts()[0].exons().len(), 1);
    }

    #[test]
    fn duplicate_gene_rows_last_wins() {
        let gff = "\
chr1\tsrc\tgene\t100\t200\t.\t+\t.\tID=gene1
chr1\tsrc\tgene\t500\t900\t.\t+\t.\tID=gene1
";
        let ann = parse(gff);
        let gene = ann.gene("gene1").unwrap();
        assert_eq!((gene.start, gene.end), (Some(500), Some(900)));
    }

    #[test]
    fn gene_synthesized_with_bounds_from_transcripts() {
        // No gene row at all: gene1 exists only as a Parent reference.
        let gff = "\
chr1\tsrc\tmRNA\t1\t1\t.\t-\t.\tID=tx1;Parent=gene1
chr1\tsrc\texon\t150\t250\t.\t-\t.\tParent=tx1
chr1\tsrc\texon\t400\t500\t.\t-\t.\tParent=tx1
chr1\tsrc\tmRNA\t1\t1\t.\t-\t.\tID=tx2;Parent=gene1
chr1\tsrc\texon\t100\t180\t.\t-\t.\tParent=tx2
";
        let ann = parse(gff);
        let gene = ann.gene("gene1").unwrap();
        assert_eq!(gene.strand, Strand::Minus);
        assert_eq!((gene.start, gene.end), (Some(100), Some(500)));
        assert_eq!(gene.transcripts().len(), 2);
        assert_eq!(ann.stats().synthesized_genes, 1);
    }

    #[test]
    fn exon_rows_can_declare_transcripts_via_gene_id_attribute() {
        // Alternate convention: no gene/mRNA rows, each exon row names its
        // transcript (ID) and gene (geneID).
        let gff = "\
chr2\tsrc\texon\t500\t600\t.\t+\t.\tID=txA;geneID=g7
chr2\tsrc\texon\t700\t800\t.\t+\t.\tID=txA;geneID=g7
";
        let ann = parse(gff);
        let gene = ann.gene("g7").unwrap();
        assert_eq!(gene.transcripts().len(), 1);
        let tx = &gene.transcripts()[0];
        assert_eq!(tx.id, "txA");
        assert_eq!(tx.exons().len(), 2);
        assert_eq!((gene.start, gene.end), (Some(500), Some(800)));
    }

    #[test]
    fn exon_rows_with_id_and_parent_also_declare_transcripts() {
        // Standard files attach exons via Parent; an ID on the same row also
        // declares a transcript keyed by that ID, whose parent reference is
        // the Parent value. The exon interval itself still follows Parent.
        let gff = "\
chr1\tsrc\tmRNA\t100\t200\t.\t+\t.\tID=tx1;Parent=gene1
chr1\tsrc\texon\t100\t200\t.\t+\t.\tID=ex1;Parent=tx1
";
        let ann = parse(gff);

        // The real transcript got the exon.
        let gene1 = ann.gene("gene1").unwrap();
        assert_eq!(gene1.transcripts()[0].exons().len(), 1);

        // The exon's own ID became a transcript under a synthesized gene
        // named after the Parent value.
        let shadow = ann.gene("tx1").unwrap();
        assert_eq!(shadow.transcripts().len(), 1);
        assert_eq!(shadow.transcripts()[0].id, "ex1");
        assert!(shadow.transcripts()[0].exons().is_empty());
        assert_eq!(shadow.span(), None);
    }

    #[test]
    fn cds_rows_attach_with_cds_feature_type() {
        let gff = "\
chr1\tsrc\tmRNA\t100\t400\t.\t+\t.\tID=tx1;Parent=gene1
chr1\tsrc\texon\t100\t400\t.\t+\t.\tParent=tx1
chr1\tsrc\tCDS\t150\t350\t.\t+\t0\tParent=tx1
";
        let ann = parse(gff);
        let tx = &ann.gene("gene1").unwrap().transcripts()[0];
        let kinds: Vec<FeatureType> = tx.exons().iter().map(|e| e.feature_type).collect();
        assert_eq!(kinds, vec![FeatureType::Exon, FeatureType::Cds]);
    }

    #[test]
    fn inconsistent_transcripts_are_dropped() {
        let gff = "\
chr1\tsrc\tgene\t100\t900\t.\t+\t.\tID=gene1
chr1\tsrc\tmRNA\t100\t400\t.\t+\t.\tID=tx_ok;Parent=gene1
chr1\tsrc\texon\t100\t400\t.\t+\t.\tParent=tx_ok
chr1\tsrc\tmRNA\t100\t400\t.\t-\t.\tID=tx_strand;Parent=gene1
chr1\tsrc\texon\t100\t400\t.\t-\t.\tParent=tx_strand
chr2\tsrc\tmRNA\t100\t400\t.\t+\t.\tID=tx_chrom;Parent=gene1
chr2\tsrc\texon\t100\t400\t.\t+\t.\tParent=tx_chrom
";
        let ann = parse(gff);
        let gene = ann.gene("gene1").unwrap();
        let ids: Vec<&str> = gene.transcripts().iter().map(|tx| tx.id.as_str()).collect();
        assert_eq!(ids, vec!["tx_ok"]);
        assert_eq!(ann.stats().dropped_transcripts, 2);
    }

    #[test]
    fn dangling_exons_are_dropped_and_counted() {
        let gff = "\
chr1\tsrc\tgene\t100\t200\t.\t+\t.\tID=gene1
chr1\tsrc\texon\t100\t200\t.\t+\t.\tParent=ghost
";
        let ann = parse(gff);
        assert_eq!(ann.len(), 1);
        assert_eq!(ann.stats().dangling_exons, 1);
    }

    #[test]
    fn exonless_gene_without_gene_row_is_unresolved() {
        let gff = "chr1\tsrc\tmRNA\t1\t1\t.\t+\t.\tID=tx1;Parent=gene1\n";
        let ann = parse(gff);
        let gene = ann.gene("gene1").unwrap();
        assert_eq!(gene.span(), None);
        assert_eq!(gene.transcripts().len(), 1);
        assert_eq!(gene.transcripts()[0].span(), None);
    }

    #[test]
    fn lenient_mode_counts_skipped_rows() {
        let gff = "\
chr1\tsrc\tgene\t100\t200\t.\t+\t.\tID=gene1
chr1\tsrc\tgene\t100\t200\t.\t+\t.\tName=no_id_here
not\ta\tgff\tline
chr1\tsrc\texon\t300\t200\t.\t+\t.\tParent=tx1
";
        let ann = parse(gff);
        assert_eq!(ann.len(), 1);
        let stats = ann.stats();
        assert_eq!(stats.skipped_malformed, 2);
        assert_eq!(stats.skipped_missing_attribute, 1);
    }

    #[test]
    fn strict_mode_surfaces_malformed_rows() {
        let builder = AnnotationBuilder::new().strict(true);

        let err = builder.parse_str("not\ta\tgff\tline\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedLine { .. }));

        let err = builder
            .parse_str("chr1\tsrc\tgene\t100\t200\t.\t+\t.\tName=x\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::MissingAttribute { key: "ID", .. }));
    }

    #[test]
    fn require_gene_reports_missing_ids() {
        let ann = parse("chr1\tsrc\tgene\t100\t200\t.\t+\t.\tID=gene1\n");
        assert!(ann.require_gene("gene1").is_ok());
        let err = ann.require_gene("nope").unwrap_err();
        assert_eq!(err.id, "nope");
    }

    #[test]
    fn build_from_path_reads_gzipped_input() {
        let gff = "\
chr1\tsrc\tgene\t100\t400\t.\t+\t.\tID=gene1
chr1\tsrc\tmRNA\t100\t400\t.\t+\t.\tID=tx1;Parent=gene1
chr1\tsrc\texon\t100\t400\t.\t+\t.\tParent=tx1
";
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("ann.gff3");
        std::fs::write(&plain, gff).unwrap();

        let gz = dir.path().join("ann.gff3.gz");
        let mut enc = flate2::write::GzEncoder::new(
            File::create(&gz).unwrap(),
            flate2::Compression::default(),
        );
        enc.write_all(gff.as_bytes()).unwrap();
        enc.finish().unwrap();

        let builder = AnnotationBuilder::new();
        for path in [plain, gz] {
            let ann = builder.build_from_path(&path).unwrap();
            assert_eq!(ann.len(), 1, "failed for {}", path.display());
            assert_eq!(ann.gene("gene1").unwrap().transcripts().len(), 1);
        }
    }
}

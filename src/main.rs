use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use gff3_compare::compare::{compare_genes, find_matching_genes, DEFAULT_MIN_OVERLAP};
use gff3_compare::{Annotation, AnnotationBuilder};

/// Parse GFF3 annotations and compare predicted gene structures against a
/// reference.
#[derive(Parser, Debug)]
#[command(name = "gff3-compare")]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse one annotation file and print a summary
    Parse(ParseArgs),

    /// Compare a predicted annotation against a reference
    Compare(CompareArgs),
}

#[derive(Args, Debug)]
struct ParseArgs {
    /// Input annotation file (.gff3, optionally gzipped)
    #[arg(long, short)]
    annotation: PathBuf,

    /// Emit the full gene model as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Fail on malformed rows instead of skipping them
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// Reference annotation file (.gff3, optionally gzipped)
    #[arg(long, short)]
    reference: PathBuf,

    /// Predicted annotation file (.gff3, optionally gzipped)
    #[arg(long, short)]
    predicted: PathBuf,

    /// Diff this gene's transcripts in both files; without it, list the
    /// matching gene pairs instead
    #[arg(long, short)]
    gene_id: Option<String>,

    /// Minimum gene overlap ratio for the pair listing
    #[arg(long, short, default_value_t = 0.5)]
    threshold: f64,

    /// Minimum transcript overlap ratio when pairing transcripts
    #[arg(long, default_value_t = DEFAULT_MIN_OVERLAP)]
    min_overlap: f64,
}

fn load(path: &Path, strict: bool) -> Result<Annotation> {
    AnnotationBuilder::new()
        .strict(strict)
        .build_from_path(path)
        .with_context(|| format!("parsing annotation {}", path.display()))
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Parse(args) => {
            let annotation = load(&args.annotation, args.strict)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(annotation.genes())?);
            } else {
                println!("{annotation}");
            }
        }

        Command::Compare(args) => {
            let reference = load(&args.reference, false)?;
            let predicted = load(&args.predicted, false)?;

            match args.gene_id {
                Some(gene_id) => {
                    let ref_gene = reference
                        .require_gene(&gene_id)
                        .with_context(|| format!("in reference {}", args.reference.display()))?;
                    let pred_gene = predicted
                        .require_gene(&gene_id)
                        .with_context(|| format!("in predicted {}", args.predicted.display()))?;

                    let comparisons = compare_genes(ref_gene, pred_gene, args.min_overlap);
                    let out = serde_json::json!({
                        "gene_id": gene_id,
                        "comparisons": comparisons,
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }

                None => {
                    let matches = find_matching_genes(&reference, &predicted, args.threshold);
                    eprintln!(
                        "{} gene pair(s) above overlap threshold {}",
                        matches.len(),
                        args.threshold
                    );
                    println!("{}", serde_json::to_string_pretty(&matches)?);
                }
            }
        }
    }

    Ok(())
}

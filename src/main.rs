use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::{generate, Shell};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use clinvar_lof_index::{
    default_index_path, write_gene_table, BuildConfig, BuildReport, BuildStats, GeneIndex,
    IndexBuilder, IndexWriter,
};

/// Build a per-gene index of ClinVar pathogenic loss-of-function variants
#[derive(Parser, Debug)]
#[command(
    name = "clinvar-lof-index",
    version,
    about = "Build a per-gene index of ClinVar pathogenic LOF variants",
    long_about = r#"
Scans a ClinVar variant_summary.txt.gz dump once and writes a binary index with,
for every gene carrying pathogenic loss-of-function variants:
- an exon histogram
- the protein positions of its variants
- the number of variants at or beyond each recorded position

Example:
  clinvar-lof-index variant_summary.txt.gz clinvar_lof_index.bin
"#
)]
#[command(arg_required_else_help = true, args_conflicts_with_subcommands = true)]
struct Cli {
    /// ClinVar variant_summary file (gzip, bzip2, xz or plain)
    #[arg(value_name = "VARIANT_SUMMARY", value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Index to write (default: clinvar_lof_index.bin beside the input)
    #[arg(value_name = "OUTPUT_INDEX", value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// TOML file overriding the classification heuristics and build settings
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Number of genes listed in the summary
    #[arg(long, value_name = "N")]
    top: Option<usize>,

    /// Also write the build summary as JSON
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    summary_json: Option<PathBuf>,

    /// Also write a per-gene TSV table
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    gene_table: Option<PathBuf>,

    /// Hide the progress spinner
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Look up a gene in an existing index
    Query {
        /// Index written by a previous build
        #[arg(value_hint = ValueHint::FilePath)]
        index: PathBuf,
        /// Gene symbol, e.g. BRCA1
        gene: String,
        /// Count variants at or beyond this protein position
        #[arg(short, long)]
        position: Option<u32>,
        /// Count variants annotated with this exon
        #[arg(short, long)]
        exon: Option<u32>,
        /// Enable verbose logging
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,
    },
    /// Generate shell completions
    Completions { shell: Shell },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
            return Ok(());
        }
        Some(Commands::Query {
            ref index,
            ref gene,
            position,
            exon,
            verbose,
        }) => {
            init_logging(verbose);
            return run_query(index, gene, position, exon);
        }
        None => {}
    }

    init_logging(cli.verbose);

    let Some(input) = cli.input.clone() else {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "the VARIANT_SUMMARY argument is required to build an index",
            )
            .exit();
    };

    let mut config = match &cli.config {
        Some(path) => BuildConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => BuildConfig::default(),
    };
    if let Some(top) = cli.top {
        config.top_genes = top;
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_index_path(&input));

    run_build(&cli, config, input, output)
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("clinvar_lof_index={}", level))
        .with_writer(io::stderr)
        .init();
}

fn run_build(cli: &Cli, config: BuildConfig, input: PathBuf, output: PathBuf) -> Result<()> {
    let pb = if cli.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };

    println!("{}", style("ClinVar Pathogenic LOF Variant Index Builder").bold().cyan());
    println!("  Input:  {}", style(input.display()).yellow());
    println!("  Output: {}", style(output.display()).yellow());
    println!();

    pb.set_message("Scanning variant summary...");
    let builder = IndexBuilder::new(config)?.with_progress(pb.clone());
    let outcome = builder
        .build(&input)
        .with_context(|| format!("Failed to build index from {}", input.display()))?;

    pb.set_message("Saving index...");
    let index_bytes = IndexWriter::new(&output).write(&outcome.index)?;
    pb.finish_and_clear();

    print_summary(&outcome.stats, &output, index_bytes);

    if let Some(path) = &cli.summary_json {
        BuildReport::new(&input, &output, index_bytes, &outcome.stats).write_json(path)?;
        info!("Wrote JSON summary to {}", path.display());
    }
    if let Some(path) = &cli.gene_table {
        write_gene_table(&outcome.index, path)?;
        info!("Wrote gene table to {}", path.display());
    }

    Ok(())
}

fn print_summary(stats: &BuildStats, output: &std::path::Path, index_bytes: u64) {
    println!(
        "{} Index saved to {} ({:.2} MB)",
        style("✓").green().bold(),
        style(output.display()).cyan(),
        index_bytes as f64 / (1024.0 * 1024.0)
    );
    println!();
    println!("  Lines scanned:                {}", stats.lines_scanned);
    println!("  Malformed lines skipped:      {}", stats.malformed_lines);
    println!("  Total genes indexed:          {}", style(stats.total_genes).bold());
    println!(
        "  Total pathogenic LOF variants: {}",
        style(stats.qualifying_variants).bold()
    );
    println!("  Protein positions recorded:   {}", stats.positions_recorded);

    if stats.top_genes.is_empty() {
        return;
    }

    println!();
    println!(
        "{}",
        style(format!(
            "Top {} genes by pathogenic LOF variant count:",
            stats.top_genes.len()
        ))
        .bold()
    );
    for (i, gene) in stats.top_genes.iter().enumerate() {
        println!(
            "  {:2}. {:<10} : {} variants ({} with exon annotation)",
            i + 1,
            style(&gene.symbol).green(),
            gene.variants,
            gene.exon_annotated
        );
    }
}

fn run_query(
    index_path: &std::path::Path,
    gene: &str,
    position: Option<u32>,
    exon: Option<u32>,
) -> Result<()> {
    let index = GeneIndex::load(index_path)
        .with_context(|| format!("Failed to load index {}", index_path.display()))?;

    let Some(entry) = index.get(gene) else {
        println!(
            "{} {} has no pathogenic LOF variants in this index",
            style("✗").red(),
            style(gene).bold()
        );
        return Ok(());
    };

    println!("{}", style(&entry.symbol).bold().cyan());
    println!("  Pathogenic LOF variants: {}", entry.variant_count());
    println!("  With protein position:   {}", entry.positions.len());
    println!("  With exon annotation:    {}", entry.exon_annotated());
    if let (Some(min), Some(max)) = (entry.min_position(), entry.max_position()) {
        println!("  Position range:          {}-{}", min, max);
    }

    if let Some(position) = position {
        println!(
            "  At or beyond p.{}:       {}",
            position,
            style(entry.truncated_at_or_beyond(position)).bold()
        );
    }
    if let Some(exon) = exon {
        println!(
            "  In exon {}:               {}",
            exon,
            style(entry.exon_count(exon)).bold()
        );
    }

    Ok(())
}

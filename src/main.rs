#![allow(clippy::too_many_arguments)]

//! annocmp: gene annotation comparison
//!
//! Usage: annocmp <COMMAND> [OPTIONS]

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use annocmp::commands::{CompareCommand, LociCommand};
use annocmp::config::CompareConfig;
use annocmp::error::{CompareError, Result};
use annocmp::report::ReportFormat;

#[derive(Parser)]
#[command(name = "annocmp")]
#[command(version)]
#[command(
    about = "annocmp: locus clustering and comparison of gene annotations",
    long_about = None
)]
struct Cli {
    /// Number of threads to use (default: number of CPUs)
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Csv,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => ReportFormat::Text,
            FormatArg::Csv => ReportFormat::Csv,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a prediction annotation against a reference annotation
    Compare {
        /// Reference GFF3 file(s)
        #[arg(short, long = "refr", required = true)]
        refr: Vec<PathBuf>,

        /// Prediction GFF3 file(s)
        #[arg(short, long = "pred", required = true)]
        pred: Vec<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Per-locus report format
        #[arg(long, value_enum, default_value = "text")]
        format: FormatArg,

        /// Transcripts per source above which clique enumeration is skipped (0 = no limit)
        #[arg(long, default_value = "32")]
        max_transcripts: usize,

        /// Clique pairs per locus above which comparison is skipped (0 = no limit)
        #[arg(long, default_value = "1024")]
        max_comparisons: usize,

        /// Identity tolerance for a perfect match
        #[arg(long, default_value = "1e-6")]
        tolerance: f64,

        /// Print model vectors for each comparison
        #[arg(long)]
        vectors: bool,

        /// Only print the run summary
        #[arg(long)]
        summary_only: bool,

        /// Name of the reference shown in the summary
        #[arg(long)]
        refr_label: Option<String>,

        /// Name of the prediction shown in the summary
        #[arg(long)]
        pred_label: Option<String>,
    },

    /// Cluster one annotation source into loci
    Loci {
        /// Input GFF3 file(s)
        #[arg(short, long, required = true)]
        input: Vec<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logger(verbose: u8) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn open_output(output: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn label_for(label: Option<String>, paths: &[PathBuf]) -> String {
    label.unwrap_or_else(|| {
        paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(",")
    })
}

fn run_compare(
    refr: Vec<PathBuf>,
    pred: Vec<PathBuf>,
    output: Option<PathBuf>,
    format: FormatArg,
    max_transcripts: usize,
    max_comparisons: usize,
    tolerance: f64,
    vectors: bool,
    summary_only: bool,
    refr_label: Option<String>,
    pred_label: Option<String>,
) -> Result<()> {
    if !(0.0..1.0).contains(&tolerance) {
        return Err(CompareError::InvalidArgument(format!(
            "tolerance must be in [0, 1), got {}",
            tolerance
        )));
    }

    let config = CompareConfig::new()
        .with_max_transcripts(max_transcripts)
        .with_max_clique_pairs(max_comparisons)
        .with_tolerance(tolerance)
        .with_model_vectors(vectors);
    let cmd = CompareCommand::new()
        .with_config(config)
        .with_format(format.into())
        .with_summary_only(summary_only)
        .with_labels(label_for(refr_label, &refr), label_for(pred_label, &pred));

    let mut out = open_output(output.as_ref())?;
    let run = cmd.run(&refr, &pred, &mut out)?;
    if !run.failures.is_empty() {
        log::warn!("{} sequence(s) could not be compared", run.failures.len());
    }
    Ok(())
}

fn run_loci(input: Vec<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let mut out = open_output(output.as_ref())?;
    let listing = LociCommand::new().run(&input, &mut out)?;
    if !listing.failures.is_empty() {
        log::warn!("{} sequence(s) could not be clustered", listing.failures.len());
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    // Configure thread pool if --threads specified
    if let Some(n) = cli.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(n).build_global() {
            eprintln!("Error: failed to initialize thread pool: {}", e);
            process::exit(1);
        }
    }

    let result = match cli.command {
        Commands::Compare {
            refr,
            pred,
            output,
            format,
            max_transcripts,
            max_comparisons,
            tolerance,
            vectors,
            summary_only,
            refr_label,
            pred_label,
        } => run_compare(
            refr,
            pred,
            output,
            format,
            max_transcripts,
            max_comparisons,
            tolerance,
            vectors,
            summary_only,
            refr_label,
            pred_label,
        ),

        Commands::Loci { input, output } => run_loci(input, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

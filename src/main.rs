use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use stannie::engine::{build_engine, EngineKind};
use stannie::pipeline::{process_documents, PipelineConfig};
use stannie::reader::ReaderConfig;
use stannie::AnnotationSelector;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stannie")]
#[command(about = "Highlights named entities in documents with offset-accurate inline markup")]
#[command(version)]
struct Args {
    /// Documents to annotate: file paths, file:// or http(s):// URLs
    #[arg(required = true)]
    locators: Vec<String>,

    /// Entity types to highlight (comma-separated, case-sensitive)
    #[arg(long, value_delimiter = ',', default_value = "Person,Location")]
    types: Vec<String>,

    /// Annotation engine
    #[arg(long, value_enum, default_value_t = EngineKind::Gazetteer)]
    engine: EngineKind,

    /// TOML phrase lists for the gazetteer engine (built-in lists otherwise)
    #[arg(long)]
    gazetteer: Option<PathBuf>,

    /// Directory receiving annotated_<n>.html and annotated_<n>.xml
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Documents processed concurrently (default: number of CPUs)
    #[arg(long)]
    jobs: Option<usize>,

    /// Skip the XML rendition
    #[arg(long)]
    no_xml: bool,

    /// Abort on first error
    #[arg(long)]
    fail_fast: bool,

    /// Suppress console progress bars
    #[arg(long)]
    no_progress: bool,

    /// Stats output file path
    #[arg(long, default_value = "run_stats.json")]
    stats_out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // WHY: logs go to stderr as JSON so stdout stays a readable run summary
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let args = Args::parse();

    info!("Starting stannie");
    info!(?args, "Parsed CLI arguments");

    let types: Vec<String> = args
        .types
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if types.is_empty() {
        anyhow::bail!("--types needs at least one entity type");
    }

    let engine = build_engine(args.engine, args.gazetteer.as_deref())?;

    let config = PipelineConfig {
        selector: AnnotationSelector::new(types),
        output_dir: args.output_dir.clone(),
        write_xml: !args.no_xml,
        jobs: args.jobs.unwrap_or_else(num_cpus::get).max(1),
        fail_fast: args.fail_fast,
        reader: ReaderConfig::default(),
    };

    let progress = if args.no_progress {
        None
    } else {
        let pb = ProgressBar::new(args.locators.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        Some(pb)
    };

    let run = process_documents(&args.locators, engine, &config, progress).await?;

    let stats_json = serde_json::to_string_pretty(&run)?;
    tokio::fs::write(&args.stats_out, stats_json)
        .await
        .with_context(|| format!("Failed to write stats to {}", args.stats_out.display()))?;

    println!("stannie v{} - annotation complete", env!("CARGO_PKG_VERSION"));
    println!("  Documents processed: {}", run.documents_processed);
    if run.documents_failed > 0 {
        println!("  Documents failed: {}", run.documents_failed);
        for stats in run.document_stats.iter().filter(|s| s.is_failed()) {
            println!("    {}: {}", stats.locator, stats.error.as_deref().unwrap_or("unknown error"));
        }
    }
    println!("  Annotations highlighted: {}", run.total_annotations_written);
    println!("  Stats written to {}", args.stats_out.display());

    if run.documents_failed > 0 {
        anyhow::bail!("{} of {} documents failed", run.documents_failed, args.locators.len());
    }
    Ok(())
}

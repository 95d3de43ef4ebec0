// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use kb_embeddings::pipeline::check_uniform_dimension;
use kb_embeddings::utils::logging::{format_info, format_success, format_warning, init_logger};
use kb_embeddings::{
    Config, EmbeddingClient, JsonExporter, KnowledgeIndex, Validator, read_records, run_build,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "kb_embeddings")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Build embeddings for a knowledge-base CSV and export a JSON index", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed every row of a CSV (columns: id, search_text) into a Parquet file
    Build {
        /// Input CSV file
        #[arg(long, value_name = "CSV")]
        input: Option<PathBuf>,

        /// Output Parquet file
        #[arg(long, value_name = "PARQUET")]
        out: Option<PathBuf>,

        /// Embedding model name
        #[arg(long)]
        model: Option<String>,

        /// Rows per API call
        #[arg(long, value_name = "NUM")]
        batch: Option<usize>,

        /// Disable the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Convert a Parquet embeddings file into a JSON index
    Export {
        #[arg(long, value_name = "PARQUET")]
        input: Option<PathBuf>,

        #[arg(long, value_name = "JSON")]
        out: Option<PathBuf>,

        #[arg(short, long)]
        pretty: bool,
    },

    /// Report record count and vector dimension of a Parquet embeddings file
    Verify {
        #[arg(long, value_name = "PARQUET")]
        input: Option<PathBuf>,
    },

    /// Search the JSON index by semantic similarity
    Search {
        /// Search query text
        query: String,

        #[arg(long, value_name = "JSON")]
        index: Option<PathBuf>,

        /// CSV with id and answer (or cleaned_answer) columns joined onto hits
        #[arg(long, value_name = "CSV")]
        answers: Option<PathBuf>,

        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        #[arg(short, long)]
        threshold: Option<f64>,

        /// Print the outcome as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger(cli.color, cli.verbose);

    let config = if cli.config.exists() {
        info!("Loading configuration from: {}", cli.config.display());
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using defaults and environment",
            cli.config.display()
        );
        Config::load(None).context("Failed to load configuration")?
    };

    match cli.command {
        Commands::Build {
            input,
            out,
            model,
            batch,
            no_progress,
        } => {
            let mut config = config;
            if let Some(input) = input {
                config.paths.input_csv = input;
            }
            if let Some(out) = out {
                config.paths.parquet = out;
            }
            if let Some(model) = model {
                config.embedding.model = model;
            }
            if let Some(batch) = batch {
                config.embedding.batch_size = batch;
            }
            cmd_build(&config, !no_progress && cli.color, cli.color).await?;
        }
        Commands::Export { input, out, pretty } => {
            let input = input.unwrap_or_else(|| config.paths.parquet.clone());
            let out = out.unwrap_or_else(|| config.paths.json_index.clone());
            cmd_export(&input, &out, pretty)?;
        }
        Commands::Verify { input } => {
            let input = input.unwrap_or_else(|| config.paths.parquet.clone());
            cmd_verify(&input)?;
        }
        Commands::Search {
            query,
            index,
            answers,
            top_k,
            threshold,
            json,
        } => {
            let mut config = config;
            if let Some(index) = index {
                config.paths.json_index = index;
            }
            if answers.is_some() {
                config.paths.answers_csv = answers;
            }
            if let Some(top_k) = top_k {
                config.search.top_k = top_k;
            }
            if let Some(threshold) = threshold {
                config.search.threshold = threshold;
            }
            cmd_search(&config, &query, json).await?;
        }
    }

    Ok(())
}

async fn cmd_build(config: &Config, show_progress: bool, colored: bool) -> Result<()> {
    let report = run_build(config, show_progress, colored)
        .await
        .with_context(|| format!("Build from {} failed", config.paths.input_csv.display()))?;

    if report.retries > 0 {
        println!(
            "{}",
            format_warning(&format!("{} requests were retried", report.retries))
        );
    }
    println!(
        "{}",
        format_success(&format!(
            "Saved {} embeddings to: {}",
            report.records,
            report.output.display()
        ))
    );
    println!(
        "{}",
        format_info(&format!("Vector dimension: {}", report.stats.dimension))
    );

    Ok(())
}

fn cmd_export(input: &Path, out: &Path, pretty: bool) -> Result<()> {
    Validator::validate_file_path(input)?;

    let summary = JsonExporter::new(pretty)
        .export_file(input, out)
        .context("JSON export failed")?;

    println!(
        "{}",
        format_success(&format!(
            "Wrote {} records to {}",
            summary.records,
            summary.path.display()
        ))
    );
    println!(
        "{}",
        format_info(&format!(
            "Vector dimension: {}, exported at {}",
            summary.dimension, summary.exported_at
        ))
    );

    Ok(())
}

fn cmd_verify(input: &Path) -> Result<()> {
    Validator::validate_file_path(input)?;

    let records = read_records(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let dimension = check_uniform_dimension(&records).context("Embedding file is inconsistent")?;

    let empty = records.iter().filter(|r| r.search_text.is_empty()).count();
    if empty > 0 {
        println!(
            "{}",
            format_warning(&format!("{} records have empty search_text", empty))
        );
    }
    println!(
        "{}",
        format_success(&format!(
            "{}: {} records, vector dimension {}",
            input.display(),
            records.len(),
            dimension
        ))
    );

    Ok(())
}

async fn cmd_search(config: &Config, query: &str, json: bool) -> Result<()> {
    Validator::validate_threshold(config.search.threshold)?;
    let api_key = config.api_key()?;

    let mut index = KnowledgeIndex::load(&config.paths.json_index)
        .with_context(|| format!("Failed to load {}", config.paths.json_index.display()))?;
    if index.is_empty() {
        println!("{}", format_warning("Index is empty"));
        return Ok(());
    }
    if let Some(answers) = &config.paths.answers_csv {
        index = index.with_answers(answers)?;
    }

    let client = EmbeddingClient::new(api_key, &config.embedding)?;
    let outcome = index
        .search(
            &client,
            query,
            &config.search.query_prefix,
            config.search.top_k,
            config.search.threshold,
        )
        .await
        .context("Search failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    for hit in &outcome.hits {
        println!("{}", hit.format_summary(120));
    }
    match outcome.best() {
        Some(best) if outcome.use_knowledge_base => println!(
            "{}",
            format_success(&format!(
                "Best match {} scores {:.4} (threshold {})",
                best.id, best.score, config.search.threshold
            ))
        ),
        Some(best) => println!(
            "{}",
            format_warning(&format!(
                "Best match {} scores {:.4}, below threshold {}",
                best.id, best.score, config.search.threshold
            ))
        ),
        None => println!(
            "{}",
            format_warning("No index record matches the query dimension")
        ),
    }

    Ok(())
}

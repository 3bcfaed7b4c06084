//! Covenant CLI - batch clause extraction and summarization for contracts

use anyhow::{bail, Context, Result};
use clap::Parser;
use covenant_domain::{DocumentId, RawDocument};
use covenant_extract::{BatchReport, ContractPipeline, PipelineConfig};
use covenant_index::{ClauseIndex, DEFAULT_TOP_K};
use covenant_llm::chat::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use covenant_llm::embeddings::{DEFAULT_EMBED_DIMENSION, DEFAULT_EMBED_MODEL};
use covenant_llm::{ChatApiProvider, EmbeddingApiProvider};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "covenant",
    version,
    about = "Extract clauses and summaries from legal contracts"
)]
struct Cli {
    /// Directory of contract files (.pdf and .txt)
    input: PathBuf,

    /// Process at most this many documents
    #[arg(long)]
    limit: Option<usize>,

    /// Pipeline configuration file (TOML); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Chat model used for extraction and summaries
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// OpenAI-compatible API endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// API key for the endpoint
    #[arg(long, env = "MISTRAL_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Where to write the JSON results
    #[arg(long, default_value = "contract_analysis_results.json")]
    output: PathBuf,

    /// After the batch, run a similarity query over the extracted clauses
    #[arg(long)]
    query: Option<String>,

    /// Number of similarity hits to print
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            PipelineConfig::from_toml(&raw).map_err(anyhow::Error::msg)?
        }
        None => PipelineConfig::default(),
    };

    let documents = collect_documents(&cli.input, cli.limit)?;
    if documents.is_empty() {
        bail!("no .pdf or .txt files found in {}", cli.input.display());
    }
    info!(count = documents.len(), input = %cli.input.display(), "documents loaded");

    let provider = Arc::new(ChatApiProvider::new(
        &cli.endpoint,
        &cli.model,
        &cli.api_key,
    )?);
    let pipeline = Arc::new(ContractPipeline::new(provider, config.clone())?);

    let report = pipeline.run_batch(documents).await;
    print_report(&report);

    write_results(&report, &config, &cli.output)?;
    info!(output = %cli.output.display(), "results written");

    if let Some(query) = &cli.query {
        run_similarity_query(&cli, &report, query).await?;
    }

    Ok(())
}

/// Load contract files from a directory in name order
fn collect_documents(dir: &Path, limit: Option<usize>) -> Result<Vec<RawDocument>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading input directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| {
                    let ext = ext.to_ascii_lowercase();
                    ext == "pdf" || ext == "txt"
                })
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    if let Some(limit) = limit {
        paths.truncate(limit);
    }

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes =
            fs::read(&path).with_context(|| format!("reading document {}", path.display()))?;
        let id = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("unknown_contract");
        documents.push(RawDocument {
            id: DocumentId::new(id),
            bytes,
        });
    }
    Ok(documents)
}

fn print_report(report: &BatchReport) {
    info!(
        total = report.total(),
        succeeded = report.records.len(),
        failed = report.failures.len(),
        "batch complete"
    );
    for (clause_type, count) in report.found_counts() {
        info!(%clause_type, found_in = count, "clause coverage");
    }
    info!(mean_summary_words = report.mean_summary_words(), "summary statistics");
    for failure in &report.failures {
        info!(document = %failure.document, reason = %failure.reason, "document skipped");
    }
}

/// Write one flat JSON row per document. Absent clauses carry the
/// configured marker rather than an empty string.
fn write_results(report: &BatchReport, config: &PipelineConfig, output: &Path) -> Result<()> {
    let rows: Vec<serde_json::Value> = report
        .records
        .iter()
        .map(|record| {
            let mut row = json!({
                "document": record.document.as_str(),
                "summary": record.summary,
                "text_length": record.stats.text_len,
                "word_count": record.stats.word_count,
                "summary_word_count": record.stats.summary_word_count,
            });
            for (clause_type, clause) in &record.clauses {
                let value = clause
                    .span
                    .as_text()
                    .unwrap_or(&config.not_found_marker)
                    .to_string();
                row[format!("{clause_type}_clause")] = json!(value);
            }
            row
        })
        .collect();

    let body = serde_json::to_string_pretty(&rows)?;
    fs::write(output, body)
        .with_context(|| format!("writing results to {}", output.display()))?;
    Ok(())
}

/// Index every extracted span and print the nearest ones to the query
async fn run_similarity_query(cli: &Cli, report: &BatchReport, query: &str) -> Result<()> {
    let embedder = Arc::new(EmbeddingApiProvider::new(
        &cli.endpoint,
        DEFAULT_EMBED_MODEL,
        &cli.api_key,
        DEFAULT_EMBED_DIMENSION,
    )?);
    let index = ClauseIndex::new(embedder, Default::default());

    for record in &report.records {
        index.index_contract(record).await;
    }
    info!(indexed = index.len(), "clause spans indexed");

    let hits = index.query(query, cli.top_k).await?;
    if hits.is_empty() {
        println!("No similar clauses found for: {query}");
        return Ok(());
    }

    println!("Top {} clauses similar to: {query}", hits.len());
    for (rank, hit) in hits.iter().enumerate() {
        let preview: String = hit.record.text.chars().take(160).collect();
        println!(
            "{}. [{:.3}] {} ({}): {}",
            rank + 1,
            hit.similarity,
            hit.record.document,
            hit.record.clause_type,
            preview
        );
    }
    Ok(())
}

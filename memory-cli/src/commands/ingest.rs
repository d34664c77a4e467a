use crate::output::{print_result, OutputFormat};
use anyhow::Context;
use clap::Args;
use memory_core::embeddings::EmbeddingClient;
use memory_core::ingestion::{CandidateEntry, IngestionPipeline};
use memory_core::store::Store;
use memory_core::types::PatternType;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct IngestArgs {
    /// Path to a newline-delimited JSON file, one candidate entry per line.
    pub path: PathBuf,

    /// Re-ingest even if this file's content hasn't changed since last run.
    #[arg(long)]
    pub force: bool,
}

#[derive(Deserialize)]
struct IngestLine {
    domain: String,
    pattern_type: Option<String>,
    title: String,
    detail: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    source_section: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default = "default_channel")]
    channel: String,
}

fn default_channel() -> String {
    "atomic".to_string()
}

pub async fn run(
    args: IngestArgs,
    store: &Arc<dyn Store>,
    embeddings: &Arc<dyn EmbeddingClient>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.path)
        .with_context(|| format!("failed to read {}", args.path.display()))?;

    let mut candidates = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let parsed: IngestLine = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: malformed candidate entry", args.path.display(), line_no + 1))?;
        candidates.push(CandidateEntry {
            domain: parsed.domain,
            pattern_type: parsed.pattern_type.as_deref().and_then(PatternType::parse),
            title: parsed.title,
            detail: parsed.detail,
            source: parsed.source,
            source_section: parsed.source_section,
            tags: parsed.tags,
            channel: parsed.channel,
        });
    }

    let pipeline = IngestionPipeline::new(store.clone(), embeddings.clone());
    let source_key = args.path.to_string_lossy().to_string();
    let report = pipeline.ingest_source(&source_key, &raw, candidates, args.force).await?;

    print_result(format, &report, |r| {
        if r.skipped_unchanged_source {
            "skipped: source unchanged".to_string()
        } else {
            format!(
                "added={} skipped_id={} skipped_semantic={} errored={}",
                r.added, r.skipped_id, r.skipped_semantic, r.errored
            )
        }
    });
    Ok(())
}

use crate::output::{print_result, OutputFormat};
use clap::Args;
use memory_core::config::EngineConfig;
use memory_core::embeddings::EmbeddingClient;
use memory_core::retrieval::{RetrievalPipeline, RetrievalRequest};
use memory_core::store::Store;
use serde::Serialize;
use std::sync::Arc;

#[derive(Args)]
pub struct QueryArgs {
    /// Free-text query.
    pub text: String,

    /// Coarse domain hint; may be repeated.
    #[arg(long = "domain")]
    pub domains: Vec<String>,

    #[arg(long, default_value_t = 20)]
    pub max_entries: usize,

    #[arg(long, default_value_t = 800)]
    pub token_budget: u32,
}

#[derive(Serialize)]
struct QueryOutput {
    degraded: bool,
    items: Vec<QueryItem>,
}

#[derive(Serialize)]
struct QueryItem {
    id: String,
    title: String,
    score: f64,
    spread_origin: bool,
}

pub async fn run(
    args: QueryArgs,
    store: &Arc<dyn Store>,
    embeddings: &Arc<dyn EmbeddingClient>,
    engine_config: &EngineConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let pipeline = RetrievalPipeline::new(store.clone(), embeddings.clone(), engine_config.dimension);

    let mut request = RetrievalRequest::new(args.text);
    request.domains = args.domains;
    request.max_entries = args.max_entries;
    request.token_budget = args.token_budget;
    request.weights = engine_config.weights;

    let result = pipeline.retrieve(&request).await?;
    let output = QueryOutput {
        degraded: result.degraded,
        items: result
            .items
            .iter()
            .map(|i| QueryItem {
                id: i.memory.id.clone(),
                title: i.memory.title.clone(),
                score: i.score,
                spread_origin: i.spread_origin,
            })
            .collect(),
    };

    print_result(format, &output, |out| {
        let mut lines: Vec<String> = out
            .items
            .iter()
            .map(|i| format!("{} {} {:.4}", i.id, i.title, i.score))
            .collect();
        if out.degraded {
            lines.push("(degraded: activation-only retrieval)".to_string());
        }
        if lines.is_empty() {
            "no matches".to_string()
        } else {
            lines.join("\n")
        }
    });
    Ok(())
}

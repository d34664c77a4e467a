use crate::output::{print_result, OutputFormat};
use clap::Args;
use memory_core::embeddings::EmbeddingClient;
use memory_core::ingestion::backfill::{self, DEFAULT_BATCH_LIMIT};
use memory_core::store::Store;
use std::sync::Arc;

#[derive(Args)]
pub struct BackfillArgs {
    #[arg(long, default_value_t = DEFAULT_BATCH_LIMIT)]
    pub batch_size: usize,
}

pub async fn run(
    args: BackfillArgs,
    store: &Arc<dyn Store>,
    embeddings: &Arc<dyn EmbeddingClient>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let report = backfill::run(store, embeddings, args.batch_size).await?;
    print_result(format, &report, |r| {
        format!("scanned={} embedded={}", r.scanned, r.embedded)
    });
    Ok(())
}

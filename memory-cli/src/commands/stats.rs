use crate::output::{print_result, OutputFormat};
use memory_core::store::{Store, StoreStats};
use std::sync::Arc;

pub async fn run(store: &Arc<dyn Store>, format: OutputFormat) -> anyhow::Result<()> {
    let stats = store.stats().await?;
    print_result(format, &stats, human_summary);
    Ok(())
}

fn human_summary(s: &StoreStats) -> String {
    format!(
        "active={} deprecated={} domains={} activation[min={:.3} p50={:.3} p95={:.3} max={:.3}]",
        s.total_active,
        s.total_deprecated,
        s.by_domain.len(),
        s.activation_min,
        s.activation_p50,
        s.activation_p95,
        s.activation_max,
    )
}

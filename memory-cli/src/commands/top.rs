use crate::output::{print_result, OutputFormat};
use clap::Args;
use memory_core::store::Store;
use serde::Serialize;
use std::sync::Arc;

#[derive(Args)]
pub struct TopArgs {
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Restrict to a single domain (exact match).
    #[arg(long)]
    pub domain: Option<String>,
}

#[derive(Serialize)]
struct TopRow {
    id: String,
    domain: String,
    activation: f64,
}

pub async fn run(args: TopArgs, store: &Arc<dyn Store>, format: OutputFormat) -> anyhow::Result<()> {
    let memories = match &args.domain {
        Some(domain) => store.scan_by_domain(domain).await?,
        None => store.top_by_activation(args.limit).await?,
    };
    let rows: Vec<TopRow> = memories
        .into_iter()
        .take(args.limit)
        .map(|m| TopRow {
            id: m.id,
            domain: m.domain,
            activation: m.activation,
        })
        .collect();

    print_result(format, &rows, |rows| {
        if rows.is_empty() {
            "no memories".to_string()
        } else {
            rows.iter()
                .map(|r| format!("{} {} {:.4}", r.id, r.domain, r.activation))
                .collect::<Vec<_>>()
                .join("\n")
        }
    });
    Ok(())
}

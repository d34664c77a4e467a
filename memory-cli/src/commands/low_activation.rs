use crate::output::{print_result, OutputFormat};
use clap::Args;
use memory_core::store::Store;
use serde::Serialize;
use std::sync::Arc;

#[derive(Args)]
pub struct LowActivationArgs {
    #[arg(long, default_value_t = 0.05)]
    pub threshold: f64,

    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

#[derive(Serialize)]
struct LowActivationRow {
    id: String,
    activation: f64,
}

pub async fn run(args: LowActivationArgs, store: &Arc<dyn Store>, format: OutputFormat) -> anyhow::Result<()> {
    let memories = store.low_activation(args.threshold, args.limit).await?;
    let rows: Vec<LowActivationRow> = memories
        .into_iter()
        .map(|m| LowActivationRow {
            id: m.id,
            activation: m.activation,
        })
        .collect();

    print_result(format, &rows, |rows| {
        if rows.is_empty() {
            "no low-activation memories".to_string()
        } else {
            rows.iter()
                .map(|r| format!("{} {:.4}", r.id, r.activation))
                .collect::<Vec<_>>()
                .join("\n")
        }
    });
    Ok(())
}

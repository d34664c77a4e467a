use crate::output::{print_result, OutputFormat};
use clap::Args;
use memory_core::activation;
use memory_core::config::EngineConfig;
use memory_core::store::Store;
use serde::Serialize;
use std::sync::Arc;

#[derive(Args)]
pub struct DecayArgs {
    /// Multiplicative factor; defaults to the configured daily decay factor.
    #[arg(long)]
    pub factor: Option<f64>,
}

#[derive(Serialize)]
struct DecayOutput {
    factor: f64,
    affected: u64,
}

pub async fn run(
    args: DecayArgs,
    store: &Arc<dyn Store>,
    engine_config: &EngineConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let factor = args.factor.unwrap_or(engine_config.decay.daily_factor);
    let affected = activation::decay(store.as_ref(), factor).await?;
    print_result(
        format,
        &DecayOutput { factor, affected },
        |out| format!("decayed {} rows factor={:.5}", out.affected, out.factor),
    );
    Ok(())
}

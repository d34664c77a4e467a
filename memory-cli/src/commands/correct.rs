use crate::output::{print_result, OutputFormat};
use clap::Args;
use memory_core::store::Store;
use memory_core::supervision;
use serde::Serialize;
use std::sync::Arc;

#[derive(Args)]
pub struct CorrectArgs {
    pub correction_id: String,
    pub corrected_id: String,
}

#[derive(Serialize)]
struct CorrectOutput {
    correction_id: String,
    corrected_id: String,
}

pub async fn run(args: CorrectArgs, store: &Arc<dyn Store>, format: OutputFormat) -> anyhow::Result<()> {
    supervision::mark_correction(store.as_ref(), &args.correction_id, &args.corrected_id).await?;
    print_result(
        format,
        &CorrectOutput {
            correction_id: args.correction_id,
            corrected_id: args.corrected_id,
        },
        |out| format!("{} now corrects {}", out.correction_id, out.corrected_id),
    );
    Ok(())
}

use crate::output::{print_result, OutputFormat};
use clap::Args;
use memory_core::store::Store;
use memory_core::supervision;
use serde::Serialize;
use std::sync::Arc;

#[derive(Args)]
pub struct DeprecateArgs {
    pub old_id: String,
    pub new_id: String,
}

#[derive(Serialize)]
struct DeprecateOutput {
    old_id: String,
    new_id: String,
}

pub async fn run(args: DeprecateArgs, store: &Arc<dyn Store>, format: OutputFormat) -> anyhow::Result<()> {
    supervision::deprecate(store.as_ref(), &args.old_id, &args.new_id).await?;
    print_result(
        format,
        &DeprecateOutput {
            old_id: args.old_id,
            new_id: args.new_id,
        },
        |out| format!("deprecated {} in favour of {}", out.old_id, out.new_id),
    );
    Ok(())
}

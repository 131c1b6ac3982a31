//! Output command - print stack output values.

use anyhow::Result;
use clap::Args;

use tgprobe_terragrunt::{try_stack_output, try_stack_output_json};

use super::GlobalArgs;

#[derive(Args)]
pub struct OutputArgs {
    /// Output key; all outputs when omitted
    pub key: Option<String>,

    /// Print pretty JSON instead of the raw value
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(global: &GlobalArgs, args: &OutputArgs) -> Result<()> {
    let options = global.resolve_options()?;
    let key = args.key.as_deref().unwrap_or_default();

    // A bare `stack output` prints every unit's outputs, which only reads well as JSON.
    let value = if args.json || key.is_empty() {
        try_stack_output_json(&options, key).await?
    } else {
        try_stack_output(&options, key).await?
    };

    println!("{}", value);
    Ok(())
}

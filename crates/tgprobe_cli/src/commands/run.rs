//! Run command - `terragrunt stack run -- ARGS` on every unit.

use anyhow::Result;
use clap::Args;
use tracing::info;

use tgprobe_terragrunt::try_stack_run;

use super::GlobalArgs;

#[derive(Args)]
pub struct RunArgs {
    /// Arguments forwarded after `--` (e.g. `plan -lock=false`)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub args: Vec<String>,
}

pub async fn execute(global: &GlobalArgs, args: &RunArgs) -> Result<()> {
    let options = global.resolve_options()?;
    info!("Running stack command in {}: {}", options.terragrunt_dir.display(), args.args.join(" "));

    let forwarded: Vec<&str> = args.args.iter().map(String::as_str).collect();
    let output = try_stack_run(&options, &forwarded).await?;

    println!("{}", output);
    Ok(())
}

//! Clean command - `terragrunt stack clean`.

use anyhow::Result;
use tracing::info;

use tgprobe_terragrunt::try_stack_clean;

use super::GlobalArgs;

pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let options = global.resolve_options()?;
    info!("Cleaning stack in {}", options.terragrunt_dir.display());

    try_stack_clean(&options).await?;

    info!("Stack cleaned");
    Ok(())
}

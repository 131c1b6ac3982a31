//! Generate command - `terragrunt stack generate`.

use anyhow::Result;
use tracing::info;

use tgprobe_terragrunt::try_stack_generate;

use super::GlobalArgs;

pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let options = global.resolve_options()?;
    info!("Generating stack in {}", options.terragrunt_dir.display());

    try_stack_generate(&options).await?;

    info!("Stack generated");
    Ok(())
}

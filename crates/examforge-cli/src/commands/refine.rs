//! The `examforge refine` command.

use std::path::PathBuf;

use anyhow::Result;

use crate::context::AppContext;
use crate::ProviderArgs;

pub async fn execute(
    text: String,
    instruction: String,
    provider: ProviderArgs,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(!text.trim().is_empty(), "nothing to refine");
    let ctx = AppContext::load(config_path.as_deref()).await?;
    let refined = ctx.client(&provider)?.refine_text(&text, &instruction).await?;
    println!("{refined}");
    Ok(())
}

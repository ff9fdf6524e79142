//! The `examforge regenerate` command.

use std::path::PathBuf;

use anyhow::Result;

use examforge_core::model::RegenerationMode;
use examforge_core::normalize::normalize;

use crate::context::AppContext;
use crate::ProviderArgs;

pub async fn execute(
    number: usize,
    mode: RegenerationMode,
    provider: ProviderArgs,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut ctx = AppContext::load(config_path.as_deref()).await?;
    let (index, _) = ctx.question(number)?;
    let generator = ctx.generator_config();

    let workspace = ctx.workspace(&provider)?;
    let question = workspace.regenerate(&generator, index, mode).await?;
    println!("Question {number} ({mode}): {}", normalize(&question.question));

    let exam = workspace.snapshot().await;
    ctx.save(generator, exam);
    ctx.finish().await
}

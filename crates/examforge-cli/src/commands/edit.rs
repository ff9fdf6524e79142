//! The `examforge edit` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examforge_core::model::Question;

use crate::context::AppContext;

pub async fn execute(number: usize, file: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let content = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let question: Question = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse question from {}", file.display()))?;

    let mut ctx = AppContext::load(config_path.as_deref()).await?;
    let (index, _) = ctx.question(number)?;

    let workspace = ctx.offline_workspace();
    let question = workspace.update_question(index, question).await?;
    println!("Question {number} updated (id {})", question.id);

    let exam = workspace.snapshot().await;
    let generator = ctx.generator_config();
    ctx.save(generator, exam);
    ctx.finish().await
}

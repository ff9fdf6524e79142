//! The `examforge chat` command: one turn with the didactic coach.

use std::path::PathBuf;

use anyhow::Result;

use examforge_core::model::ChatMessage;

use crate::context::AppContext;
use crate::ProviderArgs;

pub async fn execute(
    message: Option<String>,
    reset: bool,
    provider: ProviderArgs,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        reset || message.is_some(),
        "nothing to send, pass --message or --reset"
    );
    let mut ctx = AppContext::load(config_path.as_deref()).await?;
    let mut history = if reset { Vec::new() } else { ctx.chat().to_vec() };

    match message {
        Some(text) => {
            anyhow::ensure!(!text.trim().is_empty(), "chat message is empty");
            history.push(ChatMessage::user(text));
            let reply = ctx
                .client(&provider)?
                .chat(&history, &ctx.generator_config())
                .await?;
            println!("{reply}");
            history.push(ChatMessage::model(reply));
        }
        None => println!("Conversation cleared."),
    }

    tracing::debug!(turns = history.len(), "conversation updated");
    ctx.save_chat(history);
    ctx.finish().await
}

//! The `examforge show` and `examforge reset` commands.

use std::path::PathBuf;

use anyhow::Result;

use examforge_core::normalize::normalize;
use examforge_core::session::{JsonFileStore, SessionStore};
use examforge_providers::config::load_config_from;

use crate::commands::generate::print_exam_summary;
use crate::context::AppContext;

pub async fn execute(json: bool, config_path: Option<PathBuf>) -> Result<()> {
    let ctx = AppContext::load(config_path.as_deref()).await?;
    let exam = ctx.exam()?;

    if json {
        println!("{}", serde_json::to_string_pretty(exam)?);
        return Ok(());
    }

    print_exam_summary(exam);
    for (i, q) in exam.questions.iter().enumerate() {
        println!("\n{}. {}", i + 1, normalize(&q.question));
        for (idx, option) in q.option_list().iter().enumerate() {
            let letter = char::from(b'A' + (idx as u8 % 26));
            println!("   {letter}. {}", normalize(option));
        }
    }
    Ok(())
}

/// Clears the session without reading it, so a corrupt file can be removed.
pub async fn reset(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    JsonFileStore::new(&config.session_dir, &config.session_id)
        .clear()
        .await?;
    println!("Session cleared.");
    Ok(())
}

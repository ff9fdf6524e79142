//! The `examforge check` command.

use std::path::PathBuf;

use anyhow::Result;

use examforge_core::verify::{check_answer, AnswerStatus};

use crate::context::AppContext;

/// Parse option letters like "A,c" into zero-based indices.
fn parse_selection(select: &str) -> Result<Vec<usize>> {
    select
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => {
                    Ok((c.to_ascii_uppercase() as u8 - b'A') as usize)
                }
                _ => Err(anyhow::anyhow!("invalid option letter: '{s}'")),
            }
        })
        .collect()
}

pub async fn execute(number: usize, select: String, config_path: Option<PathBuf>) -> Result<()> {
    let selected = parse_selection(&select)?;
    anyhow::ensure!(!selected.is_empty(), "select at least one option");

    let ctx = AppContext::load(config_path.as_deref()).await?;
    let (_, question) = ctx.question(number)?;
    match check_answer(question, &selected)? {
        AnswerStatus::Correct => println!("Correct"),
        AnswerStatus::Incorrect => println!("Incorrect"),
    }
    Ok(())
}

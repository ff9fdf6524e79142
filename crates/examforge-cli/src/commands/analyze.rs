//! The `examforge cutoff` and `examforge matrix` commands.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examforge_core::analytics::{compute_cutoff, exam_matrix};

use crate::context::AppContext;

pub async fn cutoff(config_path: Option<PathBuf>) -> Result<()> {
    let ctx = AppContext::load(config_path.as_deref()).await?;
    let stats = compute_cutoff(&ctx.exam()?.questions);

    let mut table = Table::new();
    table.set_header(vec!["Total points", "Guessing score", "Cut-off", "Cut-off %"]);
    table.add_row(vec![
        Cell::new(stats.total_points),
        Cell::new(format!("{:.2}", stats.guessing_points)),
        Cell::new(format!("{:.2}", stats.cutoff_score)),
        Cell::new(format!("{:.1}%", stats.percentage)),
    ]);
    println!("{table}");
    Ok(())
}

fn numbers(list: &[usize]) -> String {
    list.iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn matrix(config_path: Option<PathBuf>) -> Result<()> {
    let ctx = AppContext::load(config_path.as_deref()).await?;
    let language = ctx.generator_config().language;
    let rows = exam_matrix(&ctx.exam()?.questions, language);

    let mut table = Table::new();
    table.set_header(vec![
        "Learning objective",
        "Reproduction",
        "Insight",
        "Application",
        "Total",
    ]);
    for row in &rows {
        table.add_row(vec![
            Cell::new(&row.learning_objective),
            Cell::new(numbers(&row.reproduction)),
            Cell::new(numbers(&row.insight)),
            Cell::new(numbers(&row.application)),
            Cell::new(row.total),
        ]);
    }
    println!("{table}");
    Ok(())
}

//! The `examforge export` command.

use std::path::PathBuf;

use anyhow::Result;

use examforge_export::{csv, document, naming, slides, write_export, ExportVariant};

use crate::context::AppContext;

const FORMATS: &[&str] = &["csv", "ans", "brightspace", "doc", "pptx"];

pub async fn execute(
    format: String,
    variant: ExportVariant,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let ctx = AppContext::load(config_path.as_deref()).await?;
    let exam = ctx.exam()?;
    let generator = ctx.generator_config();
    let dir = output.unwrap_or_else(|| ctx.config.output_dir.clone());
    let today = chrono::Local::now().date_naive();

    let formats: Vec<&str> = if format == "all" {
        FORMATS.to_vec()
    } else {
        format.split(',').map(str::trim).collect()
    };
    if let Some(unknown) = formats.iter().find(|f| !FORMATS.contains(f)) {
        anyhow::bail!(
            "unknown export format: {unknown} (expected one of {}, all)",
            FORMATS.join(", ")
        );
    }

    for fmt in formats {
        let (name, bytes) = match fmt {
            "csv" => (naming::generic_csv(today), csv::generic_csv(exam).into_bytes()),
            "ans" => (
                naming::ans_csv(&exam.metadata.course_code, today),
                csv::ans_csv(exam).into_bytes(),
            ),
            "brightspace" => (
                naming::brightspace_stub(&csv::grade_item_name(exam)),
                csv::brightspace_stub(exam).into_bytes(),
            ),
            "doc" => (
                naming::document(variant, today),
                document::word_document(exam, &generator, variant).into_bytes(),
            ),
            _ => (
                naming::slides(variant, today),
                slides::render_pptx(&slides::build_deck(exam, &generator, variant))?,
            ),
        };
        let path = dir.join(name);
        write_export(&path, &bytes)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

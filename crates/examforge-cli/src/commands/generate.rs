//! The `examforge generate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examforge_core::model::{GeneratedExam, GeneratorConfig};
use examforge_core::validation::{read_upload, validate_generation_input, UploadPurpose};

use crate::context::AppContext;
use crate::GenerateArgs;

pub async fn execute(args: GenerateArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut ctx = AppContext::load(config_path.as_deref()).await?;
    let limits = ctx.config.upload_limits();

    let source_text = match &args.text {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => String::new(),
    };
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        files.push(read_upload(path, UploadPurpose::Generation, &limits).await?);
    }

    let generator = GeneratorConfig {
        language: args.language,
        source_text,
        learning_objectives: args.objectives,
        source_scope: args.scope,
        course_code: args.course,
        target_group: args.target_group,
        weighting: args.weighting,
        files,
        num_questions: args.questions,
        difficulty: args.difficulty,
        question_type: args.question_type,
    };
    validate_generation_input(&generator, &limits)?;

    let workspace = ctx.workspace(&args.provider)?;
    eprintln!(
        "Generating {} questions with {}...",
        generator.num_questions,
        workspace.client().provider_name()
    );
    let exam = workspace.generate(&generator).await?;

    print_exam_summary(&exam);
    ctx.save(generator, Some(exam));
    ctx.finish().await
}

pub fn print_exam_summary(exam: &GeneratedExam) {
    use comfy_table::{Cell, Table};

    println!("{}", exam.metadata.title);
    let mut table = Table::new();
    table.set_header(vec!["#", "Type", "Level", "Points", "Learning objective"]);
    for (i, q) in exam.questions.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(q.kind),
            Cell::new(format!("{:?}", q.cognitive_level)),
            Cell::new(q.points()),
            Cell::new(&q.learning_objective),
        ]);
    }
    println!("{table}");
    println!(
        "{} questions, {} points",
        exam.questions.len(),
        exam.total_points()
    );
}

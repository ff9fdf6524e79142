//! The `examforge grade` command.

use std::path::PathBuf;

use anyhow::Result;

use examforge_core::model::GradingResult;
use examforge_core::validation::{read_upload, validate_grading_input, UploadPurpose};
use examforge_export::{naming, report, write_export};

use crate::context::AppContext;
use crate::ProviderArgs;

pub async fn execute(
    key: PathBuf,
    submission: PathBuf,
    confirm_anonymised: bool,
    max_points: Option<f64>,
    output: Option<PathBuf>,
    provider: ProviderArgs,
    config_path: Option<PathBuf>,
) -> Result<()> {
    if let Some(points) = max_points {
        anyhow::ensure!(
            points.is_finite() && points > 0.0,
            "max points must be a positive number"
        );
    }
    let ctx = AppContext::load(config_path.as_deref()).await?;
    let limits = ctx.config.upload_limits();

    let key = read_upload(&key, UploadPurpose::Grading, &limits).await?;
    let submission = read_upload(&submission, UploadPurpose::Grading, &limits).await?;
    validate_grading_input(Some(&key), Some(&submission), confirm_anonymised, &limits)?;

    let client = ctx.client(&provider)?;
    let result = client.grade(&key, &submission, max_points).await?;
    print_result(&result);

    let today = chrono::Local::now().date_naive();
    let dir = output.unwrap_or_else(|| ctx.config.output_dir.clone());
    let path = dir.join(naming::grading_report(today));
    write_export(&path, report::grading_report(&result, today).as_bytes())?;
    eprintln!("Grading report: {}", path.display());
    Ok(())
}

fn print_result(result: &GradingResult) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Question", "Points", "Status", "Feedback"]);
    for q in &result.questions {
        table.add_row(vec![
            Cell::new(&q.question_id),
            Cell::new(format!("{}/{}", q.awarded_points, q.max_points)),
            Cell::new(q.status),
            Cell::new(&q.student_feedback),
        ]);
    }
    println!("{table}");
    println!(
        "Score: {} / {}  Grade: {}",
        result.total_score, result.max_score, result.calculated_grade
    );
    if !result.general_feedback.is_empty() {
        println!("{}", result.general_feedback);
    }
}

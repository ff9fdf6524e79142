//! Plain-text grading report.

use chrono::NaiveDate;

use examforge_core::model::GradingResult;

/// Render a grading result as a plain-text report dated `date`.
pub fn grading_report(result: &GradingResult, date: NaiveDate) -> String {
    let mut out = String::new();
    out.push_str("REPORT\n");
    out.push_str(&format!("Date: {}\n", date.format("%Y-%m-%d")));
    out.push_str(&format!(
        "Score: {} / {}\n",
        result.total_score, result.max_score
    ));
    out.push_str(&format!("Grade: {}\n", result.calculated_grade));
    out.push_str(&format!("Feedback: {}\n", result.general_feedback));
    out.push_str("\nDETAILS:\n------------------\n");

    let details: Vec<String> = result
        .questions
        .iter()
        .map(|q| {
            format!(
                "{} ({}/{} pt) - {}\nTeacher Feedback: {}\nStudent Feedback: {}\n",
                q.question_id,
                q.awarded_points,
                q.max_points,
                q.status.to_string().to_uppercase(),
                q.feedback,
                q.student_feedback
            )
        })
        .collect();
    out.push_str(&details.join("\n"));
    out
}

//! Delimited-text exports.
//!
//! All files are UTF-8 with a leading byte-order mark and `\n` row
//! separators. Rich markup is flattened with the content normalizer.

use examforge_core::model::{GeneratedExam, Question, QuestionType};
use examforge_core::normalize::{flatten_rubric, normalize};

/// Byte-order mark prepended to every CSV export.
pub const BOM: char = '\u{feff}';

const OPTION_COLUMNS: usize = 4;

const GENERIC_HEADERS: &[&str] = &[
    "Title",
    "Question Type",
    "Question Text",
    "Option A",
    "Option B",
    "Option C",
    "Option D",
    "Correct Answer",
    "Feedback/Rubric",
    "Points",
];

const ANS_HEADERS: &[&str] = &[
    "Type",
    "Question",
    "Points",
    "Correct Answer",
    "Option 1",
    "Option 2",
    "Option 3",
    "Option 4",
    "Feedback",
];

/// Grade item used when the exam carries no Brightspace hint.
pub const DEFAULT_GRADE_ITEM: &str = "ToetsGrade";
/// Ceiling used when the exam carries no Brightspace hint.
pub const DEFAULT_GRADE_POINTS: f64 = 10.0;

/// Normalize `text` and wrap it in quotes, doubling inner quotes.
fn quoted(text: &str) -> String {
    format!("\"{}\"", normalize(text).replace('"', "\"\""))
}

/// Question text with the stem prefixed in brackets.
fn question_text(question: &Question) -> String {
    match question.stem_text() {
        Some(stem) => format!("[CONTEXT: {stem}] {}", question.question),
        None => question.question.clone(),
    }
}

/// The first four options, padded with empty strings.
fn option_cells(question: &Question) -> Vec<String> {
    let options = question.option_list();
    (0..OPTION_COLUMNS)
        .map(|i| quoted(options.get(i).map(String::as_str).unwrap_or_default()))
        .collect()
}

fn document(headers: &[&str], rows: Vec<String>) -> String {
    let mut out = String::new();
    out.push(BOM);
    out.push_str(&headers.join(","));
    for row in rows {
        out.push('\n');
        out.push_str(&row);
    }
    out
}

/// Generic export: one row per question.
pub fn generic_csv(exam: &GeneratedExam) -> String {
    let rows = exam
        .questions
        .iter()
        .map(|q| {
            let feedback = match (&q.kind, q.rubric.as_deref()) {
                (QuestionType::Open, Some(rubric)) if !rubric.is_empty() => flatten_rubric(rubric),
                _ => q.explanation.clone(),
            };
            let mut cells = vec![
                quoted(&exam.metadata.title),
                quoted(&q.kind.to_string()),
                quoted(&question_text(q)),
            ];
            cells.extend(option_cells(q));
            cells.push(quoted(&q.correct_answer.join(";")));
            cells.push(quoted(&feedback));
            cells.push(quoted(&q.points().to_string()));
            cells.join(",")
        })
        .collect();
    document(GENERIC_HEADERS, rows)
}

fn ans_type_label(kind: QuestionType) -> &'static str {
    match kind {
        QuestionType::SingleChoice => "Multiple choice",
        QuestionType::MultipleResponse => "Multiple response",
        QuestionType::Open => "Open",
    }
}

/// Import file for the Ans assessment platform.
pub fn ans_csv(exam: &GeneratedExam) -> String {
    let rows = exam
        .questions
        .iter()
        .map(|q| {
            let mut cells = vec![
                ans_type_label(q.kind).to_string(),
                quoted(&question_text(q)),
                q.points().to_string(),
                quoted(&q.correct_answer.join("|")),
            ];
            cells.extend(option_cells(q));
            cells.push(quoted(&q.explanation));
            cells.join(",")
        })
        .collect();
    document(ANS_HEADERS, rows)
}

/// Grade item name from the integration hints, or [`DEFAULT_GRADE_ITEM`].
pub fn grade_item_name(exam: &GeneratedExam) -> String {
    exam.integration_info
        .as_ref()
        .and_then(|info| info.brightspace.as_ref())
        .map(|b| b.grade_item_name.trim())
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_GRADE_ITEM)
        .to_string()
}

fn grade_points(exam: &GeneratedExam) -> f64 {
    exam.integration_info
        .as_ref()
        .and_then(|info| info.brightspace.as_ref())
        .map(|b| b.points)
        .filter(|p| p.is_finite() && *p > 0.0)
        .unwrap_or(DEFAULT_GRADE_POINTS)
}

/// Brightspace grade-import template.
///
/// The body rows are placeholders to be replaced with real learner records.
pub fn brightspace_stub(exam: &GeneratedExam) -> String {
    let column = format!(
        "{} Points Grade <Numeric MaxPoints:{}>",
        grade_item_name(exam),
        grade_points(exam)
    );
    let headers = [
        "OrgDefinedId",
        "Username",
        column.as_str(),
        "End-of-Line Indicator",
    ];
    let rows = ["#1234567,student1,,#", "#7654321,student2,,#", "#9999999,student3,,#"]
        .iter()
        .map(|r| r.to_string())
        .collect();
    document(&headers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use examforge_core::model::{BrightspaceHint, IntegrationHints};

    fn lines(csv: &str) -> Vec<&str> {
        csv.trim_start_matches(BOM).lines().collect()
    }

    #[test]
    fn generic_export_layout() {
        let csv = generic_csv(&fixtures::exam());
        assert!(csv.starts_with(BOM));
        let lines = lines(&csv);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Title,Question Type,Question Text"));
        assert_eq!(
            lines[1],
            "\"Thermodynamics\",\"single_choice\",\"What is H2O?\",\"Alpha\",\"Beta\",\"Gamma\",\"Delta\",\"Alpha\",\"Alpha is right.\",\"3\""
        );
    }

    #[test]
    fn open_question_row_uses_stem_padding_and_rubric() {
        let csv = generic_csv(&fixtures::exam());
        let row = lines(&csv)[2];
        assert!(row.contains("\"[CONTEXT: A case description] Explain the result.\""));
        assert!(row.contains(",\"\",\"\",\"\",\"\","));
        assert!(row.contains("Criterion 0 (sufficient: some, excellent: all) | Criterion 1"));
    }

    #[test]
    fn quotes_and_commas_are_escaped() {
        let mut exam = fixtures::exam();
        exam.questions[0].question = "He said \"stop\", then left".into();
        let csv = generic_csv(&exam);
        assert!(csv.contains("\"He said \"\"stop\"\", then left\""));
    }

    #[test]
    fn multi_valued_answers_use_platform_separator() {
        let mut exam = fixtures::exam();
        exam.questions[0].kind = QuestionType::MultipleResponse;
        exam.questions[0].correct_answer =
            examforge_core::model::CorrectAnswer::Multiple(vec!["Alpha".into(), "Beta".into()]);

        assert!(generic_csv(&exam).contains("\"Alpha;Beta\""));

        let ans = ans_csv(&exam);
        let lines = lines(&ans);
        assert_eq!(
            lines[0],
            "Type,Question,Points,Correct Answer,Option 1,Option 2,Option 3,Option 4,Feedback"
        );
        assert!(lines[1].starts_with("Multiple response,\"What is H2O?\",3,\"Alpha|Beta\","));
        assert!(lines[2].starts_with("Open,"));
    }

    #[test]
    fn brightspace_stub_defaults() {
        let csv = brightspace_stub(&fixtures::exam());
        let lines = lines(&csv);
        assert_eq!(
            lines[0],
            "OrgDefinedId,Username,ToetsGrade Points Grade <Numeric MaxPoints:10>,End-of-Line Indicator"
        );
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "#1234567,student1,,#");
    }

    #[test]
    fn brightspace_stub_uses_hint() {
        let mut exam = fixtures::exam();
        exam.integration_info = Some(IntegrationHints {
            brightspace: Some(BrightspaceHint {
                grade_item_name: "Tentamen".into(),
                points: 100.0,
                ..Default::default()
            }),
            osiris: None,
        });
        assert!(brightspace_stub(&exam).contains("Tentamen Points Grade <Numeric MaxPoints:100>"));
        assert_eq!(grade_item_name(&exam), "Tentamen");
    }
}

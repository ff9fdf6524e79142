//! Export filenames.
//!
//! Names encode the export kind, the variant or course code, and the date as
//! `YYYY-MM-DD`.

use chrono::NaiveDate;

use crate::ExportVariant;

fn day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Replace characters that cannot appear in a filename.
fn file_safe(part: &str) -> String {
    part.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

pub fn generic_csv(date: NaiveDate) -> String {
    format!("Toets_Export_{}.csv", day(date))
}

pub fn ans_csv(course_code: &str, date: NaiveDate) -> String {
    let course = if course_code.trim().is_empty() {
        "Toets".to_string()
    } else {
        file_safe(course_code)
    };
    format!("Ans_Import_{course}_{}.csv", day(date))
}

pub fn brightspace_stub(grade_item_name: &str) -> String {
    format!("Brightspace_Grade_Import_{}.csv", file_safe(grade_item_name))
}

pub fn document(variant: ExportVariant, date: NaiveDate) -> String {
    format!("Toets_{}_{}.doc", variant.file_tag(), day(date))
}

pub fn slides(variant: ExportVariant, date: NaiveDate) -> String {
    format!("Toets_{}_{}.pptx", variant.file_tag(), day(date))
}

pub fn grading_report(date: NaiveDate) -> String {
    format!("Grading_Report_{}.txt", day(date))
}

//! examforge-export: serializers for generated exams and grading results.
//!
//! Every serializer is a pure function of the canonical exam (or grading
//! result); writing to disk is left to [`write_export`].

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};

pub mod csv;
pub mod document;
pub mod naming;
pub mod report;
pub mod slides;

/// Which audience an export is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportVariant {
    /// Full version with answers, rubrics and the review cover page.
    #[default]
    Teacher,
    /// Learner-facing version without answers.
    Student,
}

impl ExportVariant {
    pub fn is_student(self) -> bool {
        matches!(self, ExportVariant::Student)
    }

    /// Tag used in export filenames.
    pub fn file_tag(self) -> &'static str {
        match self {
            ExportVariant::Teacher => "DOCENT",
            ExportVariant::Student => "STUDENT",
        }
    }
}

impl fmt::Display for ExportVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportVariant::Teacher => write!(f, "teacher"),
            ExportVariant::Student => write!(f, "student"),
        }
    }
}

impl std::str::FromStr for ExportVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "teacher" | "docent" => Ok(ExportVariant::Teacher),
            "student" => Ok(ExportVariant::Student),
            other => Err(format!("unknown export variant: {other}")),
        }
    }
}

/// Write an export to `path`, creating parent directories.
pub fn write_export(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "export written");
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use examforge_core::model::*;

    pub fn choice(id: &str, question: &str) -> Question {
        Question {
            id: id.into(),
            kind: QuestionType::SingleChoice,
            learning_objective: "LO1".into(),
            stem: None,
            question: question.into(),
            options: Some(vec![
                "<b>Alpha</b>".into(),
                "Beta".into(),
                "Gamma".into(),
                "Delta".into(),
            ]),
            correct_answer: CorrectAnswer::Multiple(vec!["<b>Alpha</b>".into()]),
            explanation: "Alpha is <i>right</i>.".into(),
            rubric: None,
            cognitive_level: CognitiveLevel::Reproduction,
            score: Some(3),
        }
    }

    pub fn open(id: &str, rows: usize) -> Question {
        let rubric = (0..rows)
            .map(|i| {
                RubricEntry::Structured(RubricRow {
                    criterion: format!("Criterion {i}"),
                    insufficient: "none".into(),
                    sufficient: "some".into(),
                    good: "most".into(),
                    excellent: "all".into(),
                })
            })
            .collect();
        Question {
            id: id.into(),
            kind: QuestionType::Open,
            learning_objective: "LO2".into(),
            stem: Some("A <sub>case</sub> description".into()),
            question: "Explain the result.".into(),
            options: None,
            correct_answer: CorrectAnswer::Single("A model answer".into()),
            explanation: "Model explanation".into(),
            rubric: Some(rubric),
            cognitive_level: CognitiveLevel::Application,
            score: None,
        }
    }

    pub fn exam() -> GeneratedExam {
        GeneratedExam {
            metadata: ExamMetadata {
                title: "Thermodynamics".into(),
                course_code: "NWI-123".into(),
                ..Default::default()
            },
            questions: vec![choice("q1", "What is <b>H<sub>2</sub>O</b>?"), open("q2", 2)],
            integration_info: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_parsing() {
        assert_eq!("docent".parse::<ExportVariant>().unwrap(), ExportVariant::Teacher);
        assert_eq!("Student".parse::<ExportVariant>().unwrap(), ExportVariant::Student);
        assert!("pupil".parse::<ExportVariant>().is_err());
        assert_eq!(ExportVariant::Student.file_tag(), "STUDENT");
    }

    #[test]
    fn write_export_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");
        write_export(&path, b"x").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"x");
    }
}

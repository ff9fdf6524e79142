//! Scoring analytics over the canonical model.
//!
//! The cut-off (cesuur) separates performance beyond chance from full
//! credit: the expected score from uniform guessing plus a fixed fraction of
//! the remaining points.

use serde::{Deserialize, Serialize};

use crate::model::{CognitiveLevel, Language, Question};

/// Fraction of the non-guessable points required to pass.
pub const CUTOFF_FRACTION: f64 = 0.55;

/// Point totals and the derived passing score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutoffStats {
    pub total_points: f64,
    /// Expected score from uniform random guessing.
    pub guessing_points: f64,
    pub cutoff_score: f64,
    pub percentage: f64,
}

/// Expected score from guessing on one question.
///
/// Choice questions contribute `points / options`; open questions and choice
/// questions without options contribute nothing.
pub fn guessing_contribution(question: &Question) -> f64 {
    let options = question.option_list().len();
    if question.kind.is_choice() && options > 0 {
        f64::from(question.points()) / options as f64
    } else {
        0.0
    }
}

/// Compute totals, guessing score, cut-off, and cut-off percentage.
pub fn compute_cutoff(questions: &[Question]) -> CutoffStats {
    let total_points: f64 = questions.iter().map(|q| f64::from(q.points())).sum();
    let guessing_points: f64 = questions.iter().map(guessing_contribution).sum();
    let cutoff_score = guessing_points + CUTOFF_FRACTION * (total_points - guessing_points);
    let percentage = if total_points > 0.0 {
        100.0 * cutoff_score / total_points
    } else {
        0.0
    };
    CutoffStats {
        total_points,
        guessing_points,
        cutoff_score,
        percentage,
    }
}

/// One row of the exam matrix (toetsmatrijs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub learning_objective: String,
    /// 1-based question numbers per cognitive level.
    pub reproduction: Vec<usize>,
    pub insight: Vec<usize>,
    pub application: Vec<usize>,
    pub total: usize,
}

/// Group questions by learning objective and bucket them by cognitive level.
///
/// Rows follow the order in which objectives first appear. Questions without
/// an objective are grouped under a general heading.
pub fn exam_matrix(questions: &[Question], language: Language) -> Vec<MatrixRow> {
    let fallback = match language {
        Language::Nl => "Algemeen",
        Language::En => "General",
    };
    let mut rows: Vec<MatrixRow> = Vec::new();
    for (i, q) in questions.iter().enumerate() {
        let objective = match q.learning_objective.trim() {
            "" => fallback,
            lo => lo,
        };
        let pos = match rows.iter().position(|r| r.learning_objective == objective) {
            Some(pos) => pos,
            None => {
                rows.push(MatrixRow {
                    learning_objective: objective.to_string(),
                    reproduction: Vec::new(),
                    insight: Vec::new(),
                    application: Vec::new(),
                    total: 0,
                });
                rows.len() - 1
            }
        };
        let row = &mut rows[pos];
        let number = i + 1;
        match q.cognitive_level {
            CognitiveLevel::Reproduction => row.reproduction.push(number),
            CognitiveLevel::Insight => row.insight.push(number),
            CognitiveLevel::Application => row.application.push(number),
        }
        row.total += 1;
    }
    rows
}

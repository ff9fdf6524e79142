//! Interactive self-check of a learner's selection.

use serde::{Deserialize, Serialize};

use crate::error::ExamError;
use crate::model::Question;
use crate::normalize::normalize;

/// Binary outcome of a self-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerStatus {
    Correct,
    Incorrect,
}

/// Indices of every option whose normalized text equals a correct answer.
pub fn correct_option_indices(question: &Question) -> Vec<usize> {
    let answers: Vec<String> = question
        .correct_answer
        .entries()
        .into_iter()
        .map(normalize)
        .collect();
    question
        .option_list()
        .iter()
        .enumerate()
        .filter(|(_, option)| answers.contains(&normalize(option)))
        .map(|(i, _)| i)
        .collect()
}

/// Compare `selected` option indices with the correct set.
///
/// Order and duplicates in `selected` are ignored. There is no partial
/// credit.
pub fn check_answer(question: &Question, selected: &[usize]) -> Result<AnswerStatus, ExamError> {
    let options = question.option_list();
    if options.is_empty() {
        return Err(ExamError::input(format!(
            "question {} has no options to select",
            question.id
        )));
    }
    if let Some(&bad) = selected.iter().find(|&&i| i >= options.len()) {
        return Err(ExamError::IndexOutOfRange {
            index: bad,
            len: options.len(),
        });
    }

    let expected = correct_option_indices(question);
    let mut chosen = selected.to_vec();
    chosen.sort_unstable();
    chosen.dedup();

    Ok(if chosen == expected {
        AnswerStatus::Correct
    } else {
        AnswerStatus::Incorrect
    })
}

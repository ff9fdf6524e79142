//! Response schemas and the strict decoder.
//!
//! The schemas are sent with every structured request so the provider
//! constrains its output. The decoder checks the same contract on the way
//! back: required fields must be present, enumerations must match, and the
//! correct answer must be one of the options. Any deviation is a
//! `SchemaViolation`; nothing is coerced to a default.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ExamError;
use crate::model::{
    CognitiveLevel, CorrectAnswer, ExamMetadata, GeneratedExam, GradingResult, IntegrationHints,
    Question, QuestionType, RubricEntry,
};
use crate::normalize::normalize;

fn question_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "type": { "type": "STRING", "enum": ["single_choice", "multiple_response", "open"] },
            "learningObjective": { "type": "STRING" },
            "stem": { "type": "STRING" },
            "question": { "type": "STRING" },
            "options": { "type": "ARRAY", "items": { "type": "STRING" } },
            "correctAnswer": { "type": "ARRAY", "items": { "type": "STRING" } },
            "explanation": { "type": "STRING" },
            "cognitiveLevel": {
                "type": "STRING",
                "enum": ["Reproductie", "Inzicht", "Toepassen", "Reproduction", "Insight", "Application"]
            },
            "score": { "type": "INTEGER", "description": "Points for this question, typically 3" },
            "rubric": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "criterion": { "type": "STRING" },
                        "insufficient": { "type": "STRING" },
                        "sufficient": { "type": "STRING" },
                        "good": { "type": "STRING" },
                        "excellent": { "type": "STRING" }
                    },
                    "required": ["criterion", "insufficient", "sufficient", "good", "excellent"]
                }
            }
        },
        "required": [
            "type", "question", "correctAnswer", "explanation",
            "learningObjective", "cognitiveLevel", "rubric"
        ]
    })
}

fn questions_schema() -> Value {
    json!({ "type": "ARRAY", "items": question_schema() })
}

/// Schema for a full exam.
pub fn exam_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "metadata": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "courseCode": { "type": "STRING" },
                    "targetGroup": { "type": "STRING" },
                    "levelDistribution": { "type": "STRING" },
                    "weighting": { "type": "STRING" }
                }
            },
            "integrationInfo": {
                "type": "OBJECT",
                "properties": {
                    "brightspace": {
                        "type": "OBJECT",
                        "properties": {
                            "gradeItemName": { "type": "STRING" },
                            "points": { "type": "NUMBER" },
                            "passingScore": { "type": "NUMBER" },
                            "weight": { "type": "NUMBER" },
                            "advice": { "type": "ARRAY", "items": { "type": "STRING" } }
                        }
                    },
                    "osiris": {
                        "type": "OBJECT",
                        "properties": {
                            "courseCode": { "type": "STRING" },
                            "gradingScale": { "type": "STRING" },
                            "passingRule": { "type": "STRING" },
                            "compensation": { "type": "STRING" }
                        }
                    }
                }
            },
            "questions": questions_schema()
        },
        "required": ["metadata", "questions"]
    })
}

/// Schema for a single-item regeneration: a `questions` wrapper.
pub fn regeneration_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": { "questions": questions_schema() },
        "required": ["questions"]
    })
}

/// Schema for a grading breakdown.
pub fn grading_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "totalScore": { "type": "NUMBER" },
            "maxScore": { "type": "NUMBER" },
            "calculatedGrade": { "type": "NUMBER" },
            "generalFeedback": { "type": "STRING" },
            "questions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "questionId": { "type": "STRING" },
                        "studentAnswerSummary": { "type": "STRING" },
                        "awardedPoints": { "type": "NUMBER" },
                        "maxPoints": { "type": "NUMBER" },
                        "feedback": { "type": "STRING", "description": "Internal reasoning" },
                        "studentFeedback": { "type": "STRING", "description": "Feedback for student" },
                        "status": { "type": "STRING", "enum": ["correct", "partial", "incorrect"] }
                    },
                    "required": ["questionId", "awardedPoints", "maxPoints", "feedback", "status"]
                }
            }
        },
        "required": ["totalScore", "maxScore", "calculatedGrade", "questions"]
    })
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuestion {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    kind: QuestionType,
    learning_objective: String,
    #[serde(default)]
    stem: Option<String>,
    question: String,
    #[serde(default)]
    options: Option<Vec<String>>,
    correct_answer: CorrectAnswer,
    explanation: String,
    rubric: Vec<RubricEntry>,
    cognitive_level: CognitiveLevel,
    #[serde(default)]
    score: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireExam {
    metadata: ExamMetadata,
    questions: Vec<WireQuestion>,
    #[serde(default)]
    integration_info: Option<IntegrationHints>,
}

#[derive(Debug, Deserialize)]
struct WireQuestions {
    questions: Vec<WireQuestion>,
}

/// Position of the first option whose normalized text equals `answer`.
///
/// When two options normalize identically the first one wins.
pub fn match_option(options: &[String], answer: &str) -> Option<usize> {
    let target = normalize(answer);
    options.iter().position(|o| normalize(o) == target)
}

fn label(index: usize, id: Option<&str>) -> String {
    match id {
        Some(id) if !id.is_empty() => format!("question {} ({id})", index + 1),
        _ => format!("question {}", index + 1),
    }
}

/// Check the per-question invariants.
///
/// Learning objective and question text must be non-empty, choice
/// questions need options and open questions must not have any, and every
/// correct answer must match an option after normalization.
pub fn validate_question(question: &Question, index: usize) -> Result<(), ExamError> {
    let name = label(index, Some(&question.id));

    if question.learning_objective.trim().is_empty() {
        return Err(ExamError::schema(format!("{name}: learningObjective is empty")));
    }
    if normalize(&question.question).is_empty() {
        return Err(ExamError::schema(format!("{name}: question text is empty")));
    }

    let options = question.options.as_deref().filter(|o| !o.is_empty());
    match (question.kind, options) {
        (QuestionType::Open, Some(_)) => {
            return Err(ExamError::schema(format!(
                "{name}: open question must not carry options"
            )))
        }
        (kind, None) if kind.is_choice() => {
            return Err(ExamError::schema(format!("{name}: {kind} question has no options")))
        }
        _ => {}
    }

    let answers = question.correct_answer.entries();
    if answers.is_empty() {
        return Err(ExamError::schema(format!("{name}: correctAnswer is empty")));
    }
    if question.kind == QuestionType::SingleChoice && answers.len() != 1 {
        return Err(ExamError::schema(format!(
            "{name}: single_choice question has {} correct answers",
            answers.len()
        )));
    }
    if let Some(options) = options {
        for answer in &answers {
            if match_option(options, answer).is_none() {
                return Err(ExamError::schema(format!(
                    "{name}: correct answer {:?} matches no option",
                    normalize(answer)
                )));
            }
        }
    }
    Ok(())
}

impl WireQuestion {
    fn into_question(self, index: usize) -> Result<Question, ExamError> {
        let question = Question {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            kind: self.kind,
            learning_objective: self.learning_objective,
            stem: self.stem.filter(|s| !s.trim().is_empty()),
            question: self.question,
            options: self.options.filter(|o| !o.is_empty()),
            correct_answer: self.correct_answer,
            explanation: self.explanation,
            rubric: Some(self.rubric).filter(|r| !r.is_empty()),
            cognitive_level: self.cognitive_level,
            score: self.score,
        };
        validate_question(&question, index)?;
        Ok(question)
    }
}

fn convert_all(questions: Vec<WireQuestion>) -> Result<Vec<Question>, ExamError> {
    questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| q.into_question(i))
        .collect()
}

/// Decode a full exam payload.
pub fn decode_exam(payload: &str) -> Result<GeneratedExam, ExamError> {
    let wire: WireExam = serde_json::from_str(payload)
        .map_err(|e| ExamError::schema(format!("exam payload: {e}")))?;
    if wire.questions.is_empty() {
        return Err(ExamError::schema("exam payload contains no questions"));
    }
    Ok(GeneratedExam {
        metadata: wire.metadata,
        questions: convert_all(wire.questions)?,
        integration_info: wire.integration_info,
    })
}

/// Decode a `{ "questions": [...] }` payload.
pub fn decode_questions(payload: &str) -> Result<Vec<Question>, ExamError> {
    let wire: WireQuestions = serde_json::from_str(payload)
        .map_err(|e| ExamError::schema(format!("question payload: {e}")))?;
    convert_all(wire.questions)
}

/// Decode a grading payload.
pub fn decode_grading(payload: &str) -> Result<GradingResult, ExamError> {
    let result: GradingResult = serde_json::from_str(payload)
        .map_err(|e| ExamError::schema(format!("grading payload: {e}")))?;
    let numbers = [result.total_score, result.max_score, result.calculated_grade];
    if numbers.iter().any(|n| !n.is_finite()) {
        return Err(ExamError::schema("grading payload: scores must be finite"));
    }
    for (i, item) in result.questions.iter().enumerate() {
        if item.question_id.trim().is_empty() {
            return Err(ExamError::schema(format!(
                "graded item {}: questionId is empty",
                i + 1
            )));
        }
        if item.awarded_points < 0.0 || item.awarded_points > item.max_points {
            return Err(ExamError::schema(format!(
                "graded item {}: awarded {} of {} points",
                item.question_id, item.awarded_points, item.max_points
            )));
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GradeStatus;

    fn single_choice(answer: &str) -> Value {
        json!({
            "type": "single_choice",
            "learningObjective": "LO1",
            "question": "Which is a <b>noble</b> gas?",
            "options": ["<i>Helium</i>", "Oxygen", "Nitrogen", "Carbon"],
            "correctAnswer": [answer],
            "explanation": "Helium has a full shell.",
            "cognitiveLevel": "Reproductie",
            "rubric": []
        })
    }

    fn exam(questions: Vec<Value>) -> String {
        json!({ "metadata": { "title": "Chemistry" }, "questions": questions }).to_string()
    }

    #[test]
    fn decodes_valid_exam_and_assigns_ids() {
        let exam = decode_exam(&exam(vec![single_choice("Helium")])).unwrap();
        let q = &exam.questions[0];
        assert!(!q.id.is_empty());
        assert!(q.rubric.is_none());
        assert_eq!(q.cognitive_level, CognitiveLevel::Reproduction);
        assert_eq!(exam.metadata.title, "Chemistry");
    }

    #[test]
    fn missing_required_field_is_violation() {
        let mut q = single_choice("Helium");
        q.as_object_mut().unwrap().remove("explanation");
        let err = decode_exam(&exam(vec![q])).unwrap_err();
        assert!(matches!(err, ExamError::SchemaViolation(ref m) if m.contains("explanation")));
    }

    #[test]
    fn missing_rubric_is_violation() {
        let mut q = single_choice("Helium");
        q.as_object_mut().unwrap().remove("rubric");
        assert!(matches!(
            decode_exam(&exam(vec![q])),
            Err(ExamError::SchemaViolation(_))
        ));
    }

    #[test]
    fn out_of_enum_level_is_violation() {
        let mut q = single_choice("Helium");
        q["cognitiveLevel"] = json!("Evaluation");
        assert!(matches!(
            decode_exam(&exam(vec![q])),
            Err(ExamError::SchemaViolation(_))
        ));
    }

    #[test]
    fn answer_must_match_an_option() {
        let err = decode_exam(&exam(vec![single_choice("Argon")])).unwrap_err();
        assert!(err.to_string().contains("matches no option"));
    }

    #[test]
    fn open_question_with_options_is_violation() {
        let q = json!({
            "type": "open", "learningObjective": "LO2", "question": "Explain.",
            "options": ["a"], "correctAnswer": "Because.", "explanation": "e",
            "cognitiveLevel": "Insight", "rubric": ["Names a reason"]
        });
        assert!(decode_exam(&exam(vec![q])).is_err());
    }

    #[test]
    fn open_question_accepts_bare_string_answer_and_empty_options() {
        let q = json!({
            "type": "open", "learningObjective": "LO2", "question": "Explain.",
            "options": [], "correctAnswer": "Because.", "explanation": "e",
            "cognitiveLevel": "Insight", "rubric": ["Names a reason"]
        });
        let exam = decode_exam(&exam(vec![q])).unwrap();
        assert!(exam.questions[0].options.is_none());
        assert_eq!(exam.questions[0].rubric_entries().len(), 1);
    }

    #[test]
    fn empty_learning_objective_is_violation() {
        let mut q = single_choice("Helium");
        q["learningObjective"] = json!("  ");
        assert!(decode_exam(&exam(vec![q])).is_err());
    }

    #[test]
    fn not_json_is_violation() {
        assert!(matches!(
            decode_exam("The model is overloaded"),
            Err(ExamError::SchemaViolation(_))
        ));
    }

    #[test]
    fn first_match_wins_for_duplicate_options() {
        let options = vec!["<b>A</b>".to_string(), "A".to_string()];
        assert_eq!(match_option(&options, "A"), Some(0));
    }

    #[test]
    fn decodes_grading_with_strict_status() {
        let payload = json!({
            "totalScore": 6, "maxScore": 6, "calculatedGrade": 10,
            "questions": [{
                "questionId": "1", "awardedPoints": 3, "maxPoints": 3,
                "feedback": "ok", "status": "correct"
            }, {
                "questionId": "2", "awardedPoints": 3, "maxPoints": 3,
                "feedback": "ok", "status": "correct"
            }]
        });
        let result = decode_grading(&payload.to_string()).unwrap();
        assert!(result.questions.iter().all(|q| q.status == GradeStatus::Correct));

        let mut bad = payload.clone();
        bad["questions"][0]["status"] = json!("excellent");
        assert!(decode_grading(&bad.to_string()).is_err());
    }

    #[test]
    fn grading_rejects_overawarded_points() {
        let payload = json!({
            "totalScore": 4, "maxScore": 3, "calculatedGrade": 10,
            "questions": [{
                "questionId": "1", "awardedPoints": 4, "maxPoints": 3,
                "feedback": "?", "status": "correct"
            }]
        });
        assert!(decode_grading(&payload.to_string()).is_err());
    }

    #[test]
    fn schemas_declare_required_fields() {
        let required = &exam_schema()["properties"]["questions"]["items"]["required"];
        assert_eq!(required.as_array().unwrap().len(), 7);
        assert_eq!(regeneration_schema()["required"][0], "questions");
        assert_eq!(grading_schema()["required"][3], "questions");
    }
}

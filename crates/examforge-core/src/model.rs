//! Canonical exam data model.
//!
//! Every other component reads and writes these types: the prompt assembler
//! consumes `GeneratorConfig`, the decoder produces `GeneratedExam`, and the
//! exporters and analytics project it onto other shapes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Points awarded to a question when the provider does not supply a score.
pub const DEFAULT_QUESTION_POINTS: u32 = 3;

/// Output language for generated content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Nl,
    En,
}

impl Language {
    pub fn is_dutch(self) -> bool {
        self == Language::Nl
    }

    /// Upper-case language name used in output-language directives.
    pub fn directive_name(self) -> &'static str {
        match self {
            Language::Nl => "DUTCH",
            Language::En => "ENGLISH",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Nl => write!(f, "nl"),
            Language::En => write!(f, "en"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nl" | "dutch" | "nederlands" => Ok(Language::Nl),
            "en" | "english" | "engels" => Ok(Language::En),
            other => Err(format!("unknown language: {other}")),
        }
    }
}

/// Difficulty tier of the target audience.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[serde(alias = "HBO")]
    Vocational,
    #[default]
    #[serde(alias = "WO Bachelor")]
    Undergraduate,
    #[serde(alias = "WO Master")]
    Graduate,
}

impl Difficulty {
    /// Label used in prompts and exported documents.
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Vocational => "HBO",
            Difficulty::Undergraduate => "WO Bachelor",
            Difficulty::Graduate => "WO Master",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vocational" | "hbo" => Ok(Difficulty::Vocational),
            "undergraduate" | "bachelor" | "wo bachelor" | "wo-ba" => Ok(Difficulty::Undergraduate),
            "graduate" | "master" | "wo master" | "wo-ma" => Ok(Difficulty::Graduate),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Requested question-type mix for a generation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionTypeMix {
    SingleChoice,
    MultipleResponse,
    Open,
    #[default]
    Mixed,
}

impl QuestionTypeMix {
    pub fn label(self) -> &'static str {
        match self {
            QuestionTypeMix::Open => "Open Vragen",
            QuestionTypeMix::SingleChoice => "Eén-uit-meer (Single Choice)",
            QuestionTypeMix::MultipleResponse => "Meerkeuze (Multiple Response)",
            QuestionTypeMix::Mixed => "Mix (Radboud Standaard)",
        }
    }
}

impl FromStr for QuestionTypeMix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "single_choice" | "single" => Ok(QuestionTypeMix::SingleChoice),
            "multiple_response" | "multiple" => Ok(QuestionTypeMix::MultipleResponse),
            "open" => Ok(QuestionTypeMix::Open),
            "mixed" | "mix" | "standard_mix" => Ok(QuestionTypeMix::Mixed),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// The type of a single generated question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleResponse,
    Open,
}

impl QuestionType {
    pub fn is_choice(self) -> bool {
        !matches!(self, QuestionType::Open)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::SingleChoice => write!(f, "single_choice"),
            QuestionType::MultipleResponse => write!(f, "multiple_response"),
            QuestionType::Open => write!(f, "open"),
        }
    }
}

/// Cognitive demand of a question. Dutch labels are accepted as synonyms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CognitiveLevel {
    #[serde(alias = "Reproductie")]
    Reproduction,
    #[serde(alias = "Inzicht")]
    Insight,
    #[serde(alias = "Toepassen")]
    Application,
}

impl CognitiveLevel {
    pub fn label(self, language: Language) -> &'static str {
        match (self, language) {
            (CognitiveLevel::Reproduction, Language::Nl) => "Reproductie",
            (CognitiveLevel::Insight, Language::Nl) => "Inzicht",
            (CognitiveLevel::Application, Language::Nl) => "Toepassen",
            (CognitiveLevel::Reproduction, Language::En) => "Reproduction",
            (CognitiveLevel::Insight, Language::En) => "Insight",
            (CognitiveLevel::Application, Language::En) => "Application",
        }
    }
}

/// Transformation applied when regenerating a single question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegenerationMode {
    #[default]
    Random,
    Harder,
    Easier,
    Distractors,
    Shorter,
}

impl fmt::Display for RegenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RegenerationMode::Random => "random",
            RegenerationMode::Harder => "harder",
            RegenerationMode::Easier => "easier",
            RegenerationMode::Distractors => "distractors",
            RegenerationMode::Shorter => "shorter",
        };
        f.write_str(s)
    }
}

impl FromStr for RegenerationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(RegenerationMode::Random),
            "harder" => Ok(RegenerationMode::Harder),
            "easier" => Ok(RegenerationMode::Easier),
            "distractors" => Ok(RegenerationMode::Distractors),
            "shorter" => Ok(RegenerationMode::Shorter),
            other => Err(format!("unknown regeneration mode: {other}")),
        }
    }
}

/// One criterion of a four-level (0–3 point) rubric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricRow {
    pub criterion: String,
    pub insufficient: String,
    pub sufficient: String,
    pub good: String,
    pub excellent: String,
}

/// A rubric row in either the structured or the legacy free-text form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RubricEntry {
    Structured(RubricRow),
    FreeText(String),
}

/// A correct answer: one string, or an unordered set of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    Single(String),
    Multiple(Vec<String>),
}

impl CorrectAnswer {
    pub fn entries(&self) -> Vec<&str> {
        match self {
            CorrectAnswer::Single(s) => vec![s.as_str()],
            CorrectAnswer::Multiple(v) => v.iter().map(String::as_str).collect(),
        }
    }

    /// Join the entries with `separator`; a single answer is returned as-is.
    pub fn join(&self, separator: &str) -> String {
        match self {
            CorrectAnswer::Single(s) => s.clone(),
            CorrectAnswer::Multiple(v) => v.join(separator),
        }
    }
}

/// A single exam question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    /// Constructive-alignment tag.
    pub learning_objective: String,
    /// Context shared by the question (case description).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stem: Option<String>,
    /// Question text, may embed rich markup.
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub correct_answer: CorrectAnswer,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric: Option<Vec<RubricEntry>>,
    pub cognitive_level: CognitiveLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

impl Question {
    /// Point value, falling back to [`DEFAULT_QUESTION_POINTS`].
    pub fn points(&self) -> u32 {
        self.score.unwrap_or(DEFAULT_QUESTION_POINTS)
    }

    /// The stem, if present and non-blank.
    pub fn stem_text(&self) -> Option<&str> {
        self.stem.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn option_list(&self) -> &[String] {
        self.options.as_deref().unwrap_or(&[])
    }

    pub fn rubric_entries(&self) -> &[RubricEntry] {
        self.rubric.as_deref().unwrap_or(&[])
    }
}

/// Descriptive metadata of a generated exam.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub course_code: String,
    #[serde(default)]
    pub target_group: String,
    /// Human-readable description of the cognitive-level distribution.
    #[serde(default, alias = "bloomLevelDistribution")]
    pub level_distribution: String,
    #[serde(default)]
    pub weighting: String,
}

/// Suggested Brightspace grade item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrightspaceHint {
    #[serde(default)]
    pub grade_item_name: String,
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub passing_score: f64,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub advice: Vec<String>,
}

/// Suggested Osiris registration settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsirisHint {
    #[serde(default)]
    pub course_code: String,
    #[serde(default)]
    pub grading_scale: String,
    #[serde(default)]
    pub passing_rule: String,
    #[serde(default)]
    pub compensation: String,
}

/// Integration hints for downstream systems.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationHints {
    #[serde(default)]
    pub brightspace: Option<BrightspaceHint>,
    #[serde(default)]
    pub osiris: Option<OsirisHint>,
}

/// A generated exam: metadata, ordered questions, and optional hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedExam {
    pub metadata: ExamMetadata,
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_info: Option<IntegrationHints>,
}

impl GeneratedExam {
    pub fn total_points(&self) -> u32 {
        self.questions.iter().map(Question::points).sum()
    }
}

/// A source document supplied by the user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Everything the generator needs to author an exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub source_text: String,
    #[serde(default)]
    pub learning_objectives: Option<String>,
    /// Free text naming the sections of the source that are in play.
    #[serde(default)]
    pub source_scope: Option<String>,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub target_group: Option<String>,
    #[serde(default)]
    pub weighting: Option<String>,
    #[serde(default)]
    pub files: Vec<UploadedFile>,
    #[serde(default = "default_num_questions")]
    pub num_questions: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub question_type: QuestionTypeMix,
}

fn default_num_questions() -> u32 {
    5
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            source_text: String::new(),
            learning_objectives: None,
            source_scope: None,
            course_code: None,
            target_group: None,
            weighting: None,
            files: Vec::new(),
            num_questions: default_num_questions(),
            difficulty: Difficulty::default(),
            question_type: QuestionTypeMix::default(),
        }
    }
}

/// Outcome of grading a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeStatus {
    Correct,
    Partial,
    Incorrect,
}

impl fmt::Display for GradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeStatus::Correct => write!(f, "correct"),
            GradeStatus::Partial => write!(f, "partial"),
            GradeStatus::Incorrect => write!(f, "incorrect"),
        }
    }
}

/// Per-item grading breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedQuestion {
    pub question_id: String,
    #[serde(default)]
    pub student_answer_summary: String,
    pub awarded_points: f64,
    pub max_points: f64,
    /// Internal reasoning for the examiner.
    pub feedback: String,
    /// Constructive feedback addressed to the learner.
    #[serde(default)]
    pub student_feedback: String,
    pub status: GradeStatus,
}

/// Result of comparing a submission with an answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    pub total_score: f64,
    pub max_score: f64,
    pub calculated_grade: f64,
    #[serde(default)]
    pub general_feedback: String,
    pub questions: Vec<GradedQuestion>,
}

/// Speaker of a chat turn, named as the provider expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }
}

/// One turn of the coaching conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    #[serde(default = "chrono::Utc::now")]
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(ChatRole::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Model, text)
    }

    fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Serde adapter storing byte payloads as standard base64 strings.
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

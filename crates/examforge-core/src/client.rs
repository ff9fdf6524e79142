//! Structured generation, single-item regeneration, grading, and refinement.
//!
//! Each operation issues exactly one provider request. Failures are mapped
//! onto the [`ExamError`] taxonomy and returned to the caller; nothing is
//! retried.

use std::sync::Arc;
use std::time::Instant;

use crate::error::ExamError;
use crate::model::{
    ChatMessage, ChatRole, GeneratedExam, GeneratorConfig, GradingResult, Language, Question,
    RegenerationMode, UploadedFile,
};
use crate::prompt;
use crate::schema;
use crate::traits::{
    extract_json_payload, ContentProvider, Part, ProviderRequest, ProviderResponse, JSON_MIME_TYPE,
};

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Coach reply when the provider answers with nothing.
pub const CHAT_EMPTY_REPLY: &str = "Error generating response.";
/// Coach reply when the provider cannot be reached.
pub const CHAT_UNAVAILABLE_REPLY: &str = "Connection error.";

/// Request settings shared by every call.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub model: String,
    pub temperature: f64,
    /// Language of the grading directive.
    pub grading_language: Language,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            grading_language: Language::Nl,
        }
    }
}

/// Client for the structured-generation protocol.
#[derive(Clone)]
pub struct ExamClient {
    provider: Arc<dyn ContentProvider>,
    settings: ClientSettings,
}

impl ExamClient {
    pub fn new(provider: Arc<dyn ContentProvider>, settings: ClientSettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn request(
        &self,
        system_instruction: Option<String>,
        parts: Vec<Part>,
        schema: Option<serde_json::Value>,
    ) -> ProviderRequest {
        ProviderRequest {
            model: self.settings.model.clone(),
            system_instruction,
            history: Vec::new(),
            response_mime_type: if schema.is_some() {
                JSON_MIME_TYPE.to_string()
            } else {
                "text/plain".to_string()
            },
            parts,
            response_schema: schema,
            temperature: self.settings.temperature,
        }
    }

    /// Send one request and return the non-empty payload.
    async fn send(&self, request: &ProviderRequest) -> Result<String, ExamError> {
        let start = Instant::now();
        let response: ProviderResponse = match self.provider.generate(request).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(provider = self.provider.name(), error = %e, "provider request failed");
                return Err(ExamError::ProviderUnavailable(e));
            }
        };
        tracing::debug!(
            provider = self.provider.name(),
            model = %response.model,
            total_tokens = response.token_usage.total_tokens,
            latency_ms = start.elapsed().as_millis() as u64,
            "provider responded"
        );
        match response.text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ExamError::EmptyResponse),
        }
    }

    /// Generate a full exam from `config`.
    pub async fn generate(&self, config: &GeneratorConfig) -> Result<GeneratedExam, ExamError> {
        let request = self.request(
            Some(prompt::system_instruction(config.language)),
            prompt::build_parts(config, false),
            Some(schema::exam_schema()),
        );
        tracing::info!(
            requested = config.num_questions,
            files = config.files.len(),
            language = %config.language,
            "generating exam"
        );
        let payload = self.send(&request).await?;
        let exam = schema::decode_exam(&extract_json_payload(&payload))?;
        tracing::info!(questions = exam.questions.len(), "exam generated");
        Ok(exam)
    }

    /// Produce a replacement for `original` according to `mode`.
    ///
    /// The returned question keeps the original identifier so the caller can
    /// merge it in place. In distractors mode the stem, question text and
    /// correct answer of `original` are kept, and options that no longer
    /// contain that answer are a schema violation.
    pub async fn regenerate_one(
        &self,
        config: &GeneratorConfig,
        mode: RegenerationMode,
        original: &Question,
    ) -> Result<Question, ExamError> {
        let parts = prompt::regeneration_parts(config, mode, original)
            .map_err(|e| ExamError::input(format!("cannot serialize question: {e}")))?;
        let request = self.request(
            Some(prompt::system_instruction(config.language)),
            parts,
            Some(schema::regeneration_schema()),
        );
        tracing::info!(id = %original.id, %mode, "regenerating question");
        let payload = self.send(&request).await?;
        let mut question = schema::decode_questions(&extract_json_payload(&payload))?
            .into_iter()
            .next()
            .ok_or_else(|| ExamError::schema("no question generated"))?;

        question.id = original.id.clone();
        if mode == RegenerationMode::Distractors {
            let altered = question.correct_answer != original.correct_answer
                || question.question != original.question
                || question.stem != original.stem;
            if altered {
                tracing::warn!(id = %original.id, "distractor regeneration altered fixed fields");
            }
            question.kind = original.kind;
            question.stem = original.stem.clone();
            question.question = original.question.clone();
            question.correct_answer = original.correct_answer.clone();
            schema::validate_question(&question, 0)?;
        }
        Ok(question)
    }

    /// Grade `submission` against `key`.
    pub async fn grade(
        &self,
        key: &UploadedFile,
        submission: &UploadedFile,
        max_points: Option<f64>,
    ) -> Result<GradingResult, ExamError> {
        let request = self.request(
            Some(prompt::grading_instruction(self.settings.grading_language)),
            prompt::grading_parts(key, submission, max_points),
            Some(schema::grading_schema()),
        );
        tracing::info!(
            key = %key.name,
            submission = %submission.name,
            key_bytes = key.size,
            submission_bytes = submission.size,
            "grading submission"
        );
        let payload = self.send(&request).await?;
        let result = schema::decode_grading(&extract_json_payload(&payload))?;
        tracing::info!(
            items = result.questions.len(),
            total = result.total_score,
            max = result.max_score,
            "grading complete"
        );
        Ok(result)
    }

    /// Rewrite a text fragment according to `instruction`.
    ///
    /// An empty answer leaves the text unchanged.
    pub async fn refine_text(&self, text: &str, instruction: &str) -> Result<String, ExamError> {
        let request = self.request(
            None,
            vec![Part::text(prompt::refine_prompt(text, instruction))],
            None,
        );
        match self.send(&request).await {
            Ok(refined) => Ok(refined.trim().to_string()),
            Err(ExamError::EmptyResponse) => Ok(text.to_string()),
            Err(e) => Err(e),
        }
    }

    /// Answer the last user turn of a coaching conversation.
    ///
    /// Earlier turns travel as history. Provider failures produce a fixed
    /// reply instead of an error.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        config: &GeneratorConfig,
    ) -> Result<String, ExamError> {
        let (last, history) = messages
            .split_last()
            .ok_or_else(|| ExamError::input("chat needs at least one message"))?;
        if last.role != ChatRole::User {
            return Err(ExamError::input("the last chat message must come from the user"));
        }
        if last.text.trim().is_empty() {
            return Err(ExamError::input("chat message is empty"));
        }

        let mut request = self.request(
            Some(prompt::chat_instruction(config)),
            vec![Part::text(last.text.clone())],
            None,
        );
        request.history = history.to_vec();
        tracing::info!(turns = messages.len(), "sending chat message");

        match self.send(&request).await {
            Ok(reply) => Ok(reply.trim().to_string()),
            Err(ExamError::EmptyResponse) => Ok(CHAT_EMPTY_REPLY.to_string()),
            Err(ExamError::ProviderUnavailable(e)) => {
                tracing::warn!(error = %e, "chat request failed");
                Ok(CHAT_UNAVAILABLE_REPLY.to_string())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted provider shared by the core test modules.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::ProviderError;
    use crate::traits::{ContentProvider, ProviderRequest, ProviderResponse, TokenUsage};

    pub enum Scripted {
        Text(String),
        Empty,
        Fail(ProviderError),
    }

    /// Replays scripted answers in order; the last text or empty answer
    /// repeats, a failure is returned once.
    pub struct ScriptedProvider {
        answers: Mutex<VecDeque<Scripted>>,
        pub requests: Mutex<Vec<ProviderRequest>>,
    }

    impl ScriptedProvider {
        pub fn new(answers: Vec<Scripted>) -> Self {
            Self {
                answers: Mutex::new(answers.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn text(body: impl Into<String>) -> Self {
            Self::new(vec![Scripted::Text(body.into())])
        }
    }

    #[async_trait]
    impl ContentProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            request: &ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            self.requests.lock().unwrap().push(request.clone());
            let mut answers = self.answers.lock().unwrap();
            let fails_next = matches!(answers.front(), Some(Scripted::Fail(_)));
            let answer = if fails_next || answers.len() > 1 {
                answers.pop_front().unwrap()
            } else {
                match answers.front() {
                    Some(Scripted::Text(t)) => Scripted::Text(t.clone()),
                    Some(Scripted::Empty) => Scripted::Empty,
                    _ => Scripted::Fail(ProviderError::NetworkError("script exhausted".into())),
                }
            };
            match answer {
                Scripted::Text(text) => Ok(ProviderResponse {
                    text: Some(text),
                    model: request.model.clone(),
                    token_usage: TokenUsage::default(),
                    latency_ms: 1,
                }),
                Scripted::Empty => Ok(ProviderResponse {
                    text: None,
                    model: request.model.clone(),
                    token_usage: TokenUsage::default(),
                    latency_ms: 1,
                }),
                Scripted::Fail(e) => Err(e),
            }
        }
    }

    pub fn single_choice_json(id: &str, text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "type": "single_choice",
            "learningObjective": "LO1",
            "question": text,
            "options": ["Alpha", "Beta", "Gamma", "Delta"],
            "correctAnswer": ["Alpha"],
            "explanation": "Alpha is first.",
            "cognitiveLevel": "Reproduction",
            "rubric": []
        })
    }

    pub fn exam_json(n: usize) -> String {
        let questions: Vec<_> = (0..n)
            .map(|i| single_choice_json(&format!("q{i}"), &format!("Question {i}?")))
            .collect();
        serde_json::json!({
            "metadata": { "title": "Sample", "courseCode": "BIO-101" },
            "questions": questions
        })
        .to_string()
    }
}

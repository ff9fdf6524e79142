//! The in-memory exam and its mutation discipline.
//!
//! A workspace owns the current exam. At most one full generation and,
//! independently, at most one single-item regeneration run at a time.
//! Mutations are applied under a write lock, so readers see either the
//! previous collection or the new one, never a partial merge.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::sync::RwLock;

use crate::client::ExamClient;
use crate::error::ExamError;
use crate::model::{GeneratedExam, GeneratorConfig, Question, RegenerationMode};
use crate::schema::validate_question;

#[derive(Debug, Default)]
struct State {
    exam: Option<GeneratedExam>,
    /// Bumped whenever the whole exam is replaced or cleared.
    epoch: u64,
}

/// Holds the generation flag for the lifetime of one call.
struct GenerationToken<'a>(&'a AtomicBool);

impl<'a> GenerationToken<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ExamError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExamError::GenerationInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for GenerationToken<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Holds the single regeneration slot, keyed by question index.
struct RegenerationToken<'a>(&'a Mutex<Option<usize>>);

impl<'a> RegenerationToken<'a> {
    fn acquire(slot: &'a Mutex<Option<usize>>, index: usize) -> Result<Self, ExamError> {
        let mut guard = slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(busy) = *guard {
            let reason = if busy == index {
                "a regeneration for this question is already in flight".to_string()
            } else {
                format!("question {busy} is being regenerated")
            };
            return Err(ExamError::MergeConflict { index, reason });
        }
        *guard = Some(index);
        Ok(Self(slot))
    }
}

impl Drop for RegenerationToken<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// A single exam instance with its authoring operations.
pub struct ExamWorkspace {
    client: ExamClient,
    state: RwLock<State>,
    generating: AtomicBool,
    regenerating: Mutex<Option<usize>>,
}

impl ExamWorkspace {
    pub fn new(client: ExamClient) -> Self {
        Self::with_exam(client, None)
    }

    /// Start from a previously persisted exam.
    pub fn with_exam(client: ExamClient, exam: Option<GeneratedExam>) -> Self {
        Self {
            client,
            state: RwLock::new(State { exam, epoch: 0 }),
            generating: AtomicBool::new(false),
            regenerating: Mutex::new(None),
        }
    }

    pub fn client(&self) -> &ExamClient {
        &self.client
    }

    /// Index currently being regenerated, if any.
    pub fn regenerating_index(&self) -> Option<usize> {
        *self.regenerating.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Clone of the current exam.
    pub async fn snapshot(&self) -> Option<GeneratedExam> {
        self.state.read().await.exam.clone()
    }

    /// Run `f` against the current exam under the read lock.
    pub async fn read<R>(&self, f: impl FnOnce(&GeneratedExam) -> R) -> Result<R, ExamError> {
        let state = self.state.read().await;
        state.exam.as_ref().map(f).ok_or(ExamError::NoExam)
    }

    /// Generate a fresh exam and replace the current one wholesale.
    pub async fn generate(&self, config: &GeneratorConfig) -> Result<GeneratedExam, ExamError> {
        let _token = GenerationToken::acquire(&self.generating)?;
        let exam = self.client.generate(config).await?;
        let mut state = self.state.write().await;
        state.exam = Some(exam.clone());
        state.epoch += 1;
        Ok(exam)
    }

    /// Regenerate the question at `index` and merge it in place.
    ///
    /// On any failure the exam is left untouched.
    pub async fn regenerate(
        &self,
        config: &GeneratorConfig,
        index: usize,
        mode: RegenerationMode,
    ) -> Result<Question, ExamError> {
        let _token = RegenerationToken::acquire(&self.regenerating, index)?;

        let (original, epoch) = {
            let state = self.state.read().await;
            let exam = state.exam.as_ref().ok_or(ExamError::NoExam)?;
            let original = exam
                .questions
                .get(index)
                .cloned()
                .ok_or(ExamError::IndexOutOfRange {
                    index,
                    len: exam.questions.len(),
                })?;
            (original, state.epoch)
        };

        let question = self.client.regenerate_one(config, mode, &original).await?;

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            return Err(ExamError::MergeConflict {
                index,
                reason: "the exam was replaced while the question was regenerating".into(),
            });
        }
        let slot = state
            .exam
            .as_mut()
            .and_then(|exam| exam.questions.get_mut(index))
            .ok_or(ExamError::NoExam)?;
        *slot = question.clone();
        tracing::info!(index, id = %question.id, "merged regenerated question");
        Ok(question)
    }

    /// Replace the question at `index` with a manual edit, keeping its id.
    ///
    /// Empty rubric, options and blank stem are stored as absent.
    pub async fn update_question(
        &self,
        index: usize,
        mut question: Question,
    ) -> Result<Question, ExamError> {
        // The slot is checked under the write lock: a regeneration that
        // starts afterwards reads the edited question.
        let mut state = self.state.write().await;
        if self.regenerating_index() == Some(index) {
            return Err(ExamError::MergeConflict {
                index,
                reason: "a regeneration for this question is in flight".into(),
            });
        }
        let exam = state.exam.as_mut().ok_or(ExamError::NoExam)?;
        let len = exam.questions.len();
        let slot = exam
            .questions
            .get_mut(index)
            .ok_or(ExamError::IndexOutOfRange { index, len })?;
        question.id = slot.id.clone();
        question.stem = question.stem.filter(|s| !s.trim().is_empty());
        question.options = question.options.filter(|o| !o.is_empty());
        question.rubric = question.rubric.filter(|r| !r.is_empty());
        validate_question(&question, index).map_err(|e| match e {
            ExamError::SchemaViolation(m) => ExamError::InputValidation(m),
            other => other,
        })?;
        *slot = question.clone();
        tracing::debug!(index, "question edited");
        Ok(question)
    }

    /// Replace the whole exam, e.g. after loading a session.
    pub async fn replace(&self, exam: Option<GeneratedExam>) {
        let mut state = self.state.write().await;
        state.exam = exam;
        state.epoch += 1;
    }

    /// Drop the current exam.
    pub async fn clear(&self) {
        self.replace(None).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::client::testing::*;
    use crate::client::ClientSettings;
    use crate::error::ProviderError;
    use crate::traits::{ContentProvider, ProviderRequest, ProviderResponse, TokenUsage};

    /// Answers immediately, except single-item requests which wait for `gate`.
    struct GatedProvider {
        gate: Notify,
        gate_generation: bool,
    }

    #[async_trait]
    impl ContentProvider for GatedProvider {
        fn name(&self) -> &str {
            "gated"
        }

        async fn generate(
            &self,
            request: &ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            let single = request.response_schema == Some(crate::schema::regeneration_schema());
            if single || self.gate_generation {
                self.gate.notified().await;
            }
            let text = if single {
                serde_json::json!({ "questions": [single_choice_json("x", "Regenerated?")] })
                    .to_string()
            } else {
                exam_json(5)
            };
            Ok(ProviderResponse {
                text: Some(text),
                model: request.model.clone(),
                token_usage: TokenUsage::default(),
                latency_ms: 1,
            })
        }
    }

    fn config() -> GeneratorConfig {
        GeneratorConfig {
            source_text: "x".repeat(80),
            ..Default::default()
        }
    }

    fn workspace(provider: Arc<dyn ContentProvider>) -> ExamWorkspace {
        ExamWorkspace::new(ExamClient::new(provider, ClientSettings::default()))
    }

    async fn seeded(provider: Arc<dyn ContentProvider>) -> ExamWorkspace {
        let ws = workspace(provider);
        let exam = crate::schema::decode_exam(&exam_json(5)).unwrap();
        ws.replace(Some(exam)).await;
        ws
    }

    #[tokio::test]
    async fn regeneration_merges_only_target_index() {
        let replacement =
            serde_json::json!({ "questions": [single_choice_json("new", "Fresh?")] }).to_string();
        let ws = seeded(Arc::new(ScriptedProvider::text(replacement))).await;

        let before = ws.snapshot().await.unwrap();
        let addrs_before: Vec<*const Question> = ws
            .read(|e| e.questions.iter().map(|q| q as *const Question).collect())
            .await
            .unwrap();

        ws.regenerate(&config(), 2, RegenerationMode::Easier)
            .await
            .unwrap();

        let after = ws.snapshot().await.unwrap();
        let addrs_after: Vec<*const Question> = ws
            .read(|e| e.questions.iter().map(|q| q as *const Question).collect())
            .await
            .unwrap();

        assert_eq!(after.questions.len(), 5);
        for i in [0, 1, 3, 4] {
            assert_eq!(after.questions[i], before.questions[i]);
            assert_eq!(addrs_after[i], addrs_before[i]);
        }
        assert_eq!(after.questions[2].id, before.questions[2].id);
        assert_eq!(after.questions[2].question, "Fresh?");
    }

    #[tokio::test]
    async fn failed_regeneration_leaves_exam_unchanged() {
        let provider = ScriptedProvider::new(vec![Scripted::Fail(ProviderError::Timeout(30))]);
        let ws = seeded(Arc::new(provider)).await;
        let before = ws.snapshot().await.unwrap();

        let err = ws
            .regenerate(&config(), 1, RegenerationMode::Harder)
            .await
            .unwrap_err();
        assert!(matches!(err, ExamError::ProviderUnavailable(_)));
        assert_eq!(ws.snapshot().await.unwrap(), before);
        assert_eq!(ws.regenerating_index(), None);
    }

    #[tokio::test]
    async fn second_regeneration_is_rejected_while_first_in_flight() {
        let provider = Arc::new(GatedProvider {
            gate: Notify::new(),
            gate_generation: false,
        });
        let ws = seeded(provider.clone()).await;
        let cfg = config();

        let (first, second) = tokio::join!(
            ws.regenerate(&cfg, 1, RegenerationMode::Harder),
            async {
                let same = ws.regenerate(&cfg, 1, RegenerationMode::Easier).await;
                let other = ws.regenerate(&cfg, 3, RegenerationMode::Easier).await;
                provider.gate.notify_one();
                (same, other)
            }
        );

        assert!(first.is_ok());
        assert!(matches!(second.0, Err(ExamError::MergeConflict { index: 1, .. })));
        assert!(matches!(second.1, Err(ExamError::MergeConflict { index: 3, .. })));
    }

    #[tokio::test]
    async fn regeneration_rejected_when_exam_replaced_in_flight() {
        let provider = Arc::new(GatedProvider {
            gate: Notify::new(),
            gate_generation: false,
        });
        let ws = seeded(provider.clone()).await;
        let cfg = config();

        let (regen, generated) = tokio::join!(
            ws.regenerate(&cfg, 0, RegenerationMode::Shorter),
            async {
                let generated = ws.generate(&cfg).await;
                provider.gate.notify_one();
                generated
            }
        );

        assert!(generated.is_ok());
        assert!(matches!(regen, Err(ExamError::MergeConflict { index: 0, .. })));
    }

    #[tokio::test]
    async fn concurrent_generation_is_rejected() {
        let provider = Arc::new(GatedProvider {
            gate: Notify::new(),
            gate_generation: true,
        });
        let ws = workspace(provider.clone());
        let cfg = config();

        let (first, second) = tokio::join!(ws.generate(&cfg), async {
            let second = ws.generate(&cfg).await;
            provider.gate.notify_one();
            second
        });
        assert!(first.is_ok());
        assert!(matches!(second, Err(ExamError::GenerationInProgress)));
    }

    #[tokio::test]
    async fn regeneration_requires_exam_and_valid_index() {
        let ws = workspace(Arc::new(ScriptedProvider::text("{}")));
        assert!(matches!(
            ws.regenerate(&config(), 0, RegenerationMode::Random).await,
            Err(ExamError::NoExam)
        ));

        let ws = seeded(Arc::new(ScriptedProvider::text("{}"))).await;
        assert!(matches!(
            ws.regenerate(&config(), 9, RegenerationMode::Random).await,
            Err(ExamError::IndexOutOfRange { index: 9, len: 5 })
        ));
    }

    #[tokio::test]
    async fn manual_edit_keeps_id_and_validates() {
        let ws = seeded(Arc::new(ScriptedProvider::text("{}"))).await;
        let mut edited = ws.read(|e| e.questions[0].clone()).await.unwrap();
        let original_id = edited.id.clone();
        edited.id = "other".into();
        edited.question = "Edited?".into();

        let saved = ws.update_question(0, edited.clone()).await.unwrap();
        assert_eq!(saved.id, original_id);

        edited.correct_answer = crate::model::CorrectAnswer::Single("Omega".into());
        assert!(matches!(
            ws.update_question(0, edited).await,
            Err(ExamError::InputValidation(_))
        ));
    }

    #[tokio::test]
    async fn manual_edit_drops_empty_rubric_and_stem() {
        let ws = seeded(Arc::new(ScriptedProvider::text("{}"))).await;
        let mut edited = ws.read(|e| e.questions[1].clone()).await.unwrap();
        edited.rubric = Some(Vec::new());
        edited.stem = Some("  ".into());

        let saved = ws.update_question(1, edited).await.unwrap();
        assert!(saved.rubric.is_none());
        assert!(saved.stem.is_none());
        let stored = ws.read(|e| e.questions[1].clone()).await.unwrap();
        assert_eq!(stored, saved);
    }

    #[tokio::test]
    async fn edit_of_regenerating_index_conflicts_while_others_survive() {
        let provider = Arc::new(GatedProvider {
            gate: Notify::new(),
            gate_generation: false,
        });
        let ws = seeded(provider.clone()).await;
        let cfg = config();
        let mut edited = ws.read(|e| e.questions[2].clone()).await.unwrap();
        edited.question = "Edited by hand?".into();

        let (regen, edits) = tokio::join!(
            ws.regenerate(&cfg, 1, RegenerationMode::Harder),
            async {
                let mut same = ws.read(|e| e.questions[1].clone()).await.unwrap();
                same.question = "Lost?".into();
                let same = ws.update_question(1, same).await;
                let other = ws.update_question(2, edited).await;
                provider.gate.notify_one();
                (same, other)
            }
        );

        assert!(regen.is_ok());
        assert!(matches!(edits.0, Err(ExamError::MergeConflict { index: 1, .. })));
        assert!(edits.1.is_ok());
        let exam = ws.snapshot().await.unwrap();
        assert_eq!(exam.questions[1].question, "Regenerated?");
        assert_eq!(exam.questions[2].question, "Edited by hand?");
    }
}

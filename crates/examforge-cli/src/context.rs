//! Per-invocation state: configuration, session, and workspace wiring.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use examforge_core::error::ExamError;
use examforge_core::model::{ChatMessage, GeneratedExam, GeneratorConfig, Question};
use examforge_core::session::{DebouncedStore, JsonFileStore, SessionSnapshot, SessionStore};
use examforge_core::{ExamClient, ExamWorkspace};
use examforge_providers::config::{load_config_from, ExamforgeConfig};
use examforge_providers::mock::MockProvider;

use crate::ProviderArgs;

pub struct AppContext {
    pub config: ExamforgeConfig,
    store: DebouncedStore,
    session: Option<SessionSnapshot>,
}

impl AppContext {
    /// Load the configuration and the stored session.
    pub async fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config_from(config_path)?;
        let file_store = JsonFileStore::new(&config.session_dir, &config.session_id);
        let session = file_store
            .load()
            .await
            .context("failed to load the stored session (run `examforge reset` to discard it)")?;
        tracing::debug!(
            session = %file_store.path().display(),
            has_exam = session.as_ref().is_some_and(|s| s.result.is_some()),
            "session loaded"
        );
        let store = DebouncedStore::new(Arc::new(file_store), config.save_debounce());
        Ok(Self {
            config,
            store,
            session,
        })
    }

    /// Generator settings of the last generation, or defaults.
    pub fn generator_config(&self) -> GeneratorConfig {
        self.session
            .as_ref()
            .map(|s| s.config.clone())
            .unwrap_or_default()
    }

    /// The stored exam.
    pub fn exam(&self) -> Result<&GeneratedExam> {
        self.session
            .as_ref()
            .and_then(|s| s.result.as_ref())
            .ok_or(ExamError::NoExam)
            .context("no exam in the session, run `examforge generate` first")
    }

    /// Resolve a 1-based question number.
    pub fn question(&self, number: usize) -> Result<(usize, &Question)> {
        let exam = self.exam()?;
        let index = number.checked_sub(1).ok_or_else(|| {
            anyhow::anyhow!("question numbers start at 1")
        })?;
        let question = exam.questions.get(index).ok_or(ExamError::IndexOutOfRange {
            index,
            len: exam.questions.len(),
        })?;
        Ok((index, question))
    }

    pub fn client(&self, args: &ProviderArgs) -> Result<ExamClient> {
        let provider = self.config.provider(args.provider.as_deref())?;
        let settings = self.config.client_settings(args.model.as_deref());
        tracing::debug!(provider = provider.name(), model = %settings.model, "provider ready");
        Ok(ExamClient::new(provider, settings))
    }

    /// A workspace seeded with the stored exam.
    pub fn workspace(&self, args: &ProviderArgs) -> Result<ExamWorkspace> {
        let exam = self.session.as_ref().and_then(|s| s.result.clone());
        Ok(ExamWorkspace::with_exam(self.client(args)?, exam))
    }

    /// A workspace for local mutations that never reach a provider.
    pub fn offline_workspace(&self) -> ExamWorkspace {
        let client = ExamClient::new(
            Arc::new(MockProvider::with_empty_response()),
            self.config.client_settings(None),
        );
        let exam = self.session.as_ref().and_then(|s| s.result.clone());
        ExamWorkspace::with_exam(client, exam)
    }

    /// Stored coaching conversation.
    pub fn chat(&self) -> &[ChatMessage] {
        self.session
            .as_ref()
            .map(|s| s.chat.as_slice())
            .unwrap_or_default()
    }

    /// Queue the new session state for writing. The conversation is kept.
    pub fn save(&mut self, config: GeneratorConfig, exam: Option<GeneratedExam>) {
        let mut snapshot = SessionSnapshot::new(config, exam);
        snapshot.chat = self.chat().to_vec();
        self.schedule(snapshot);
    }

    /// Queue a new conversation, keeping the exam and its settings.
    pub fn save_chat(&mut self, chat: Vec<ChatMessage>) {
        let exam = self.session.as_ref().and_then(|s| s.result.clone());
        let mut snapshot = SessionSnapshot::new(self.generator_config(), exam);
        snapshot.chat = chat;
        self.schedule(snapshot);
    }

    fn schedule(&mut self, snapshot: SessionSnapshot) {
        self.store.schedule(snapshot.clone());
        self.session = Some(snapshot);
    }

    /// Write any pending session state.
    pub async fn finish(self) -> Result<()> {
        self.store.flush().await
    }
}

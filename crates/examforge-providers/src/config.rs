//! Configuration and provider factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examforge_core::client::{ClientSettings, DEFAULT_MODEL};
use examforge_core::error::ExamError;
use examforge_core::model::Language;
use examforge_core::session::{default_session_dir, DEFAULT_SESSION_ID};
use examforge_core::traits::ContentProvider;
use examforge_core::validation::UploadLimits;

use crate::gemini::GeminiProvider;
use crate::mock::MockProvider;

/// Environment variable that sets the Gemini credential.
pub const GEMINI_KEY_ENV: &str = "EXAMFORGE_GEMINI_KEY";

/// Configuration for a single provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        #[serde(default)]
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    Mock {
        /// Prompt substring → JSON payload.
        #[serde(default)]
        responses: HashMap<String, String>,
        #[serde(default)]
        default_response: Option<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Gemini {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Mock {
                responses,
                default_response,
            } => f
                .debug_struct("Mock")
                .field("responses", &responses.len())
                .field("default_response", &default_response.is_some())
                .finish(),
        }
    }
}

/// Top-level examforge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamforgeConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Default provider to use.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Default model to use.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Language of the grading directive.
    #[serde(default)]
    pub grading_language: Language,
    /// Directory holding session files.
    #[serde(default = "default_session_dir")]
    pub session_dir: PathBuf,
    /// Key of the persisted session record.
    #[serde(default = "default_session_id")]
    pub session_id: String,
    /// Output directory for exports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Per-file ceiling for generation sources.
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: u64,
    /// Per-file ceiling for grading documents.
    #[serde(default = "default_max_grading_upload")]
    pub max_grading_upload_bytes: u64,
    /// Minimum source text length when no files are given.
    #[serde(default = "default_min_source_chars")]
    pub min_source_chars: usize,
    /// Quiet period before a session save is written.
    #[serde(default = "default_save_debounce")]
    pub save_debounce_ms: u64,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_session_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./examforge-output")
}
fn default_max_upload() -> u64 {
    UploadLimits::default().max_upload_bytes
}
fn default_max_grading_upload() -> u64 {
    UploadLimits::default().max_grading_upload_bytes
}
fn default_min_source_chars() -> usize {
    UploadLimits::default().min_source_chars
}
fn default_save_debounce() -> u64 {
    250
}

impl Default for ExamforgeConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            temperature: default_temperature(),
            grading_language: Language::default(),
            session_dir: default_session_dir(),
            session_id: default_session_id(),
            output_dir: default_output_dir(),
            max_upload_bytes: default_max_upload(),
            max_grading_upload_bytes: default_max_grading_upload(),
            min_source_chars: default_min_source_chars(),
            save_debounce_ms: default_save_debounce(),
        }
    }
}

impl ExamforgeConfig {
    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_upload_bytes: self.max_upload_bytes,
            max_grading_upload_bytes: self.max_grading_upload_bytes,
            min_source_chars: self.min_source_chars,
        }
    }

    pub fn client_settings(&self, model: Option<&str>) -> ClientSettings {
        ClientSettings {
            model: model.unwrap_or(&self.default_model).to_string(),
            temperature: self.temperature,
            grading_language: self.grading_language,
        }
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    /// Build the named provider, or the default one.
    pub fn provider(&self, name: Option<&str>) -> Result<Arc<dyn ContentProvider>, ExamError> {
        let name = name.unwrap_or(&self.default_provider);
        let config = self.providers.get(name).ok_or_else(|| {
            ExamError::Configuration(format!(
                "provider '{name}' is not configured (set {GEMINI_KEY_ENV} or add it to examforge.toml)"
            ))
        })?;
        create_provider(name, config)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Gemini { api_key, base_url } => ProviderConfig::Gemini {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
        mock @ ProviderConfig::Mock { .. } => mock.clone(),
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examforge.toml` in the current directory
/// 2. `~/.config/examforge/config.toml`
///
/// Environment variable override: `EXAMFORGE_GEMINI_KEY`.
pub fn load_config() -> Result<ExamforgeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamforgeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examforge.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ExamforgeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamforgeConfig::default(),
    };

    if let Ok(key) = std::env::var(GEMINI_KEY_ENV) {
        let entry = config
            .providers
            .entry("gemini".into())
            .or_insert(ProviderConfig::Gemini {
                api_key: String::new(),
                base_url: None,
            });
        if let ProviderConfig::Gemini { api_key, .. } = entry {
            *api_key = key;
        }
    }

    let resolved: HashMap<String, ProviderConfig> = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    config.providers = resolved;

    tracing::debug!(providers = config.providers.len(), "configuration loaded");
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examforge"))
}

/// Create a provider instance from its configuration.
///
/// A missing credential is a configuration error; no request is attempted.
pub fn create_provider(
    name: &str,
    config: &ProviderConfig,
) -> Result<Arc<dyn ContentProvider>, ExamError> {
    match config {
        ProviderConfig::Gemini { api_key, base_url } => {
            if api_key.trim().is_empty() {
                return Err(ExamError::Configuration(format!(
                    "provider '{name}' has no API key (set {GEMINI_KEY_ENV})"
                )));
            }
            let provider = GeminiProvider::new(api_key, base_url.clone())?;
            Ok(Arc::new(provider))
        }
        ProviderConfig::Mock {
            responses,
            default_response,
        } => Ok(Arc::new(MockProvider::new(
            responses.clone(),
            default_response.clone(),
        ))),
    }
}

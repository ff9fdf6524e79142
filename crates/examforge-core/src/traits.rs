//! Provider seam for structured content generation.
//!
//! The `ContentProvider` trait is implemented by the `examforge-providers`
//! crate. A request carries an ordered list of parts (inline file payloads
//! and text), a system instruction, and a response schema the provider is
//! asked to constrain its JSON output to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;
use crate::model::ChatMessage;

/// Trait for generative backends that accept multi-part requests.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Human-readable provider name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send one request and return the raw payload.
    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}

/// One element of a multi-part request.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    /// A binary document sent inline.
    Inline {
        mime_type: String,
        #[serde(with = "crate::model::base64_bytes")]
        data: Vec<u8>,
    },
    /// Plain instruction or source text.
    Text { text: String },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Part::Inline {
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::Inline { .. } => None,
        }
    }
}

impl std::fmt::Debug for Part {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Part::Inline { mime_type, data } => f
                .debug_struct("Inline")
                .field("mime_type", mime_type)
                .field("bytes", &data.len())
                .finish(),
            Part::Text { text } => f.debug_struct("Text").field("text", text).finish(),
        }
    }
}

/// A structured-generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// Model identifier (e.g. "gemini-2.5-flash").
    pub model: String,
    #[serde(default)]
    pub system_instruction: Option<String>,
    /// Earlier conversation turns, oldest first. `parts` is the current turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ChatMessage>,
    pub parts: Vec<Part>,
    /// Requested response MIME type, `application/json` for structured output.
    pub response_mime_type: String,
    #[serde(default)]
    pub response_schema: Option<Value>,
    pub temperature: f64,
}

impl ProviderRequest {
    /// Concatenate all text parts, for matching and logging.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Token usage reported by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Raw provider answer. `text` is `None` when the provider returned no payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub text: Option<String>,
    pub model: String,
    pub token_usage: TokenUsage,
    pub latency_ms: u64,
}

/// MIME type requested for structured output.
pub const JSON_MIME_TYPE: &str = "application/json";

/// Extract the JSON document from a provider payload.
///
/// Some models wrap structured output in a fenced block even when asked for
/// raw JSON. A ```json fence is preferred, then an untagged fence, then the
/// trimmed payload itself.
pub fn extract_json_payload(response: &str) -> String {
    let mut json_blocks = Vec::new();
    let mut generic_blocks = Vec::new();
    let mut in_block = false;
    let mut is_json_block = false;
    let mut is_generic_block = false;
    let mut current_block = String::new();

    for line in response.lines() {
        let trimmed = line.trim();

        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            let lang = trimmed.trim_start_matches('`').trim().to_lowercase();
            is_json_block = lang == "json";
            is_generic_block = lang.is_empty();
            current_block.clear();
            continue;
        }

        if in_block && trimmed == "```" {
            in_block = false;
            if is_json_block {
                json_blocks.push(current_block.clone());
            } else if is_generic_block {
                generic_blocks.push(current_block.clone());
            }
            current_block.clear();
            continue;
        }

        if in_block {
            if !current_block.is_empty() {
                current_block.push('\n');
            }
            current_block.push_str(line);
        }
    }

    if let Some(block) = json_blocks.into_iter().next() {
        return block;
    }
    if let Some(block) = generic_blocks.into_iter().next() {
        return block;
    }
    response.trim().to_string()
}

//! Mock provider for tests and offline runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use examforge_core::error::ProviderError;
use examforge_core::traits::{ContentProvider, ProviderRequest, ProviderResponse, TokenUsage};

/// A mock provider that answers from a table of canned payloads.
///
/// The request's text parts are matched against the table keys; the longest
/// matching key wins. Without a match the default payload is returned, and
/// without a default the response carries no payload at all.
pub struct MockProvider {
    /// Map of prompt substring → payload.
    responses: HashMap<String, String>,
    /// Payload used when no key matches.
    default_response: Option<String>,
    /// Error message returned instead of any payload.
    failure: Option<String>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<ProviderRequest>>,
}

impl MockProvider {
    /// Create a new mock provider with the given prompt→payload mappings.
    pub fn new(responses: HashMap<String, String>, default_response: Option<String>) -> Self {
        Self {
            responses,
            default_response,
            failure: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same payload.
    pub fn with_fixed_response(response: &str) -> Self {
        Self::new(HashMap::new(), Some(response.to_string()))
    }

    /// Create a mock whose responses never carry a payload.
    pub fn with_empty_response() -> Self {
        Self::new(HashMap::new(), None)
    }

    /// Create a mock that fails every request with an API error.
    pub fn with_failure(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::with_empty_response()
        }
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this provider.
    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ContentProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap_or_else(|e| e.into_inner()) = Some(request.clone());

        if let Some(message) = &self.failure {
            return Err(ProviderError::ApiError {
                status: 503,
                message: message.clone(),
            });
        }

        let prompt = request.text();
        let text = self
            .responses
            .iter()
            .filter(|(key, _)| prompt.contains(key.as_str()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, v)| v.clone())
            .or_else(|| self.default_response.clone());

        let prompt_tokens = (prompt.len() / 4) as u32; // Rough estimate
        let completion_tokens = text.as_ref().map_or(0, |t| t.len() / 4) as u32;

        Ok(ProviderResponse {
            text,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examforge_core::traits::{Part, JSON_MIME_TYPE};

    fn request(prompt: &str) -> ProviderRequest {
        ProviderRequest {
            model: "mock".into(),
            system_instruction: None,
            history: Vec::new(),
            parts: vec![Part::text(prompt)],
            response_mime_type: JSON_MIME_TYPE.into(),
            response_schema: None,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn fixed_response() {
        let provider = MockProvider::with_fixed_response("{}");
        let response = provider.generate(&request("anything")).await.unwrap();
        assert_eq!(response.text.as_deref(), Some("{}"));
        assert_eq!(provider.call_count(), 1);
        assert!(provider.last_request().is_some());
    }

    #[tokio::test]
    async fn longest_key_wins() {
        let mut responses = HashMap::new();
        responses.insert("exam".to_string(), "full".to_string());
        responses.insert("replacement exam question".to_string(), "single".to_string());

        let provider = MockProvider::new(responses, None);

        let resp = provider
            .generate(&request("Generate an exam with 5 questions."))
            .await
            .unwrap();
        assert_eq!(resp.text.as_deref(), Some("full"));

        let resp = provider
            .generate(&request("Generate one (1) replacement exam question"))
            .await
            .unwrap();
        assert_eq!(resp.text.as_deref(), Some("single"));

        let resp = provider.generate(&request("unrelated")).await.unwrap();
        assert!(resp.text.is_none());
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn failure_is_api_error() {
        let provider = MockProvider::with_failure("quota exhausted");
        let err = provider.generate(&request("x")).await.unwrap_err();
        assert!(err.to_string().contains("quota exhausted"));
    }
}

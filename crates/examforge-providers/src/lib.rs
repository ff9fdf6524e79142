//! examforge-providers: generative provider integrations.
//!
//! Implements the `ContentProvider` trait for the Gemini `generateContent`
//! API and a scripted mock, plus the configuration that selects between them.

pub mod config;
pub mod gemini;
pub mod mock;

pub use config::{create_provider, load_config, load_config_from, ExamforgeConfig, ProviderConfig};
pub use examforge_core::error::ProviderError;

//! examforge-core: exam model, structured-generation protocol, and scoring.
//!
//! This crate defines the canonical exam data model, the prompt and schema
//! contract spoken with generative providers, the workspace that merges
//! regenerated questions, and the pure analytics built on top.

pub mod analytics;
pub mod client;
pub mod error;
pub mod model;
pub mod normalize;
pub mod prompt;
pub mod schema;
pub mod session;
pub mod traits;
pub mod validation;
pub mod verify;
pub mod workspace;

pub use client::{ClientSettings, ExamClient};
pub use error::{ExamError, ProviderError};
pub use workspace::ExamWorkspace;

//! Input checks performed before any provider request.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExamError;
use crate::model::{GeneratorConfig, UploadedFile};

/// Extensions accepted as generation source material.
pub const GENERATION_EXTENSIONS: &[&str] = &["pdf", "txt", "md", "pptx", "docx"];

/// Extensions accepted for grading documents.
pub const GRADING_EXTENSIONS: &[&str] = &["pdf", "docx", "txt"];

/// Largest exam the generator will request.
pub const MAX_QUESTIONS: u32 = 20;

/// Which operation an upload is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPurpose {
    Generation,
    Grading,
}

impl UploadPurpose {
    fn extensions(self) -> &'static [&'static str] {
        match self {
            UploadPurpose::Generation => GENERATION_EXTENSIONS,
            UploadPurpose::Grading => GRADING_EXTENSIONS,
        }
    }
}

/// Size and length ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadLimits {
    pub max_upload_bytes: u64,
    pub max_grading_upload_bytes: u64,
    pub min_source_chars: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_upload_bytes: 4 * 1024 * 1024,
            max_grading_upload_bytes: 8 * 1024 * 1024,
            min_source_chars: 50,
        }
    }
}

impl UploadLimits {
    fn ceiling(&self, purpose: UploadPurpose) -> u64 {
        match purpose {
            UploadPurpose::Generation => self.max_upload_bytes,
            UploadPurpose::Grading => self.max_grading_upload_bytes,
        }
    }
}

/// MIME type for a supported file extension.
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    let mime = match extension.to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => return None,
    };
    Some(mime)
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn mb(bytes: u64) -> u64 {
    bytes / (1024 * 1024)
}

/// Check one file against the type whitelist and size ceiling.
pub fn check_file(
    file: &UploadedFile,
    purpose: UploadPurpose,
    limits: &UploadLimits,
) -> Result<(), ExamError> {
    let allowed = purpose.extensions();
    match extension_of(&file.name) {
        Some(ext) if allowed.contains(&ext.as_str()) => {}
        _ => {
            return Err(ExamError::input(format!(
                "file \"{}\" has an unsupported type (accepted: {})",
                file.name,
                allowed.join(", ")
            )))
        }
    }
    let ceiling = limits.ceiling(purpose);
    if file.size > ceiling {
        return Err(ExamError::input(format!(
            "file \"{}\" is too large (max {}MB)",
            file.name,
            mb(ceiling)
        )));
    }
    Ok(())
}

/// Read a file from disk, enforcing the ceiling before loading it.
pub async fn read_upload(
    path: &Path,
    purpose: UploadPurpose,
    limits: &UploadLimits,
) -> Result<UploadedFile, ExamError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let unreadable = |e: std::io::Error| ExamError::input(format!("cannot read \"{name}\": {e}"));

    let size = tokio::fs::metadata(path).await.map_err(unreadable)?.len();
    let mime_type = extension_of(&name)
        .and_then(|ext| mime_for_extension(&ext))
        .unwrap_or("application/octet-stream")
        .to_string();
    let mut file = UploadedFile {
        name: name.clone(),
        mime_type,
        size,
        data: Vec::new(),
    };
    check_file(&file, purpose, limits)?;

    file.data = tokio::fs::read(path).await.map_err(unreadable)?;
    file.size = file.data.len() as u64;
    tracing::debug!(file = %file.name, bytes = file.size, "loaded upload");
    Ok(file)
}

/// Validate a generation request.
///
/// Without files the source text must reach the minimum length; with files
/// every file must pass [`check_file`].
pub fn validate_generation_input(
    config: &GeneratorConfig,
    limits: &UploadLimits,
) -> Result<(), ExamError> {
    if config.num_questions == 0 || config.num_questions > MAX_QUESTIONS {
        return Err(ExamError::input(format!(
            "number of questions must be between 1 and {MAX_QUESTIONS}"
        )));
    }
    if config.files.is_empty() {
        let chars = config.source_text.trim().chars().count();
        if chars < limits.min_source_chars {
            return Err(ExamError::input(format!(
                "source text is too short ({chars} characters, minimum {})",
                limits.min_source_chars
            )));
        }
    }
    for file in &config.files {
        check_file(file, UploadPurpose::Generation, limits)?;
    }
    Ok(())
}

/// Validate a grading request: both documents and an explicit consent.
pub fn validate_grading_input(
    key: Option<&UploadedFile>,
    submission: Option<&UploadedFile>,
    privacy_confirmed: bool,
    limits: &UploadLimits,
) -> Result<(), ExamError> {
    let key = key.ok_or_else(|| ExamError::input("an answer key document is required"))?;
    let submission =
        submission.ok_or_else(|| ExamError::input("a student submission document is required"))?;
    if !privacy_confirmed {
        return Err(ExamError::input(
            "confirm that the submission has been anonymised before grading",
        ));
    }
    check_file(key, UploadPurpose::Grading, limits)?;
    check_file(submission, UploadPurpose::Grading, limits)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: u64) -> UploadedFile {
        UploadedFile {
            name: name.into(),
            mime_type: "application/pdf".into(),
            size,
            data: Vec::new(),
        }
    }

    #[test]
    fn short_text_is_rejected() {
        let config = GeneratorConfig {
            source_text: "Too short.".into(),
            ..Default::default()
        };
        let err = validate_generation_input(&config, &UploadLimits::default()).unwrap_err();
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn files_replace_the_text_requirement() {
        let config = GeneratorConfig {
            files: vec![file("chapter.pdf", 1024)],
            ..Default::default()
        };
        assert!(validate_generation_input(&config, &UploadLimits::default()).is_ok());
    }

    #[test]
    fn oversized_file_is_named() {
        let config = GeneratorConfig {
            files: vec![file("slides.pptx", 5 * 1024 * 1024)],
            ..Default::default()
        };
        let err = validate_generation_input(&config, &UploadLimits::default()).unwrap_err();
        assert!(matches!(err, ExamError::InputValidation(ref m) if m.contains("slides.pptx") && m.contains("4MB")));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let limits = UploadLimits::default();
        assert!(check_file(&file("image.png", 10), UploadPurpose::Generation, &limits).is_err());
        assert!(check_file(&file("notes.md", 10), UploadPurpose::Grading, &limits).is_err());
        assert!(check_file(&file("NOTES.MD", 10), UploadPurpose::Generation, &limits).is_ok());
    }

    #[test]
    fn question_count_is_bounded() {
        let config = GeneratorConfig {
            source_text: "x".repeat(100),
            num_questions: 21,
            ..Default::default()
        };
        assert!(validate_generation_input(&config, &UploadLimits::default()).is_err());
    }

    #[test]
    fn grading_requires_consent_and_both_documents() {
        let limits = UploadLimits::default();
        let key = file("key.pdf", 10);
        let work = file("work.docx", 10);
        assert!(validate_grading_input(Some(&key), None, true, &limits).is_err());
        let err = validate_grading_input(Some(&key), Some(&work), false, &limits).unwrap_err();
        assert!(err.to_string().contains("anonymised"));
        assert!(validate_grading_input(Some(&key), Some(&work), true, &limits).is_ok());

        let big = file("work.pdf", 9 * 1024 * 1024);
        assert!(validate_grading_input(Some(&key), Some(&big), true, &limits).is_err());
    }

    #[tokio::test]
    async fn read_upload_infers_mime_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        let file = read_upload(&path, UploadPurpose::Generation, &UploadLimits::default())
            .await
            .unwrap();
        assert_eq!(file.mime_type, "text/plain");
        assert_eq!(file.data, b"hello");
        assert_eq!(file.size, 5);
    }

    #[tokio::test]
    async fn read_upload_rejects_before_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.pdf");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();
        let limits = UploadLimits {
            max_upload_bytes: 1024,
            ..Default::default()
        };
        let err = read_upload(&path, UploadPurpose::Generation, &limits)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("big.pdf"));
    }
}

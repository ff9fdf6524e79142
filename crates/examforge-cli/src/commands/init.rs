//! The `examforge init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("examforge.toml").exists() {
        println!("examforge.toml already exists, skipping.");
    } else {
        std::fs::write("examforge.toml", SAMPLE_CONFIG)?;
        println!("Created examforge.toml");
    }

    println!("\nNext steps:");
    println!("  1. Export EXAMFORGE_GEMINI_KEY or edit examforge.toml");
    println!("  2. Run: examforge generate --text chapter.txt --questions 5");
    println!("  3. Run: examforge export --format all");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examforge configuration

default_provider = "gemini"
default_model = "gemini-2.5-pro"
temperature = 0.7
grading_language = "nl"
output_dir = "./examforge-output"
save_debounce_ms = 250

# Upload ceilings in bytes
max_upload_bytes = 4194304
max_grading_upload_bytes = 8388608
min_source_chars = 50

[providers.gemini]
type = "gemini"
api_key = "${GEMINI_API_KEY}"

# Offline provider answering from canned payloads, keyed by prompt substring.
# [providers.mock]
# type = "mock"
# default_response = '{"metadata": {"title": "Demo"}, "questions": []}'
"#;

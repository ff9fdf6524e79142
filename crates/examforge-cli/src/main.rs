//! examforge CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use examforge_core::model::{Difficulty, Language, QuestionTypeMix, RegenerationMode};
use examforge_export::ExportVariant;

mod commands;
mod context;

#[derive(Parser)]
#[command(name = "examforge", version, about = "LLM-assisted exam authoring")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Provider selection shared by the commands that call a model.
#[derive(Args, Clone, Default)]
pub struct ProviderArgs {
    /// Provider name from the config (defaults to `default_provider`)
    #[arg(long)]
    pub provider: Option<String>,

    /// Model to request (defaults to `default_model`)
    #[arg(long)]
    pub model: Option<String>,
}

/// Source material and exam settings for `generate`.
#[derive(Args)]
pub struct GenerateArgs {
    /// Plain-text file with the source material
    #[arg(long)]
    pub text: Option<PathBuf>,

    /// Source document to attach (pdf, txt, md, pptx, docx); repeatable
    #[arg(long = "file")]
    pub files: Vec<PathBuf>,

    /// Learning objectives the questions must test
    #[arg(long)]
    pub objectives: Option<String>,

    /// Sections of the source that are in scope
    #[arg(long)]
    pub scope: Option<String>,

    /// Course code
    #[arg(long)]
    pub course: Option<String>,

    /// Target group
    #[arg(long)]
    pub target_group: Option<String>,

    /// Weighting of the exam within the course
    #[arg(long)]
    pub weighting: Option<String>,

    /// Number of questions (1-20)
    #[arg(long, default_value = "5")]
    pub questions: u32,

    /// Difficulty: vocational, undergraduate, graduate
    #[arg(long, default_value = "undergraduate")]
    pub difficulty: Difficulty,

    /// Question types: single_choice, multiple_response, open, mixed
    #[arg(long = "type", default_value = "mixed")]
    pub question_type: QuestionTypeMix,

    /// Output language: nl, en
    #[arg(long, default_value = "nl")]
    pub language: Language,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config file
    Init,

    /// Generate a new exam and store it in the session
    Generate(GenerateArgs),

    /// Regenerate one question of the current exam
    Regenerate {
        /// Question number (1-based)
        #[arg(long)]
        question: usize,

        /// random, harder, easier, distractors, shorter
        #[arg(long, default_value = "random")]
        mode: RegenerationMode,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Grade a student submission against an answer key
    Grade {
        /// Answer key document (pdf, docx, txt)
        #[arg(long)]
        key: PathBuf,

        /// Student submission document (pdf, docx, txt)
        #[arg(long)]
        submission: PathBuf,

        /// Confirm that the submission has been anonymised
        #[arg(long)]
        confirm_anonymised: bool,

        /// Total points available
        #[arg(long)]
        max_points: Option<f64>,

        /// Output directory for the report (defaults to `output_dir`)
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Export the current exam
    Export {
        /// csv, ans, brightspace, doc, pptx, all
        #[arg(long, default_value = "all")]
        format: String,

        /// teacher or student
        #[arg(long, default_value = "teacher")]
        variant: ExportVariant,

        /// Output directory (defaults to `output_dir`)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show the cut-off score of the current exam
    Cutoff,

    /// Show the exam matrix (learning objective x cognitive level)
    Matrix,

    /// Check a selection of options against a question's answer
    Check {
        /// Question number (1-based)
        #[arg(long)]
        question: usize,

        /// Selected option letters, e.g. "A" or "A,C"
        #[arg(long)]
        select: String,
    },

    /// Replace one question with a hand-edited JSON file
    Edit {
        /// Question number (1-based)
        #[arg(long)]
        question: usize,

        /// JSON file holding the edited question
        #[arg(long)]
        file: PathBuf,
    },

    /// Rewrite a text fragment with the model
    Refine {
        /// Text to rewrite
        #[arg(long)]
        text: String,

        /// What to change
        #[arg(long)]
        instruction: String,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Ask the didactic coach; the conversation is kept in the session
    Chat {
        /// Message to send
        #[arg(long)]
        message: Option<String>,

        /// Start a new conversation
        #[arg(long)]
        reset: bool,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Show the current exam
    Show {
        /// Print the exam as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove the stored session
    Reset,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("examforge=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Generate(args) => commands::generate::execute(args, config).await,
        Commands::Regenerate {
            question,
            mode,
            provider,
        } => commands::regenerate::execute(question, mode, provider, config).await,
        Commands::Grade {
            key,
            submission,
            confirm_anonymised,
            max_points,
            output,
            provider,
        } => {
            commands::grade::execute(
                key,
                submission,
                confirm_anonymised,
                max_points,
                output,
                provider,
                config,
            )
            .await
        }
        Commands::Export {
            format,
            variant,
            output,
        } => commands::export::execute(format, variant, output, config).await,
        Commands::Cutoff => commands::analyze::cutoff(config).await,
        Commands::Matrix => commands::analyze::matrix(config).await,
        Commands::Check { question, select } => {
            commands::check::execute(question, select, config).await
        }
        Commands::Edit { question, file } => commands::edit::execute(question, file, config).await,
        Commands::Refine {
            text,
            instruction,
            provider,
        } => commands::refine::execute(text, instruction, provider, config).await,
        Commands::Chat {
            message,
            reset,
            provider,
        } => commands::chat::execute(message, reset, provider, config).await,
        Commands::Show { json } => commands::show::execute(json, config).await,
        Commands::Reset => commands::show::reset(config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

//! # edgequake-quiz
//!
//! Turn a PDF into study material with an LLM: the topics it covers, a short
//! summary, its keywords, and a multiple-choice quiz.
//!
//! ## Why this crate?
//!
//! The hard part of "ask an LLM for a quiz" is not the prompt. It is that the
//! model wraps JSON in chatter, forgets lines, and the provider throttles you
//! exactly when a class of students uploads their slides. This crate keeps
//! those concerns in one place: tolerant parsers that degrade to empty results
//! instead of erroring, and a bounded exponential-backoff retry for quota /
//! rate-limit failures.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Extract   pdfium text layer, page by page (spawn_blocking)
//!  ├─ 2. Truncate  cap at the context window (default 100 000 chars)
//!  ├─ 3. Prompt    topics / keywords / summary / quiz
//!  ├─ 4. LLM       single call; quizzes retry on quota / rate limit
//!  └─ 5. Parse     first JSON array, or `Question:` blocks
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_quiz::{Difficulty, GenerationConfig, QuizGenerator, QuizOutcome, QuizParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / GEMINI_API_KEY / ANTHROPIC_API_KEY
//!     let generator = QuizGenerator::from_config(GenerationConfig::default())?;
//!     let pdf = std::fs::read("lecture.pdf")?;
//!
//!     println!("{:?}", generator.get_topics(&pdf).await?);
//!
//!     let params = QuizParams::new(Difficulty::Hard, 5, vec!["Ownership".into()])?;
//!     if let QuizOutcome::Questions { questions } = generator.get_quiz(&pdf, params).await? {
//!         for q in questions {
//!             println!("{}", q.raw);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `pdfquiz` binary (clap + anyhow + tracing-subscriber) |
//! | `server` | on      | Enables [`server`] and `pdfquiz serve` (axum + tower-http) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{FailurePolicy, GenerationConfig, GenerationConfigBuilder};
pub use error::{ArtifactError, ProviderError, QuizError};
pub use generate::{resolve_provider, QuizGenerator, NO_TEXT_REASON};
pub use output::{DocumentInsights, McqOptions, McqRecord, QuizOutcome};
pub use pipeline::extract::{PdfiumTextSource, TextSource};
pub use pipeline::llm::{
    CompletionClient, ProviderCompletionClient, RetryOutcome, RetryPolicy, Sleeper, TokioSleeper,
};
pub use pipeline::parse::{extract_json_array, parse_mcq_block, parse_quiz, split_mcq_blocks};
pub use prompts::{build_prompt, Difficulty, QuizParams, TaskKind, TaskRequest};

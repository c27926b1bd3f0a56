//! Pipeline stages for artifact generation.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable on its own and the collaborators (pdfium, the LLM provider) can
//! be replaced by test doubles without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ prompts ──▶ llm ──▶ parse
//! (pdfium)    (builder)   (LLM)   (JSON array / MCQ blocks)
//! ```
//!
//! 1. [`extract`] — PDF bytes to plain text; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 2. [`crate::prompts`] — build the task prompt around the truncated text
//! 3. [`llm`] — drive the completion call, with retry/backoff for quizzes;
//!    the only stage with network I/O
//! 4. [`parse`] — tolerant extraction of arrays and question blocks

pub mod extract;
pub mod llm;
pub mod parse;

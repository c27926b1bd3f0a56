//! Error types for the edgequake-quiz library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`QuizError`] — **Fatal** for the operation that returned it: the
//!   provider is not configured, the request is invalid, or the LLM failed in
//!   a way that retrying cannot fix. Returned as `Err(QuizError)` from the
//!   `get_*` entry points on [`crate::generate::QuizGenerator`].
//!
//! * [`ArtifactError`] — **Non-fatal**: one artifact of a multi-artifact
//!   request failed (e.g. the summary call errored) while the others are fine.
//!   Stored inside [`crate::output::DocumentInsights`] so callers see partial
//!   success rather than losing every artifact to one bad call.
//!
//! * [`ProviderError`] — what a [`crate::pipeline::llm::CompletionClient`]
//!   returns. Only its text is meaningful: the retry policy classifies it by
//!   substring, because providers do not agree on structured error codes.
//!
//! Extraction failures and unparseable model output have no error type:
//! both degrade to empty results instead of surfacing as errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prompts::TaskKind;

/// All fatal errors returned by the edgequake-quiz library.
#[derive(Debug, Error)]
pub enum QuizError {
    // ── Provider errors ───────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM call for `task` failed and was not (or could not be) retried.
    #[error("LLM call for {task} failed: {message}")]
    Provider { task: TaskKind, message: String },

    // ── Request errors ────────────────────────────────────────────────────
    /// A caller-supplied parameter is out of range (e.g. zero questions).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A non-fatal failure of a single artifact within a combined request.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ArtifactError {
    /// The LLM call for this artifact failed.
    #[error("{task}: LLM call failed: {message}")]
    Provider { task: TaskKind, message: String },
}

impl From<ArtifactError> for QuizError {
    fn from(e: ArtifactError) -> Self {
        match e {
            ArtifactError::Provider { task, message } => QuizError::Provider { task, message },
        }
    }
}

/// Error reported by a completion backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Whether this failure is a quota / rate-limit condition worth retrying.
    ///
    /// Matches `quota` or `rate limit` anywhere in the message, ignoring case.
    pub fn is_transient(&self) -> bool {
        let lower = self.message.to_lowercase();
        lower.contains("quota") || lower.contains("rate limit")
    }
}

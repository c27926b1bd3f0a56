//! LLM interaction: call the completion backend, with or without retries.
//!
//! This module owns everything between a built prompt and raw completion
//! text. All prompt engineering lives in
//! [`crate::prompts`] and all parsing in [`crate::pipeline::parse`], so the
//! retry policy can change without touching either.
//!
//! ## Retry Strategy
//!
//! Only the quiz pipeline retries, and only for quota / rate-limit failures
//! (see [`ProviderError::is_transient`]). Everything else aborts on the first
//! attempt: retrying a bad API key or a 500 just burns the caller's time.
//!
//! The loop is an explicit state machine:
//!
//! ```text
//!  ──▶ Attempting ──ok──────▶ Terminated(Success)
//!        │    ▲
//!        │    └── budget left ──┐
//!        │                      │
//!        ├── transient ──▶ BackoffWaiting ── budget spent ─▶ Terminated(Exhausted)
//!        └── fatal ─────────────────────────────────────────▶ Terminated(Fatal)
//! ```
//!
//! Every transient failure waits `initial_delay * 2^n` (n = 0-based retry
//! count) before the budget is checked: with the defaults (5 attempts, 1 s)
//! that is 1 s → 2 s → 4 s → 8 s → 16 s. The wait happens through a
//! [`Sleeper`] so tests can record delays instead of sleeping.

use crate::config::GenerationConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

// ── Collaborator traits ──────────────────────────────────────────────────────

/// A text-completion backend: prompt in, raw completion text out.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Something that can wait. Production uses [`TokioSleeper`].
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer, stalling the calling request for the full delay.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ── Provider adapter ─────────────────────────────────────────────────────────

/// [`CompletionClient`] over any `edgequake-llm` provider.
///
/// Sends the prompt as a single user message with the configured temperature
/// and token cap.
pub struct ProviderCompletionClient {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl ProviderCompletionClient {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &GenerationConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionClient for ProviderCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let start = Instant::now();
        let messages = vec![ChatMessage::user(prompt)];
        let options = build_options(self.temperature, self.max_tokens);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ProviderError::new(e.to_string()))?;

        debug!(
            "Completion: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// Build `CompletionOptions` for one call.
fn build_options(temperature: f32, max_tokens: usize) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(temperature),
        max_tokens: Some(max_tokens),
        ..Default::default()
    }
}

// ── Context window ───────────────────────────────────────────────────────────

/// Cut `text` to at most `max_chars` characters (Unicode scalar values).
///
/// Silent by contract: callers are not told the text was shortened, only the
/// debug log is.
pub fn truncate_to_context(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            debug!("Truncating document text to {} chars", max_chars);
            &text[..byte_idx]
        }
        None => text,
    }
}

// ── Single-shot call ─────────────────────────────────────────────────────────

/// One call, no retry. Used by topics / keywords / summary.
pub async fn complete_once(
    client: &dyn CompletionClient,
    prompt: &str,
) -> Result<String, ProviderError> {
    client.complete(prompt).await.map_err(|e| {
        warn!("LLM call failed — {}", e);
        e
    })
}

// ── Retry state machine ──────────────────────────────────────────────────────

/// Bounded exponential-backoff policy for quota / rate-limit failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, first one included.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: config.initial_backoff(),
        }
    }

    /// Delay after failed attempt `retry_count`: `initial_delay * 2^retry_count`.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        let base_ms = self.initial_delay.as_millis().min(u64::MAX as u128) as u64;
        let factor = 1u64.checked_shl(retry_count).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(factor))
    }

    /// Transition out of `Attempting { retry_count }` after a failed call.
    ///
    /// Every transient failure backs off, the last allowed one included.
    pub fn on_failure(&self, retry_count: u32, error: ProviderError) -> RetryState {
        if !error.is_transient() {
            return RetryState::Terminated(RetryOutcome::Fatal {
                attempts: retry_count + 1,
                error,
            });
        }
        RetryState::BackoffWaiting {
            retry_count,
            delay: self.delay_for(retry_count),
            last_error: error,
        }
    }

    /// Transition out of `BackoffWaiting { retry_count }` once the delay has
    /// elapsed: another attempt, or `Exhausted` when the budget is spent.
    pub fn after_backoff(&self, retry_count: u32, last_error: ProviderError) -> RetryState {
        let next = retry_count + 1;
        if next >= self.max_retries {
            return RetryState::Terminated(RetryOutcome::Exhausted {
                attempts: next,
                last_error,
            });
        }
        RetryState::Attempting { retry_count: next }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(1),
        }
    }
}

/// States of the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState {
    /// About to make call number `retry_count + 1`.
    Attempting { retry_count: u32 },
    /// Call `retry_count + 1` hit a transient failure; wait `delay`.
    BackoffWaiting {
        retry_count: u32,
        delay: Duration,
        last_error: ProviderError,
    },
    Terminated(RetryOutcome),
}

/// Terminal result of [`complete_with_retry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    Success { text: String, attempts: u32 },
    /// Every attempt hit a quota / rate-limit error.
    Exhausted { attempts: u32, last_error: ProviderError },
    /// A non-retryable error; no further attempts were made.
    Fatal { attempts: u32, error: ProviderError },
}

/// Drive the retry state machine until it terminates.
pub async fn complete_with_retry(
    client: &dyn CompletionClient,
    sleeper: &dyn Sleeper,
    prompt: &str,
    policy: &RetryPolicy,
) -> RetryOutcome {
    let mut state = RetryState::Attempting { retry_count: 0 };
    loop {
        state = match state {
            RetryState::Attempting { retry_count } => match client.complete(prompt).await {
                Ok(text) => RetryState::Terminated(RetryOutcome::Success {
                    text,
                    attempts: retry_count + 1,
                }),
                Err(e) => {
                    warn!(
                        "Attempt {}/{} failed — {}",
                        retry_count + 1,
                        policy.max_retries,
                        e
                    );
                    policy.on_failure(retry_count, e)
                }
            },
            RetryState::BackoffWaiting {
                retry_count,
                delay,
                last_error,
            } => {
                warn!(
                    "Rate limit hit. Retrying in {}ms (retry {}/{})",
                    delay.as_millis(),
                    retry_count + 1,
                    policy.max_retries
                );
                sleeper.sleep(delay).await;
                policy.after_backoff(retry_count, last_error)
            }
            RetryState::Terminated(outcome) => return outcome,
        };
    }
}

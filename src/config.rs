//! Configuration types for artifact generation.
//!
//! All generation behaviour is controlled through [`GenerationConfig`], built
//! via its [`GenerationConfigBuilder`]. Every knob the HTTP backend and CLI
//! expose maps onto exactly one field here.

use crate::error::QuizError;
use crate::prompts::Difficulty;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for topic / summary / keyword / quiz generation.
///
/// Built via [`GenerationConfig::builder()`] or using
/// [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_quiz::{Difficulty, GenerationConfig};
///
/// let config = GenerationConfig::builder()
///     .max_retries(3)
///     .default_difficulty(Difficulty::Hard)
///     .model("gemini-2.0-flash")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_retries, 3);
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Maximum number of characters of document text forwarded to the LLM.
    /// Default: 100 000.
    ///
    /// Longer documents are cut silently at this many characters.
    pub max_context_chars: usize,

    /// Question count used when a quiz request does not specify one. Default: 5.
    pub default_num_questions: u32,

    /// Difficulty used when a quiz request does not specify one. Default: Medium.
    pub default_difficulty: Difficulty,

    /// Sampling temperature for every completion. Default: 0.3.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per completion. Default: 8192.
    ///
    /// A 20-question quiz is roughly 3 000 output tokens.
    pub max_tokens: usize,

    /// Maximum quiz attempts while the provider reports quota / rate-limit
    /// errors. Default: 5.
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds. Default: 1000.
    ///
    /// Retry `n` (0-based) waits `initial_backoff_ms * 2^n`.
    pub initial_backoff_ms: u64,

    /// What the single-artifact entry points do when the LLM call fails.
    /// Default: [`FailurePolicy::Propagate`].
    pub failure_policy: FailurePolicy,

    /// LLM model identifier, e.g. "gpt-4.1-nano", "gemini-2.0-flash".
    /// If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "gemini", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_context_chars: 100_000,
            default_num_questions: 5,
            default_difficulty: Difficulty::Medium,
            temperature: 0.3,
            max_tokens: 8192,
            max_retries: 5,
            initial_backoff_ms: 1000,
            failure_policy: FailurePolicy::default(),
            model: None,
            provider_name: None,
            provider: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("max_context_chars", &self.max_context_chars)
            .field("default_num_questions", &self.default_num_questions)
            .field("default_difficulty", &self.default_difficulty)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("initial_backoff_ms", &self.initial_backoff_ms)
            .field("failure_policy", &self.failure_policy)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// Initial backoff as a [`Duration`].
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn max_context_chars(mut self, n: usize) -> Self {
        self.config.max_context_chars = n;
        self
    }

    pub fn default_num_questions(mut self, n: u32) -> Self {
        self.config.default_num_questions = n;
        self
    }

    pub fn default_difficulty(mut self, d: Difficulty) -> Self {
        self.config.default_difficulty = d;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn initial_backoff_ms(mut self, ms: u64) -> Self {
        self.config.initial_backoff_ms = ms;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, QuizError> {
        let c = &self.config;
        if c.max_context_chars == 0 {
            return Err(QuizError::InvalidConfig(
                "Context window must be ≥ 1 character".into(),
            ));
        }
        if c.default_num_questions == 0 {
            return Err(QuizError::InvalidConfig(
                "Default question count must be ≥ 1".into(),
            ));
        }
        if c.max_retries == 0 {
            return Err(QuizError::InvalidConfig(
                "Max retries must be ≥ 1 (it counts attempts)".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(QuizError::InvalidConfig("Max tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How `get_topics` / `get_keywords` / `get_summary` treat an LLM failure.
///
/// | Policy | Topics / keywords | Summary |
/// |--------|-------------------|---------|
/// | `Propagate` | `Err(QuizError::Provider)` | `Err(QuizError::Provider)` |
/// | `Degrade`   | `Ok(vec![])` | `Ok(None)` |
///
/// The quiz pipeline is not affected; it has its own retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Surface the failure to the caller. (default)
    #[default]
    Propagate,
    /// Log it and return the degenerate result instead.
    Degrade,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = GenerationConfig::default();
        assert_eq!(c.max_context_chars, 100_000);
        assert_eq!(c.default_num_questions, 5);
        assert_eq!(c.default_difficulty, Difficulty::Medium);
        assert_eq!(c.max_retries, 5);
        assert_eq!(c.initial_backoff(), Duration::from_secs(1));
        assert_eq!(c.failure_policy, FailurePolicy::Propagate);
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = GenerationConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn builder_rejects_zero_context() {
        let err = GenerationConfig::builder().max_context_chars(0).build().unwrap_err();
        assert!(matches!(err, QuizError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_zero_retries() {
        assert!(GenerationConfig::builder().max_retries(0).build().is_err());
    }

    #[test]
    fn builder_rejects_zero_questions() {
        assert!(GenerationConfig::builder()
            .default_num_questions(0)
            .build()
            .is_err());
    }

    #[test]
    fn debug_hides_provider() {
        let s = format!("{:?}", GenerationConfig::default());
        assert!(s.contains("max_context_chars"));
        assert!(s.contains("provider: None"));
    }
}

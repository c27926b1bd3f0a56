//! Artifact generation entry points.
//!
//! [`QuizGenerator`] sequences the pipeline for every artifact:
//!
//! ```text
//! bytes ─▶ extract ─▶ truncate ─▶ build_prompt ─▶ complete ─▶ parse
//! ```
//!
//! It is an explicitly constructed value: the text source, completion client
//! and sleeper are injected, so tests can count LLM calls and record backoff
//! delays without a network. Nothing is cached between calls; each `get_*`
//! handles one document end-to-end and keeps no state afterwards.

use crate::config::{FailurePolicy, GenerationConfig};
use crate::error::{ArtifactError, QuizError};
use crate::output::{DocumentInsights, QuizOutcome};
use crate::pipeline::extract::{extract_document_text, PdfiumTextSource, TextSource};
use crate::pipeline::llm::{
    complete_once, complete_with_retry, truncate_to_context, CompletionClient,
    ProviderCompletionClient, RetryOutcome, RetryPolicy, Sleeper, TokioSleeper,
};
use crate::pipeline::parse;
use crate::prompts::{build_prompt, QuizParams, TaskKind, TaskRequest};
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Reason reported when a quiz is requested for a document without text.
pub const NO_TEXT_REASON: &str = "No text extracted from the PDF or file not found.";

/// Derives topics, keywords, summaries and quizzes from documents.
///
/// Cheap to share: wrap it in an `Arc` and call it from concurrent requests.
pub struct QuizGenerator {
    text_source: Arc<dyn TextSource>,
    client: Arc<dyn CompletionClient>,
    sleeper: Arc<dyn Sleeper>,
    config: GenerationConfig,
}

impl QuizGenerator {
    /// Assemble a generator from explicit collaborators.
    pub fn new(
        text_source: Arc<dyn TextSource>,
        client: Arc<dyn CompletionClient>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            text_source,
            client,
            sleeper: Arc::new(TokioSleeper),
            config,
        }
    }

    /// Replace the backoff sleeper (tests use a recording fake).
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Build a production generator: pdfium text source plus the provider
    /// resolved from `config` (see [`resolve_provider`]).
    ///
    /// Missing credentials surface here as
    /// [`QuizError::ProviderNotConfigured`], not at process start-up.
    pub fn from_config(config: GenerationConfig) -> Result<Self, QuizError> {
        let provider = resolve_provider(&config)?;
        let client = Arc::new(ProviderCompletionClient::new(provider, &config));
        Ok(Self::new(Arc::new(PdfiumTextSource::new()), client, config))
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    // ── Boundary surface ─────────────────────────────────────────────────

    /// Topics covered by the document. Empty when the document has no text
    /// or the model's reply holds no parseable array.
    pub async fn get_topics(&self, document: &[u8]) -> Result<Vec<String>, QuizError> {
        let Some(text) = self.document_text(document).await else {
            info!("No PDF text extracted; returning no topics");
            return Ok(Vec::new());
        };
        let result = self.json_list(&text, TaskRequest::Topics).await;
        self.apply_policy(result, Vec::new())
    }

    /// Most important keywords / key phrases of the document.
    pub async fn get_keywords(&self, document: &[u8]) -> Result<Vec<String>, QuizError> {
        let Some(text) = self.document_text(document).await else {
            info!("No PDF text extracted; returning no keywords");
            return Ok(Vec::new());
        };
        let result = self.json_list(&text, TaskRequest::Keywords).await;
        self.apply_policy(result, Vec::new())
    }

    /// A 5–7 sentence summary, or `None` for a document without text.
    pub async fn get_summary(&self, document: &[u8]) -> Result<Option<String>, QuizError> {
        let Some(text) = self.document_text(document).await else {
            info!("No PDF text extracted; returning no summary");
            return Ok(None);
        };
        let result = self.summary(&text).await;
        self.apply_policy(result, None)
    }

    /// Generate a multiple-choice quiz.
    ///
    /// Quota / rate-limit failures are retried with exponential backoff; when
    /// the budget runs out the quiz is [`QuizOutcome::Unavailable`] with a
    /// descriptive reason. Any other provider failure is returned as `Err`
    /// immediately.
    pub async fn get_quiz(
        &self,
        document: &[u8],
        params: QuizParams,
    ) -> Result<QuizOutcome, QuizError> {
        let Some(text) = self.document_text(document).await else {
            info!("No PDF text extracted; quiz unavailable");
            return Ok(QuizOutcome::Unavailable {
                reason: NO_TEXT_REASON.to_string(),
            });
        };

        let start = Instant::now();
        let prompt = self.prompt_for(&text, &TaskRequest::Quiz(params));
        let policy = RetryPolicy::from_config(&self.config);

        match complete_with_retry(self.client.as_ref(), self.sleeper.as_ref(), &prompt, &policy)
            .await
        {
            RetryOutcome::Success { text, attempts } => {
                let questions = parse::parse_quiz(&text);
                info!(
                    "Quiz: {} questions parsed after {} attempt(s), {}ms",
                    questions.len(),
                    attempts,
                    start.elapsed().as_millis()
                );
                Ok(QuizOutcome::Questions { questions })
            }
            RetryOutcome::Exhausted { attempts, last_error } => {
                warn!("Quiz: giving up after {} attempts — {}", attempts, last_error);
                Ok(QuizOutcome::Unavailable {
                    reason: format!(
                        "Failed to generate MCQs after {} retries due to API limits.",
                        policy.max_retries
                    ),
                })
            }
            RetryOutcome::Fatal { error, .. } => Err(QuizError::Provider {
                task: TaskKind::Quiz,
                message: error.message,
            }),
        }
    }

    /// Quiz with the configured default difficulty and question count.
    pub async fn get_default_quiz(
        &self,
        document: &[u8],
        focus_topics: Vec<String>,
    ) -> Result<QuizOutcome, QuizError> {
        let params = QuizParams::new(
            self.config.default_difficulty,
            self.config.default_num_questions,
            focus_topics,
        )?;
        self.get_quiz(document, params).await
    }

    /// Topics, summary and keywords in one pass over the document.
    ///
    /// The text is extracted once; the three LLM calls then run one after the
    /// other. A failed call leaves its artifact empty and is recorded in
    /// [`DocumentInsights::failures`]; it never stops the remaining calls.
    pub async fn get_insights(&self, document: &[u8]) -> DocumentInsights {
        let Some(text) = self.document_text(document).await else {
            info!("No PDF text extracted; returning empty insights");
            return DocumentInsights::default();
        };

        let mut insights = DocumentInsights::default();

        match self.json_list(&text, TaskRequest::Topics).await {
            Ok(topics) => insights.topics = topics,
            Err(e) => insights.failures.push(e),
        }
        match self.summary(&text).await {
            Ok(summary) => insights.summary = summary,
            Err(e) => insights.failures.push(e),
        }
        match self.json_list(&text, TaskRequest::Keywords).await {
            Ok(keywords) => insights.keywords = keywords,
            Err(e) => insights.failures.push(e),
        }

        if !insights.is_complete() {
            warn!(
                "Insights: {}/3 artifacts failed",
                insights.failures.len()
            );
        }
        insights
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    async fn document_text(&self, document: &[u8]) -> Option<String> {
        extract_document_text(Arc::clone(&self.text_source), document.to_vec()).await
    }

    fn prompt_for(&self, text: &str, task: &TaskRequest) -> String {
        let trimmed = truncate_to_context(text, self.config.max_context_chars);
        build_prompt(trimmed, task)
    }

    async fn json_list(&self, text: &str, task: TaskRequest) -> Result<Vec<String>, ArtifactError> {
        let kind = task.kind();
        let raw = self.single_call(text, &task).await?;
        let items = parse::extract_json_array(&raw);
        if items.is_empty() {
            debug!("{}: no JSON array in completion", kind);
        }
        info!("{}: {} items", kind, items.len());
        Ok(items)
    }

    async fn summary(&self, text: &str) -> Result<Option<String>, ArtifactError> {
        let raw = self.single_call(text, &TaskRequest::Summary).await?;
        let trimmed = raw.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }

    async fn single_call(&self, text: &str, task: &TaskRequest) -> Result<String, ArtifactError> {
        let prompt = self.prompt_for(text, task);
        complete_once(self.client.as_ref(), &prompt)
            .await
            .map_err(|e| ArtifactError::Provider {
                task: task.kind(),
                message: e.message,
            })
    }

    fn apply_policy<T>(&self, result: Result<T, ArtifactError>, degenerate: T) -> Result<T, QuizError> {
        match (result, self.config.failure_policy) {
            (Ok(v), _) => Ok(v),
            (Err(e), FailurePolicy::Degrade) => {
                warn!("{}; degrading to empty result", e);
                Ok(degenerate)
            }
            (Err(e), FailurePolicy::Propagate) => Err(e.into()),
        }
    }
}

// ── Provider resolution ──────────────────────────────────────────────────────

/// Instantiate a named provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, QuizError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        QuizError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`); the factory reads
///    the matching API key (`OPENAI_API_KEY`, `GEMINI_API_KEY`, …).
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, QuizError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| QuizError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, GEMINI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

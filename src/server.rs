//! HTTP backend for the quiz web front end (feature `server`).
//!
//! A thin shim over [`QuizGenerator`]: each route reads one multipart upload,
//! calls exactly one boundary function and maps the outcome to JSON. The
//! route names and field names (`pdf_file`, `difficulty`, `numQuestions`,
//! `topics`) are the ones the web UI already sends.
//!
//! Uploads are held in memory and handed to pdfium as a byte slice, so
//! there is no temp file to clean up on any path.

use crate::error::QuizError;
use crate::generate::QuizGenerator;
use crate::output::{DocumentInsights, McqRecord};
use crate::prompts::{Difficulty, QuizParams};
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Largest accepted upload. Course PDFs with images routinely exceed axum's
/// 2 MB default.
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

const FILE_FIELD: &str = "pdf_file";

type AppState = Arc<QuizGenerator>;

/// Build the router with CORS open to any origin.
pub fn create_router(generator: Arc<QuizGenerator>) -> Router {
    create_router_with_body_limit(generator, MAX_UPLOAD_BYTES)
}

/// [`create_router`] with a custom upload limit in bytes. Larger bodies are
/// answered with 413.
pub fn create_router_with_body_limit(generator: Arc<QuizGenerator>, limit: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/extract_topics", post(extract_topics))
        .route("/extract_summary", post(extract_summary))
        .route("/extract_keywords", post(extract_keywords))
        .route("/extract_topics_and_summary", post(extract_topics_and_summary))
        .route("/generate_quiz", post(generate_quiz))
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(generator)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(generator: Arc<QuizGenerator>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Quiz backend listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_router(generator)).await
}

// ── Responses ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// A client-facing failure: status plus `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Keep axum's status for a failed multipart read: 413 when the body
    /// limit was hit, 400 for a malformed body.
    fn from_multipart(context: &str, e: MultipartError) -> Self {
        let status = e.status();
        warn!("{}: {} ({})", context, e.body_text(), status);
        Self {
            status,
            message: format!("{context}: {}", e.body_text()),
        }
    }

    /// Map a generator error; `action` prefixes the message ("generate MCQs").
    fn from_quiz(action: &str, e: QuizError) -> Self {
        let status = match e {
            QuizError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!("Failed to {}: {}", action, e);
        Self {
            status,
            message: format!("Failed to {action}: {e}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize)]
struct TopicsResponse {
    topics: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SummaryResponse {
    summary: Option<String>,
}

#[derive(Debug, Serialize)]
struct KeywordsResponse {
    keywords: Vec<String>,
}

#[derive(Debug, Serialize)]
struct QuizResponse {
    /// Raw question blocks, or a single failure description.
    mcqs: Vec<String>,
    /// The same blocks with their fields parsed.
    questions: Vec<McqRecord>,
}

// ── Upload parsing ───────────────────────────────────────────────────────────

/// The PDF plus any text fields sent alongside it.
#[derive(Debug, Default)]
struct Upload {
    pdf: Option<(String, Vec<u8>)>,
    difficulty: Option<String>,
    num_questions: Option<String>,
    topics: Option<String>,
}

impl Upload {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut upload = Upload::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::from_multipart("Failed to read multipart", e))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                FILE_FIELD => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::from_multipart("Failed to read file", e))?;
                    debug!(filename = %filename, bytes = bytes.len(), "PDF received");
                    upload.pdf = Some((filename, bytes.to_vec()));
                }
                "difficulty" | "numQuestions" | "topics" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| {
                            ApiError::from_multipart(&format!("Failed to read '{name}'"), e)
                        })?;
                    match name.as_str() {
                        "difficulty" => upload.difficulty = Some(value),
                        "numQuestions" => upload.num_questions = Some(value),
                        _ => upload.topics = Some(value),
                    }
                }
                other => debug!("Ignoring multipart field '{}'", other),
            }
        }
        Ok(upload)
    }

    /// The validated PDF bytes: present, named, and with a `.pdf` filename.
    fn pdf_bytes(&self) -> Result<&[u8], ApiError> {
        let Some((filename, bytes)) = &self.pdf else {
            warn!("Request without a PDF file");
            return Err(ApiError::bad_request("No PDF file provided"));
        };
        if filename.is_empty() {
            return Err(ApiError::bad_request("No selected file"));
        }
        if !filename.to_ascii_lowercase().ends_with(".pdf") {
            warn!("Rejected non-PDF upload '{}'", filename);
            return Err(ApiError::bad_request("Invalid file type. Please upload a PDF."));
        }
        Ok(bytes)
    }

    fn quiz_params(&self, generator: &QuizGenerator) -> Result<QuizParams, ApiError> {
        let config = generator.config();

        let difficulty = match self.difficulty.as_deref().map(str::trim) {
            None | Some("") => config.default_difficulty,
            Some(s) => s.parse::<Difficulty>().map_err(ApiError::bad_request)?,
        };

        let num_questions = match self.num_questions.as_deref().map(str::trim) {
            None | Some("") => config.default_num_questions,
            Some(s) => s.parse::<u32>().map_err(|_| {
                ApiError::bad_request(format!("numQuestions must be a positive integer, got '{s}'"))
            })?,
        };

        let focus_topics = match self.topics.as_deref().map(str::trim) {
            None | Some("") => Vec::new(),
            Some(s) => serde_json::from_str::<Vec<String>>(s).map_err(|e| {
                ApiError::bad_request(format!("topics must be a JSON array of strings: {e}"))
            })?,
        };

        QuizParams::new(difficulty, num_questions, focus_topics)
            .map_err(|e| ApiError::from_quiz("generate MCQs", e))
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn index() -> &'static str {
    "quiz backend is running!"
}

async fn extract_topics(
    State(generator): State<AppState>,
    multipart: Multipart,
) -> Result<Json<TopicsResponse>, ApiError> {
    let upload = Upload::read(multipart).await?;
    let topics = generator
        .get_topics(upload.pdf_bytes()?)
        .await
        .map_err(|e| ApiError::from_quiz("extract topics", e))?;
    Ok(Json(TopicsResponse { topics }))
}

async fn extract_summary(
    State(generator): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SummaryResponse>, ApiError> {
    let upload = Upload::read(multipart).await?;
    let summary = generator
        .get_summary(upload.pdf_bytes()?)
        .await
        .map_err(|e| ApiError::from_quiz("generate summary", e))?;
    Ok(Json(SummaryResponse { summary }))
}

async fn extract_keywords(
    State(generator): State<AppState>,
    multipart: Multipart,
) -> Result<Json<KeywordsResponse>, ApiError> {
    let upload = Upload::read(multipart).await?;
    let keywords = generator
        .get_keywords(upload.pdf_bytes()?)
        .await
        .map_err(|e| ApiError::from_quiz("extract keywords", e))?;
    Ok(Json(KeywordsResponse { keywords }))
}

async fn extract_topics_and_summary(
    State(generator): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DocumentInsights>, ApiError> {
    let upload = Upload::read(multipart).await?;
    let insights = generator.get_insights(upload.pdf_bytes()?).await;
    Ok(Json(insights))
}

async fn generate_quiz(
    State(generator): State<AppState>,
    multipart: Multipart,
) -> Result<Json<QuizResponse>, ApiError> {
    let upload = Upload::read(multipart).await?;
    let pdf = upload.pdf_bytes()?;
    let params = upload.quiz_params(&generator)?;
    let outcome = generator
        .get_quiz(pdf, params)
        .await
        .map_err(|e| ApiError::from_quiz("generate MCQs", e))?;
    Ok(Json(QuizResponse {
        mcqs: outcome.to_mcq_strings(),
        questions: outcome.questions().to_vec(),
    }))
}

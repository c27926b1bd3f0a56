//! Text extraction: PDF bytes → plain text via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! [`extract_document_text`] moves the work onto tokio's blocking pool so the
//! worker threads never stall on a large document.
//!
//! ## Failure model
//!
//! Extraction never errors. A document pdfium cannot open (not a PDF,
//! truncated upload, wrong password) yields `None`; a page without a text
//! layer (a scanned image) contributes nothing. The orchestrator treats
//! "no text" as an expected outcome, not a crash.

use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Converts an uploaded document into plain text.
pub trait TextSource: Send + Sync {
    /// Best-effort text of `bytes`, or `None` if the document is unreadable.
    fn extract_text(&self, bytes: &[u8]) -> Option<String>;
}

/// [`TextSource`] backed by pdfium.
///
/// The pdfium library is located through `pdfium-auto`: an explicit
/// `library_path`, else `PDFIUM_LIB_PATH`, else a cached download.
#[derive(Debug, Clone, Default)]
pub struct PdfiumTextSource {
    library_path: Option<PathBuf>,
}

impl PdfiumTextSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to the pdfium shared library at `path` instead of auto-resolving.
    pub fn with_library_path(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    fn bind(&self) -> Option<Pdfium> {
        let bound = match &self.library_path {
            Some(path) => pdfium_auto::bind_pdfium_from_path(path),
            None => pdfium_auto::bind_pdfium_silent(),
        };
        bound
            .map_err(|e| warn!("Could not bind pdfium: {}", e))
            .ok()
    }
}

impl TextSource for PdfiumTextSource {
    fn extract_text(&self, bytes: &[u8]) -> Option<String> {
        let pdfium = self.bind()?;

        let document = match pdfium.load_pdf_from_byte_slice(bytes, None) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Error reading PDF: {:?}", e);
                return None;
            }
        };

        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let mut text = String::new();
        for (idx, page) in pages.iter().enumerate() {
            match page.text() {
                Ok(page_text) => {
                    let content = page_text.all();
                    if content.is_empty() {
                        debug!("Page {} has no extractable text", idx + 1);
                        continue;
                    }
                    text.push_str(&content);
                    text.push('\n');
                }
                Err(e) => debug!("Page {}: text layer unavailable: {:?}", idx + 1, e),
            }
        }

        debug!("Extracted {} chars", text.chars().count());
        Some(text)
    }
}

/// Run `source` on the blocking pool and normalise "no text".
///
/// Returns `None` when the source fails, panics, or produces only whitespace.
pub async fn extract_document_text(source: Arc<dyn TextSource>, bytes: Vec<u8>) -> Option<String> {
    let result = tokio::task::spawn_blocking(move || source.extract_text(&bytes)).await;

    let text = match result {
        Ok(text) => text,
        Err(e) => {
            warn!("Text extraction task panicked: {}", e);
            None
        }
    };

    text.filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<&'static str>);

    impl TextSource for Fixed {
        fn extract_text(&self, _bytes: &[u8]) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    struct Panics;

    impl TextSource for Panics {
        fn extract_text(&self, _bytes: &[u8]) -> Option<String> {
            panic!("corrupt xref");
        }
    }

    #[tokio::test]
    async fn passes_text_through() {
        let text = extract_document_text(Arc::new(Fixed(Some("page one\n"))), vec![]).await;
        assert_eq!(text.as_deref(), Some("page one\n"));
    }

    #[tokio::test]
    async fn whitespace_only_is_no_text() {
        let text = extract_document_text(Arc::new(Fixed(Some(" \n\n "))), vec![]).await;
        assert!(text.is_none());
    }

    #[tokio::test]
    async fn none_stays_none() {
        assert!(extract_document_text(Arc::new(Fixed(None)), vec![]).await.is_none());
    }

    #[tokio::test]
    async fn panicking_source_degrades_to_none() {
        assert!(extract_document_text(Arc::new(Panics), vec![1, 2, 3]).await.is_none());
    }
}

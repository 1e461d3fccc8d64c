//! Resume text extraction.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Uploaded resume is not a PDF document")]
    NotPdf,

    #[error("Failed to parse resume PDF: {0}")]
    Malformed(String),

    #[error("Resume PDF contains no extractable text")]
    NoText,
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Extracts plain text from PDF resumes with `pdf-extract`.
///
/// Parsing is CPU-bound and runs on the blocking pool. A panic inside the
/// parser is reported as a malformed document.
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        if !bytes.starts_with(PDF_MAGIC) {
            return Err(ExtractionError::NotPdf);
        }

        let owned = bytes.to_vec();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&owned))
            .await
            .map_err(|e| {
                if e.is_panic() {
                    ExtractionError::Malformed("PDF parser panicked".to_string())
                } else {
                    ExtractionError::Malformed(e.to_string())
                }
            })?
            .map_err(|e| ExtractionError::Malformed(e.to_string()))?;

        if text.trim().is_empty() {
            return Err(ExtractionError::NoText);
        }

        debug!("Extracted {} characters of resume text", text.len());
        Ok(text)
    }
}

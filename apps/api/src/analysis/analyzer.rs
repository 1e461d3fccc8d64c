//! Resume Analysis: orchestrates one analysis request.
//!
//! Flow: store upload → load bytes → extract text → build prompt →
//!       model call → strip fences → parse + validate → release upload.
//!
//! The stored upload is released after the pipeline finishes, on success and
//! on every failure path. If the pipeline unwinds or is cancelled first, the
//! guard hands the release to a background task instead.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::analysis::models::AnalysisResult;
use crate::analysis::prompts::build_analysis_prompt;
use crate::analysis::validation::parse_analysis;
use crate::errors::AppError;
use crate::extract::TextExtractor;
use crate::llm_client::CompletionClient;
use crate::storage::{StoredUpload, UploadStorage};

/// Analysis policy, resolved from config at startup.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerSettings {
    /// Reject replies whose score falls outside 0 – 100.
    pub enforce_score_range: bool,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            enforce_score_range: true,
        }
    }
}

pub struct ResumeAnalyzer {
    settings: AnalyzerSettings,
    storage: Arc<dyn UploadStorage>,
    extractor: Arc<dyn TextExtractor>,
    llm: Arc<dyn CompletionClient>,
}

impl ResumeAnalyzer {
    pub fn new(
        settings: AnalyzerSettings,
        storage: Arc<dyn UploadStorage>,
        extractor: Arc<dyn TextExtractor>,
        llm: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            settings,
            storage,
            extractor,
            llm,
        }
    }

    /// Analyzes one resume against one job description.
    pub async fn analyze(
        &self,
        resume: &[u8],
        job_description: &str,
    ) -> Result<AnalysisResult, AppError> {
        let upload = self.storage.store(resume).await?;
        let mut guard = UploadGuard::new(self.storage.clone(), upload);

        let outcome = self.run(guard.upload(), job_description).await;

        guard.release().await;
        outcome
    }

    async fn run(
        &self,
        upload: &StoredUpload,
        job_description: &str,
    ) -> Result<AnalysisResult, AppError> {
        let bytes = self.storage.load(upload).await?;
        let resume_text = self.extractor.extract(&bytes).await?;

        let prompt = build_analysis_prompt(&resume_text, job_description);
        let completion = self.llm.complete(&prompt).await?;
        let text = completion.first_text()?;
        debug!("Raw analysis reply: {text}");

        let result = parse_analysis(text, &self.settings)?;
        info!(
            "Analysis complete: score={}, strengths={}, weaknesses={}, projects={}",
            result.score,
            result.strengths.len(),
            result.weaknesses.len(),
            result.projects.len()
        );
        Ok(result)
    }
}

/// Owns a stored upload until it is released.
///
/// `release` deletes it in place. Dropping an unreleased guard schedules the
/// delete on the runtime.
struct UploadGuard {
    storage: Arc<dyn UploadStorage>,
    upload: Option<StoredUpload>,
}

impl UploadGuard {
    fn new(storage: Arc<dyn UploadStorage>, upload: StoredUpload) -> Self {
        Self {
            storage,
            upload: Some(upload),
        }
    }

    fn upload(&self) -> &StoredUpload {
        self.upload
            .as_ref()
            .expect("upload is present until the guard is released")
    }

    async fn release(&mut self) {
        if let Some(upload) = self.upload.take() {
            if let Err(e) = self.storage.delete(upload).await {
                warn!("Failed to clean up upload: {e}");
            }
        }
    }
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        let Some(upload) = self.upload.take() else {
            return;
        };
        let storage = self.storage.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = storage.delete(upload).await {
                        warn!("Failed to clean up abandoned upload: {e}");
                    }
                });
            }
            Err(_) => warn!(
                "No runtime to clean up abandoned upload {}",
                upload.path().display()
            ),
        }
    }
}

use std::sync::Arc;

use crate::analysis::ResumeAnalyzer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<ResumeAnalyzer>,
    /// Request body limit for uploads, in bytes.
    pub max_upload_bytes: usize,
}

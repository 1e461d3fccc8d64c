//! Axum route handler for the Analysis API.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use tracing::info;

use crate::analysis::models::AnalysisResult;
use crate::errors::AppError;
use crate::state::AppState;

const RESUME_FIELD: &str = "resume";
const JOB_DESCRIPTION_FIELD: &str = "jobDescription";
const MISSING_INPUT: &str = "Missing resume or job description.";

/// The two inputs of an analysis request, read fully into memory.
#[derive(Debug, Default)]
struct AnalysisForm {
    resume: Option<Bytes>,
    job_description: Option<String>,
}

/// POST /analyze
///
/// Multipart form with a `resume` file part and a `jobDescription` text field.
/// Returns the validated analysis, or `{ "error": ... }`.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let form = read_form(&mut multipart).await?;

    let (Some(resume), Some(job_description)) = (form.resume, form.job_description) else {
        return Err(AppError::InvalidRequest(MISSING_INPUT.to_string()));
    };

    info!(
        "Analyzing resume ({} bytes) against job description ({} chars)",
        resume.len(),
        job_description.len()
    );

    // Runs detached so the upload is still released if the client disconnects.
    let analyzer = state.analyzer.clone();
    let result = tokio::spawn(async move { analyzer.analyze(&resume, &job_description).await })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Analysis task failed: {e}")))??;

    Ok(Json(result))
}

async fn read_form(multipart: &mut Multipart) -> Result<AnalysisForm, AppError> {
    let mut form = AnalysisForm::default();

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(RESUME_FIELD) if form.resume.is_none() => {
                // A plain text value under `resume` is not a file upload.
                if field.file_name().is_none() {
                    continue;
                }
                let data = field.bytes().await.map_err(form_error)?;
                if !data.is_empty() {
                    form.resume = Some(data);
                }
            }
            Some(JOB_DESCRIPTION_FIELD) if form.job_description.is_none() => {
                let text = field.text().await.map_err(form_error)?;
                if !text.trim().is_empty() {
                    form.job_description = Some(text);
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

fn form_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::InvalidRequest(e.body_text())
    }
}

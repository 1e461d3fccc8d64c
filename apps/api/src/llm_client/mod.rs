/// LLM Client: the single point of entry for all Gemini API calls.
///
/// No other module may call the provider directly. The analyzer depends on
/// the `CompletionClient` trait so tests can inject a canned client.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;

use prompts::JSON_ONLY_SYSTEM;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode Gemini response: {0}")]
    Decode(String),

    #[error("No candidates returned from Gemini API.{}", block_suffix(.block_reason))]
    NoCandidates { block_reason: Option<String> },

    #[error("Gemini response does not contain valid text.")]
    MissingText,
}

fn block_suffix(block_reason: &Option<String>) -> String {
    block_reason
        .as_ref()
        .map(|r| format!(" Prompt blocked: {r}"))
        .unwrap_or_default()
}

impl LlmError {
    /// Sub-kind label so model failures can be told apart in the logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::Http(e) if e.is_timeout() => "timeout",
            LlmError::Http(_) => "http",
            LlmError::Api { .. } => "api_status",
            LlmError::Decode(_) => "decode",
            LlmError::NoCandidates { .. } => "no_candidates",
            LlmError::MissingText => "missing_text",
        }
    }
}

/// Connection settings for the Gemini API, resolved once at startup.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    system_instruction: RequestContent<'a>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
}

/// A `generateContent` reply.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
pub struct Part {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl Completion {
    /// Text of the first part of the first candidate.
    pub fn first_text(&self) -> Result<&str, LlmError> {
        let candidate = self.candidates.first().ok_or_else(|| LlmError::NoCandidates {
            block_reason: self
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.clone()),
        })?;

        candidate
            .content
            .as_ref()
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
            .filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::MissingText)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Sends one prompt, returns one completion.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError>;
}

/// Gemini `generateContent` client. Makes exactly one call per prompt.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.timeout)
                .build()
                .expect("Failed to build HTTP client"),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: Some("user"),
                parts: vec![RequestPart { text: prompt }],
            }],
            system_instruction: RequestContent {
                role: None,
                parts: vec![RequestPart {
                    text: JSON_ONLY_SYSTEM,
                }],
            },
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Gemini response: {body}");

        let completion: Completion =
            serde_json::from_str(&body).map_err(|e| LlmError::Decode(e.to_string()))?;

        if let Some(usage) = &completion.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={}, candidate_tokens={}, finish_reason={:?}",
                usage.prompt_token_count,
                usage.candidates_token_count,
                completion
                    .candidates
                    .first()
                    .and_then(|c| c.finish_reason.as_deref())
            );
        }

        Ok(completion)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text.strip_suffix("```").map(str::trim).unwrap_or(text);
    };
    let rest = match rest.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
        _ => rest,
    };
    let rest = rest.trim_start();
    rest.strip_suffix("```").map(str::trim).unwrap_or(rest)
}

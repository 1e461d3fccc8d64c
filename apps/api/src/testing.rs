//! Canned collaborators for handler and analyzer tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::extract::{ExtractionError, TextExtractor};
use crate::llm_client::{Completion, CompletionClient, LlmError};

pub const SAMPLE_REPLY: &str = r#"{
  "score": 78,
  "strengths": ["Four years of production Rust", "Owned an on-call rotation"],
  "weaknesses": ["No Kubernetes experience"],
  "projects": [
    {"strength": "Payment service handling 2k rps", "weakness": "No mention of testing"}
  ]
}"#;

enum Reply {
    Body(Value),
    Unavailable,
}

/// Model client that returns one fixed reply and records every prompt.
pub struct FakeModel {
    reply: Reply,
    prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    /// Replies with a single candidate whose first part is `text`.
    pub fn text(text: &str) -> Self {
        Self::reply(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        }))
    }

    /// Replies with an arbitrary `generateContent` body.
    pub fn reply(body: Value) -> Self {
        Self {
            reply: Reply::Body(body),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call like an overloaded provider.
    pub fn unavailable() -> Self {
        Self {
            reply: Reply::Unavailable,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for FakeModel {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Reply::Body(body) => Ok(serde_json::from_value(body.clone()).unwrap()),
            Reply::Unavailable => Err(LlmError::Api {
                status: 503,
                message: "The model is overloaded. Please try again later.".to_string(),
            }),
        }
    }
}

/// Extractor that skips PDF parsing and returns fixed text.
pub struct FakeExtractor {
    text: Option<String>,
    seen: Mutex<Vec<Vec<u8>>>,
}

impl FakeExtractor {
    pub fn ok(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            text: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<Vec<u8>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextExtractor for FakeExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        self.seen.lock().unwrap().push(bytes.to_vec());
        self.text
            .clone()
            .ok_or_else(|| ExtractionError::Malformed("invalid xref table".to_string()))
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Suitability assessment returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// 0 – 100 unless range enforcement is disabled.
    pub score: Number,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub projects: Vec<ProjectFeedback>,
}

/// Feedback on a single project listed in the resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFeedback {
    pub strength: String,
    pub weakness: String,
}

// Resume analysis: prompt a model with resume text + job description and
// return a validated suitability assessment.
// All model calls go through llm_client.

pub mod analyzer;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod validation;

pub use analyzer::{AnalyzerSettings, ResumeAnalyzer};

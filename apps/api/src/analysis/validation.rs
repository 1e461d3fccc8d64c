//! Structural validation of model output.
//!
//! The model is told which shape to return but nothing forces it to comply,
//! so every reply is checked before it reaches the caller.

use serde_json::{Map, Number, Value};

use crate::analysis::analyzer::AnalyzerSettings;
use crate::analysis::models::{AnalysisResult, ProjectFeedback};
use crate::errors::AppError;
use crate::llm_client::strip_json_fences;

/// Strips code fences, parses JSON and validates the result shape.
pub fn parse_analysis(raw: &str, settings: &AnalyzerSettings) -> Result<AnalysisResult, AppError> {
    let cleaned = strip_json_fences(raw);
    let value: Value = serde_json::from_str(cleaned).map_err(|e| {
        AppError::MalformedModelOutput(format!("Model reply is not valid JSON: {e}"))
    })?;
    validate_analysis(value, settings).map_err(AppError::MalformedModelOutput)
}

/// Checks a parsed reply against the analysis shape.
///
/// `score` may arrive as a number or a numeric string; it is always returned
/// as a number. Fields outside the shape are dropped.
pub fn validate_analysis(value: Value, settings: &AnalyzerSettings) -> Result<AnalysisResult, String> {
    let mut obj = match value {
        Value::Object(obj) => obj,
        other => {
            return Err(format!(
                "Model reply must be a JSON object, got {}",
                type_name(&other)
            ))
        }
    };

    let score = parse_score(take(&mut obj, "score")?)?;
    if settings.enforce_score_range {
        let n = score.as_f64().unwrap_or(f64::NAN);
        if !(0.0..=100.0).contains(&n) {
            return Err(format!("'score' must be between 0 and 100, got {score}"));
        }
    }

    let strengths = string_list("strengths", take(&mut obj, "strengths")?)?;
    let weaknesses = string_list("weaknesses", take(&mut obj, "weaknesses")?)?;
    let projects = project_list(take(&mut obj, "projects")?)?;

    Ok(AnalysisResult {
        score,
        strengths,
        weaknesses,
        projects,
    })
}

fn take(obj: &mut Map<String, Value>, field: &str) -> Result<Value, String> {
    obj.remove(field)
        .ok_or_else(|| format!("Model reply is missing '{field}'"))
}

fn parse_score(value: Value) -> Result<Number, String> {
    match value {
        Value::Number(n) => Ok(n),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Ok(Number::from(i));
            }
            s.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .ok_or_else(|| format!("'score' must be numeric, got \"{s}\""))
        }
        other => Err(format!("'score' must be a number, got {}", type_name(&other))),
    }
}

fn string_list(field: &str, value: Value) -> Result<Vec<String>, String> {
    let items = match value {
        Value::Array(items) => items,
        other => return Err(format!("'{field}' must be an array, got {}", type_name(&other))),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(s) => Ok(s),
            other => Err(format!(
                "'{field}[{i}]' must be a string, got {}",
                type_name(&other)
            )),
        })
        .collect()
}

fn project_list(value: Value) -> Result<Vec<ProjectFeedback>, String> {
    let items = match value {
        Value::Array(items) => items,
        other => return Err(format!("'projects' must be an array, got {}", type_name(&other))),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let mut obj = match item {
                Value::Object(obj) => obj,
                other => {
                    return Err(format!(
                        "'projects[{i}]' must be an object, got {}",
                        type_name(&other)
                    ))
                }
            };
            let mut text_field = |name: &str| match obj.remove(name) {
                Some(Value::String(s)) => Ok(s),
                Some(other) => Err(format!(
                    "'projects[{i}].{name}' must be a string, got {}",
                    type_name(&other)
                )),
                None => Err(format!("'projects[{i}]' is missing '{name}'")),
            };
            Ok(ProjectFeedback {
                strength: text_field("strength")?,
                weakness: text_field("weakness")?,
            })
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

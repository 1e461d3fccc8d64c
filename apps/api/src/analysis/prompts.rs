// Resume analysis prompt template.

pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the given resume against the job description and return a JSON object with these fields:

{
  "score": <number from 0 to 100>,
  "strengths": ["List of strengths"],
  "weaknesses": ["List of weaknesses"],
  "projects": [
    {
      "strength": "Strength of project",
      "weakness": "Weakness of project"
    }
  ]
}

Ensure the output is valid JSON format without any extra text.

Resume:
{resume_text}

Job Description:
{job_description}
"#;

/// Fills the analysis template.
///
/// The job description is substituted last so placeholder-looking text inside
/// the resume is never expanded.
pub fn build_analysis_prompt(resume_text: &str, job_description: &str) -> String {
    let (head, tail) = ANALYSIS_PROMPT_TEMPLATE
        .split_once("{resume_text}")
        .unwrap_or((ANALYSIS_PROMPT_TEMPLATE, ""));
    format!(
        "{head}{resume_text}{}",
        tail.replace("{job_description}", job_description)
    )
}

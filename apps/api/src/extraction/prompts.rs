/// User-turn instruction sent next to the attached PDF.
pub const RESUME_PARSE_PROMPT: &str =
    "Parse the resume and use only ASCII characters in response";

/// System instruction describing the canonical schema.
///
/// Sections are native JSON arrays and `other` is an object. The extractor still
/// accepts string-encoded sections because models do not always follow this.
pub const RESUME_PARSE_SYSTEM: &str = r#"You are a resume parser. Extract resume data from PDF and return a single JSON OBJECT. Use this schema:
{
  "first_name": "", "last_name": "", "email": "", "phone": "", "location": "",
  "social": {"linkedin": "", "github": ""},
  "skills": "",
  "work": [{"company":"","title":"","startDate":"","endDate":"","description":""}],
  "education": [{"degree":"","institution":"","startDate":"","endDate":"","percentage/gpa":""}],
  "projects": [{"name":"","description":""}],
  "certifications": [{"name":"","description":""}],
  "achievements": [{"name":"","description":""}],
  "other": {"Hobbies":"","Languages":""},
  "summary": ""
}

If data is missing, use empty strings or empty arrays."#;

/// Full system instruction: schema plus the shared output-format rules.
pub fn resume_parse_system() -> String {
    format!(
        "{RESUME_PARSE_SYSTEM}\n\n{}\n{}",
        crate::llm_client::prompts::ASCII_ONLY_INSTRUCTION,
        crate::llm_client::prompts::JSON_ONLY_INSTRUCTION
    )
}

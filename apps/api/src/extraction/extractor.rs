//! Resume Extractor: PDF bytes in, normalized `ResumeRecord` out.
//!
//! The model call sits behind the `ResumeModel` trait so the pipeline can be
//! exercised without the network. `AppState` carries the extractor, which holds
//! an `Arc<dyn ResumeModel>` chosen at startup.
//!
//! Failure policy: `extract` never returns an error. Anything that goes wrong
//! (transport, API status, empty reply, unparseable or non-object JSON) is logged
//! and turned into `ResumeRecord::failed`, so the renderer always gets a
//! well-shaped record.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::extraction::accessor::{mapping_field, scalar_field, sequence_field};
use crate::extraction::prompts::{resume_parse_system, RESUME_PARSE_PROMPT};
use crate::extraction::sanitize::{clean_text, clean_value};
use crate::extraction::tolerant::{parse_tolerant, ParseError};
use crate::llm_client::{Attachment, LlmClient, LlmError};
use crate::models::resume::{EducationEntry, FieldMap, NamedEntry, ResumeRecord, WorkEntry};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{0}")]
    Llm(#[from] LlmError),

    #[error("model reply is not valid JSON: {0}")]
    Parse(#[from] ParseError),

    #[error("model reply is a JSON {0}, expected an object")]
    NotAnObject(&'static str),
}

/// Anything that can turn a resume PDF into the model's raw JSON reply text.
#[async_trait]
pub trait ResumeModel: Send + Sync {
    async fn extract_raw(&self, pdf_bytes: &[u8]) -> Result<String, LlmError>;
}

#[async_trait]
impl ResumeModel for LlmClient {
    async fn extract_raw(&self, pdf_bytes: &[u8]) -> Result<String, LlmError> {
        let system = resume_parse_system();
        self.call_text(
            RESUME_PARSE_PROMPT,
            &system,
            Attachment {
                mime_type: "application/pdf",
                bytes: pdf_bytes,
            },
        )
        .await
    }
}

#[derive(Clone)]
pub struct ResumeExtractor {
    model: Arc<dyn ResumeModel>,
}

impl ResumeExtractor {
    pub fn new(model: Arc<dyn ResumeModel>) -> Self {
        Self { model }
    }

    /// Extracts a normalized record. Never fails; see the module docs.
    pub async fn extract(&self, pdf_bytes: &[u8]) -> ResumeRecord {
        match self.try_extract(pdf_bytes).await {
            Ok(record) => record,
            Err(e) => {
                error!("Error parsing resume: {e:?}");
                ResumeRecord::failed(format!("Parsing failed: {e}"))
            }
        }
    }

    async fn try_extract(&self, pdf_bytes: &[u8]) -> Result<ResumeRecord, ExtractionError> {
        info!("Parsing resume ({} bytes)", pdf_bytes.len());
        let raw = self.model.extract_raw(pdf_bytes).await?;
        let parsed = parse_tolerant(&raw)?;
        normalize_record(&parsed)
    }
}

/// Coerces a parsed model reply into a `ResumeRecord`.
///
/// Only the top-level shape can fail; every field falls back to empty.
pub fn normalize_record(value: &Value) -> Result<ResumeRecord, ExtractionError> {
    if !value.is_object() {
        return Err(ExtractionError::NotAnObject(json_kind(value)));
    }

    Ok(ResumeRecord {
        first_name: scalar_field(value, "first_name", ""),
        last_name: scalar_field(value, "last_name", ""),
        email: scalar_field(value, "email", ""),
        phone: scalar_field(value, "phone", ""),
        location: scalar_field(value, "location", ""),
        social: to_field_map(mapping_field(value, "social")),
        skills: scalar_field(value, "skills", ""),
        work: entries(value, "work", work_entry),
        education: entries(value, "education", education_entry),
        projects: entries(value, "projects", named_entry),
        certifications: entries(value, "certifications", named_entry),
        achievements: entries(value, "achievements", named_entry),
        other: to_field_map(mapping_field(value, "other")),
        summary: scalar_field(value, "summary", ""),
        parsing_error: None,
    })
}

/// Maps each item of the sequence at `key`, dropping items the mapper rejects.
fn entries<T>(value: &Value, key: &str, mapper: fn(&Value) -> Option<T>) -> Vec<T> {
    let items = sequence_field(value, key, Vec::new());
    let total = items.len();
    let mapped: Vec<T> = items.iter().filter_map(mapper).collect();
    if mapped.len() < total {
        warn!(
            "Dropped {} malformed '{key}' item(s) from model reply",
            total - mapped.len()
        );
    }
    mapped
}

fn work_entry(item: &Value) -> Option<WorkEntry> {
    item.is_object().then(|| WorkEntry {
        company: scalar_field(item, "company", ""),
        title: scalar_field(item, "title", ""),
        start_date: scalar_field(item, "startDate", ""),
        end_date: scalar_field(item, "endDate", ""),
        description: scalar_field(item, "description", ""),
    })
}

fn education_entry(item: &Value) -> Option<EducationEntry> {
    item.is_object().then(|| EducationEntry {
        degree: scalar_field(item, "degree", ""),
        institution: scalar_field(item, "institution", ""),
        start_date: scalar_field(item, "startDate", ""),
        end_date: scalar_field(item, "endDate", ""),
        gpa: scalar_field(item, "percentage/gpa", ""),
    })
}

/// Objects map field-by-field; a bare scalar becomes the entry's name.
fn named_entry(item: &Value) -> Option<NamedEntry> {
    match item {
        Value::Object(_) => Some(NamedEntry {
            name: scalar_field(item, "name", ""),
            description: scalar_field(item, "description", ""),
        }),
        Value::String(_) | Value::Number(_) => {
            let name = clean_value(item);
            (!name.is_empty()).then(|| NamedEntry {
                name,
                description: String::new(),
            })
        }
        _ => None,
    }
}

fn to_field_map(map: Map<String, Value>) -> FieldMap {
    let mut fields = FieldMap::new();
    for (label, value) in &map {
        let label = clean_text(label);
        if label.is_empty() {
            continue;
        }
        fields.insert(label, clean_value(value));
    }
    fields
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubModel {
        reply: Result<String, u16>,
        calls: AtomicUsize,
    }

    impl StubModel {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(status),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ResumeModel for StubModel {
        async fn extract_raw(&self, _pdf_bytes: &[u8]) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::Api {
                    status: *status,
                    message: "upstream unavailable".to_string(),
                }),
            }
        }
    }

    fn assert_empty_failed(record: &ResumeRecord) {
        let error = record.parsing_error.as_deref().unwrap_or_default();
        assert!(error.starts_with("Parsing failed: "), "got {error:?}");
        assert_eq!(
            ResumeRecord {
                parsing_error: None,
                ..record.clone()
            },
            ResumeRecord::default()
        );
    }

    #[tokio::test]
    async fn test_extract_valid_reply_sanitizes_every_leaf() {
        let reply = json!({
            "first_name": "  Ada ★ ",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "phone": 5551234,
            "location": "London\n UK",
            "social": {"linkedin": "linkedin.com/in/ada ✓", "github": ""},
            "skills": ["Math", "Engines"],
            "work": [{"company": "Analytical Engine Co", "title": "Programmer 🚀",
                      "startDate": "1842", "endDate": "1843", "description": "Wrote   notes"}],
            "education": [{"degree": "Private tutoring", "institution": "", "percentage/gpa": 4.0}],
            "projects": [{"name": "Note G", "description": "First algorithm"}],
            "certifications": [],
            "achievements": ["Countess of Lovelace"],
            "other": {"Languages": ["English", "French"], "Hobbies": null},
            "summary": "Mathematician — writer"
        })
        .to_string();
        let model = StubModel::replying(&reply);
        let record = ResumeExtractor::new(model.clone()).extract(b"%PDF-1.4").await;

        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert!(record.parsing_error.is_none());
        assert_eq!(record.first_name, "Ada");
        assert_eq!(record.phone, "5551234");
        assert_eq!(record.location, "London UK");
        assert_eq!(record.social.get("linkedin"), Some("linkedin.com/in/ada"));
        assert_eq!(record.social.get("github"), Some(""));
        assert_eq!(record.skills, "Math, Engines");
        assert_eq!(record.work[0].title, "Programmer");
        assert_eq!(record.work[0].description, "Wrote notes");
        assert_eq!(record.education[0].gpa, "4.0");
        assert_eq!(record.achievements[0].name, "Countess of Lovelace");
        assert_eq!(record.other.get("Languages"), Some("English, French"));
        assert_eq!(record.other.get("Hobbies"), Some(""));
        assert_eq!(record.summary, "Mathematician writer");
    }

    #[tokio::test]
    async fn test_extract_string_encoded_sections_are_reparsed() {
        let reply = json!({
            "work": "[{\"company\": \"Acme\", \"title\": \"Engineer\",}]",
            "education": "[{\"degree\": \"BSc\"}]",
            "projects": "[{\"name\":\"x\"}]",
            "certifications": "not json",
            "achievements": "{\"name\": \"not a list\"}",
            "other": "{\"Hobbies\": \"Chess\"}",
            "social": "{\"github\": \"github.com/ada\"}"
        })
        .to_string();
        let record = ResumeExtractor::new(StubModel::replying(&reply))
            .extract(b"%PDF")
            .await;

        assert_eq!(record.work.len(), 1);
        assert_eq!(record.work[0].company, "Acme");
        assert_eq!(record.education[0].degree, "BSc");
        assert_eq!(record.projects[0].name, "x");
        assert!(record.certifications.is_empty());
        assert!(record.achievements.is_empty());
        assert_eq!(record.other.get("Hobbies"), Some("Chess"));
        assert_eq!(record.social.get("github"), Some("github.com/ada"));
    }

    #[tokio::test]
    async fn test_extract_repairs_malformed_reply() {
        let reply = "```json\n{\"first_name\": \"Ada\", \"work\": [{\"company\": \"Acme\",},],";
        let record = ResumeExtractor::new(StubModel::replying(reply))
            .extract(b"%PDF")
            .await;
        assert!(record.parsing_error.is_none());
        assert_eq!(record.first_name, "Ada");
        assert_eq!(record.work[0].company, "Acme");
    }

    #[tokio::test]
    async fn test_extract_upstream_error_returns_failed_record() {
        let record = ResumeExtractor::new(StubModel::failing(503))
            .extract(b"%PDF")
            .await;
        assert_empty_failed(&record);
        assert!(record
            .parsing_error
            .unwrap()
            .contains("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_extract_unparseable_reply_returns_failed_record() {
        let record = ResumeExtractor::new(StubModel::replying("I cannot read this file."))
            .extract(b"%PDF")
            .await;
        assert_empty_failed(&record);
    }

    #[tokio::test]
    async fn test_extract_non_object_reply_returns_failed_record() {
        let record = ResumeExtractor::new(StubModel::replying("[1, 2, 3]"))
            .extract(b"%PDF")
            .await;
        assert_empty_failed(&record);
        assert!(record.parsing_error.unwrap().contains("array"));
    }

    #[test]
    fn test_normalize_non_object_items_in_sections() {
        let value = json!({
            "work": ["Acme", {"company": "Globex"}],
            "education": [null],
            "projects": ["Compiler", 7, null, {"name": "Kernel"}]
        });
        let record = normalize_record(&value).unwrap();
        assert_eq!(record.work.len(), 1);
        assert_eq!(record.work[0].company, "Globex");
        assert!(record.education.is_empty());
        let names: Vec<_> = record.projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Compiler", "7", "Kernel"]);
    }

    #[test]
    fn test_normalize_missing_fields_are_empty_not_null() {
        let record = normalize_record(&json!({})).unwrap();
        assert_eq!(record, ResumeRecord::default());
        let value = serde_json::to_value(&record).unwrap();
        for (key, field) in value.as_object().unwrap() {
            assert!(!field.is_null(), "{key} serialized as null");
        }
    }

    #[test]
    fn test_normalize_keeps_model_key_order_in_mappings() {
        let raw = r#"{
            "social": {"twitter": "x.com/ada", "linkedin": "linkedin.com/in/ada", "github": "github.com/ada"},
            "other": {"Zeta": "1", "Alpha": "2"}
        }"#;
        let record = normalize_record(&parse_tolerant(raw).unwrap()).unwrap();
        assert_eq!(record.social.labels(), vec!["twitter", "linkedin", "github"]);
        assert_eq!(record.other.labels(), vec!["Zeta", "Alpha"]);

        let body = serde_json::to_string(&record).unwrap();
        let twitter = body.find("\"twitter\"").unwrap();
        let github = body.find("\"github\"").unwrap();
        assert!(twitter < github);
    }

    #[test]
    fn test_normalize_object_valued_scalar_keeps_text() {
        let record =
            normalize_record(&json!({"summary": {"text": "Seasoned engineer"}})).unwrap();
        assert_eq!(record.summary, r#"{"text":"Seasoned engineer"}"#);
    }

    #[test]
    fn test_normalize_sanitizes_mapping_labels() {
        let record = normalize_record(&json!({"other": {"★": "x", " Languages ": "Rust"}})).unwrap();
        assert_eq!(record.other.len(), 1);
        assert_eq!(record.other.get("Languages"), Some("Rust"));
    }
}

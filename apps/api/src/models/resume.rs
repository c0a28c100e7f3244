use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Ordered label → value pairs (`social`, `other`), serialized as a JSON object.
///
/// Keeps the order in which the model emitted the keys so the rendered
/// document lists them the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap(Vec<(String, String)>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `label`, keeping the original position on replace.
    pub fn insert(&mut self, label: String, value: String) {
        match self.0.iter_mut().find(|(existing, _)| *existing == label) {
            Some(slot) => slot.1 = value,
            None => self.0.push((label, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
impl FieldMap {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.0.iter().map(|(label, _)| label.as_str()).collect()
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, value) in &self.0 {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkEntry {
    pub company: String,
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub degree: String,
    pub institution: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(rename = "percentage/gpa")]
    pub gpa: String,
}

/// Shared shape of `projects`, `certifications` and `achievements` items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NamedEntry {
    pub name: String,
    pub description: String,
}

/// The normalized, sanitized representation of one parsed resume.
///
/// Every leaf is a sanitized string; absent data is an empty string or empty
/// container, never null. Created per request and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResumeRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub social: FieldMap,
    pub skills: String,
    pub work: Vec<WorkEntry>,
    pub education: Vec<EducationEntry>,
    pub projects: Vec<NamedEntry>,
    pub certifications: Vec<NamedEntry>,
    pub achievements: Vec<NamedEntry>,
    pub other: FieldMap,
    pub summary: String,
    /// Set only when extraction failed; the rest of the record is then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsing_error: Option<String>,
}

impl ResumeRecord {
    /// An all-empty record carrying a human-readable extraction failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            parsing_error: Some(message.into()),
            ..Self::default()
        }
    }

    /// First and last name joined with a space, trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_map_preserves_insertion_order() {
        let mut map = FieldMap::new();
        map.insert("linkedin".into(), "a".into());
        map.insert("github".into(), "b".into());
        map.insert("linkedin".into(), "c".into());
        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs, vec![("linkedin", "c"), ("github", "b")]);
        assert_eq!(map.get("github"), Some("b"));
    }

    #[test]
    fn test_failed_record_serializes_all_fields() {
        let value = serde_json::to_value(ResumeRecord::failed("Parsing failed: boom")).unwrap();
        assert_eq!(
            value,
            json!({
                "first_name": "", "last_name": "", "email": "", "phone": "", "location": "",
                "social": {}, "skills": "", "work": [], "education": [], "projects": [],
                "certifications": [], "achievements": [], "other": {}, "summary": "",
                "parsing_error": "Parsing failed: boom"
            })
        );
    }

    #[test]
    fn test_entry_wire_names_match_schema() {
        let edu = EducationEntry {
            degree: "BSc".into(),
            start_date: "2015".into(),
            gpa: "3.8".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&edu).unwrap();
        assert_eq!(value["startDate"], "2015");
        assert_eq!(value["percentage/gpa"], "3.8");
        assert!(value.get("parsing_error").is_none());
    }

    #[test]
    fn test_full_name_trims_missing_parts() {
        let record = ResumeRecord {
            last_name: "Lovelace".into(),
            ..Default::default()
        };
        assert_eq!(record.full_name(), "Lovelace");
        assert_eq!(ResumeRecord::default().full_name(), "");
    }
}

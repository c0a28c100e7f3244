//! Text sanitization for anything that ends up in the rendered PDF.
//!
//! The built-in PDF fonts only cover a Latin charset, so every string coming
//! back from the model goes through `clean_text` before it reaches the record.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Everything that is not a word character, whitespace, or whitelisted punctuation.
static DISALLOWED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[^\w\s\-.,;:()@/\\\&%$\#!?+=*<>{}\[\]|\~`"'°]"#)
        .expect("sanitizer whitelist regex must compile")
});

static WHITESPACE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex must compile"));

/// Removes disallowed characters, collapses whitespace runs and trims.
///
/// Idempotent: `clean_text(&clean_text(s)) == clean_text(s)`.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let stripped = DISALLOWED_RE.replace_all(text, "");
    let collapsed = WHITESPACE_RUN_RE.replace_all(&stripped, " ");
    collapsed.trim().to_string()
}

/// Stringifies any JSON value, then sanitizes it.
///
/// - `null` → `""`
/// - numbers and booleans → their textual form
/// - arrays → sanitized scalar elements joined with `", "` (empties dropped)
/// - objects → compact JSON text
pub fn clean_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => clean_text(s),
        Value::Number(n) => clean_text(&n.to_string()),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(clean_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => clean_text(&value.to_string()),
    }
}

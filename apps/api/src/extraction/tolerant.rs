//! Tolerant JSON parsing for model output.
//!
//! Every place that turns untrusted model text into JSON goes through `parse_tolerant`.
//! Callers decide their own fallback (empty list, empty map, error record) on `Err`.
//!
//! Strategy: strip code fences, try strict `serde_json`, then run one repair pass
//! over the text and try again. The repair pass handles the malformations
//! models actually produce:
//! - prose before the first `{` / `[` and after the top-level value closes
//! - trailing commas before `}` / `]`
//! - unescaped `"` inside string values
//! - raw newlines / control characters inside strings
//! - Python literals `True` / `False` / `None`
//! - truncated output (unterminated string, dangling `,` or `:`, open containers)

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object or array found in text")]
    NoJson,

    #[error("JSON could not be repaired: {0}")]
    Unrepairable(#[from] serde_json::Error),
}

/// Parses `text` as JSON, repairing common malformations first if strict parsing fails.
pub fn parse_tolerant(text: &str) -> Result<Value, ParseError> {
    let text = strip_json_fences(text);

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }

    let repaired = repair_json(text).ok_or(ParseError::NoJson)?;
    Ok(serde_json::from_str(&repaired)?)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Single left-to-right repair pass. Returns `None` if the text has no `{` or `[`.
fn repair_json(text: &str) -> Option<String> {
    let start = text.find(|c: char| c == '{' || c == '[')?;
    let chars: Vec<char> = text[start..].chars().collect();

    let mut out = String::with_capacity(chars.len() + 16);
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if in_string {
            if escaped {
                out.push(c);
                escaped = false;
            } else if c == '\\' {
                out.push(c);
                escaped = true;
            } else if c == '"' {
                if closes_string(&chars, i + 1) {
                    out.push('"');
                    in_string = false;
                } else {
                    out.push_str("\\\"");
                }
            } else if c == '\n' {
                out.push_str("\\n");
            } else if c == '\r' {
                out.push_str("\\r");
            } else if c == '\t' {
                out.push_str("\\t");
            } else if c.is_control() {
                out.push_str(&format!("\\u{:04x}", c as u32));
            } else {
                out.push(c);
            }
            i += 1;
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '{' => {
                stack.push('}');
                out.push(c);
            }
            '[' => {
                stack.push(']');
                out.push(c);
            }
            '}' | ']' => {
                trim_trailing_comma(&mut out);
                match stack.pop() {
                    Some(closer) => out.push(closer),
                    None => break,
                }
                if stack.is_empty() {
                    break;
                }
            }
            ',' => {
                if !matches!(next_significant(&chars, i + 1), Some('}') | Some(']') | None) {
                    out.push(c);
                }
            }
            c if c.is_ascii_alphabetic() => {
                let word_end = chars[i..]
                    .iter()
                    .position(|ch| !ch.is_ascii_alphanumeric())
                    .map(|p| i + p)
                    .unwrap_or(chars.len());
                let word: String = chars[i..word_end].iter().collect();
                out.push_str(match word.as_str() {
                    "True" => "true",
                    "False" => "false",
                    "None" => "null",
                    other => other,
                });
                i = word_end;
                continue;
            }
            _ => out.push(c),
        }
        i += 1;
    }

    // Truncated output: close whatever is still open.
    if in_string {
        if escaped {
            out.pop();
        }
        out.push('"');
    }
    trim_trailing_comma(&mut out);
    if out.trim_end().ends_with(':') {
        out.push_str("null");
    }
    while let Some(closer) = stack.pop() {
        trim_trailing_comma(&mut out);
        out.push(closer);
    }

    Some(out)
}

/// A quote inside a string closes it only when followed by a structural character.
fn closes_string(chars: &[char], from: usize) -> bool {
    matches!(
        next_significant(chars, from),
        None | Some(',') | Some('}') | Some(']') | Some(':')
    )
}

fn next_significant(chars: &[char], from: usize) -> Option<char> {
    chars[from.min(chars.len())..]
        .iter()
        .copied()
        .find(|c| !c.is_whitespace())
}

fn trim_trailing_comma(out: &mut String) {
    let trimmed_len = out.trim_end().len();
    if out[..trimmed_len].ends_with(',') {
        out.truncate(trimmed_len - 1);
    }
}

//! Story building: turns a `ResumeRecord` into an ordered list of layout blocks.
//!
//! Pure and deterministic: no I/O, no fonts. `pdf.rs` consumes the story.
//! Each section is emitted only when it has at least one non-empty row/entry,
//! in a fixed order: title, contact, social, summary, skills, work, education,
//! projects, certifications, achievements, other.

use crate::models::resume::{FieldMap, NamedEntry, ResumeRecord};
use crate::render::font_metrics::FontStyle;

pub const DOCUMENT_TITLE: &str = "Processed Resume";

/// A styled fragment of a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub style: FontStyle,
}

impl Run {
    pub fn regular(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: FontStyle::Regular,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: FontStyle::Bold,
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: FontStyle::Italic,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Centered document title.
    Title(String),
    /// Section heading.
    Heading(String),
    /// Word-wrapped body text made of styled runs.
    Paragraph(Vec<Run>),
    /// Two-column label/value table; labels are bold.
    Table(Vec<(String, String)>),
    /// Vertical gap in points.
    Spacer(f32),
}

#[cfg(test)]
impl Block {
    /// Plain text of the block, runs concatenated. Spacers are empty.
    pub fn text(&self) -> String {
        match self {
            Block::Title(text) | Block::Heading(text) => text.clone(),
            Block::Paragraph(runs) => runs.iter().map(|r| r.text.as_str()).collect(),
            Block::Table(rows) => rows
                .iter()
                .map(|(label, value)| format!("{label} {value}"))
                .collect::<Vec<_>>()
                .join("\n"),
            Block::Spacer(_) => String::new(),
        }
    }
}

const SECTION_GAP: f32 = 12.0;
const ENTRY_GAP: f32 = 6.0;

/// Builds the full story for a record.
pub fn build_story(record: &ResumeRecord) -> Vec<Block> {
    let mut story = vec![Block::Title(DOCUMENT_TITLE.to_string()), Block::Spacer(SECTION_GAP)];

    contact_section(record, &mut story);
    table_section("Social Links", social_rows(&record.social), &mut story);
    text_section("Summary", &record.summary, &mut story);
    text_section("Skills", &record.skills, &mut story);
    work_section(record, &mut story);
    education_section(record, &mut story);
    projects_section(record, &mut story);
    bullet_section("Certifications", &record.certifications, &mut story);
    bullet_section("Achievements", &record.achievements, &mut story);
    table_section("Other Information", other_rows(&record.other), &mut story);

    story
}

/// Minimal document written when the full render fails.
pub fn fallback_story() -> Vec<Block> {
    vec![
        Block::Title("Resume Processing Failed".to_string()),
        Block::Paragraph(vec![Run::regular(
            "The resume was uploaded but PDF generation encountered an error.",
        )]),
        Block::Paragraph(vec![Run::regular(
            "Please check the JSON data for extracted information.",
        )]),
    ]
}

fn contact_section(record: &ResumeRecord, story: &mut Vec<Block>) {
    let name = record.full_name();
    let rows: Vec<(String, String)> = [
        ("Name:", name.as_str()),
        ("Email:", record.email.as_str()),
        ("Phone:", record.phone.as_str()),
        ("Location:", record.location.as_str()),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_empty())
    .map(|(label, value)| (label.to_string(), value.to_string()))
    .collect();

    table_section("Contact Information", rows, story);
}

fn social_rows(social: &FieldMap) -> Vec<(String, String)> {
    social
        .iter()
        .filter(|(_, link)| !link.is_empty())
        .map(|(platform, link)| (format!("{}:", title_case(platform)), link.to_string()))
        .collect()
}

fn other_rows(other: &FieldMap) -> Vec<(String, String)> {
    other
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(label, value)| (format!("{label}:"), value.to_string()))
        .collect()
}

fn table_section(heading: &str, rows: Vec<(String, String)>, story: &mut Vec<Block>) {
    if rows.is_empty() {
        return;
    }
    story.push(Block::Heading(heading.to_string()));
    story.push(Block::Table(rows));
    story.push(Block::Spacer(SECTION_GAP));
}

fn text_section(heading: &str, text: &str, story: &mut Vec<Block>) {
    if text.is_empty() {
        return;
    }
    story.push(Block::Heading(heading.to_string()));
    story.push(Block::Paragraph(vec![Run::regular(text)]));
    story.push(Block::Spacer(SECTION_GAP));
}

fn work_section(record: &ResumeRecord, story: &mut Vec<Block>) {
    let mut blocks = Vec::new();
    for job in &record.work {
        let Some(header) = entry_header(&job.title, " at ", &job.company) else {
            continue;
        };
        blocks.push(header);
        if let Some(dates) = date_range(&job.start_date, &job.end_date) {
            blocks.push(Block::Paragraph(vec![Run::italic(dates)]));
        }
        if !job.description.is_empty() {
            blocks.push(Block::Paragraph(vec![Run::regular(&job.description)]));
        }
        blocks.push(Block::Spacer(ENTRY_GAP));
    }
    push_section("Work Experience", blocks, story);
}

fn education_section(record: &ResumeRecord, story: &mut Vec<Block>) {
    let mut blocks = Vec::new();
    for edu in &record.education {
        let Some(header) = entry_header(&edu.degree, " - ", &edu.institution) else {
            continue;
        };
        blocks.push(header);
        if let Some(dates) = date_range(&edu.start_date, &edu.end_date) {
            blocks.push(Block::Paragraph(vec![Run::italic(dates)]));
        }
        if !edu.gpa.is_empty() {
            blocks.push(Block::Paragraph(vec![Run::regular(format!(
                "GPA/Percentage: {}",
                edu.gpa
            ))]));
        }
        blocks.push(Block::Spacer(ENTRY_GAP));
    }
    push_section("Education", blocks, story);
}

fn projects_section(record: &ResumeRecord, story: &mut Vec<Block>) {
    let mut blocks = Vec::new();
    for project in record.projects.iter().filter(|p| !p.name.is_empty()) {
        blocks.push(Block::Paragraph(vec![Run::bold(&project.name)]));
        if !project.description.is_empty() {
            blocks.push(Block::Paragraph(vec![Run::regular(&project.description)]));
        }
        blocks.push(Block::Spacer(ENTRY_GAP));
    }
    push_section("Projects", blocks, story);
}

fn bullet_section(heading: &str, entries: &[NamedEntry], story: &mut Vec<Block>) {
    let blocks: Vec<Block> = entries
        .iter()
        .filter(|entry| !entry.name.is_empty())
        .map(|entry| {
            let line = if entry.description.is_empty() {
                format!("\u{2022} {}", entry.name)
            } else {
                format!("\u{2022} {}: {}", entry.name, entry.description)
            };
            Block::Paragraph(vec![Run::regular(line)])
        })
        .collect();
    push_section(heading, blocks, story);
}

/// Headed section from pre-built entry blocks; omitted entirely when there are none.
fn push_section(heading: &str, blocks: Vec<Block>, story: &mut Vec<Block>) {
    if blocks.is_empty() {
        return;
    }
    story.push(Block::Heading(heading.to_string()));
    story.extend(blocks);
}

/// Bold `primary<joiner>secondary`, or whichever one exists. `None` when both are empty.
fn entry_header(primary: &str, joiner: &str, secondary: &str) -> Option<Block> {
    let runs = match (primary.is_empty(), secondary.is_empty()) {
        (false, false) => vec![Run::bold(primary), Run::regular(joiner), Run::bold(secondary)],
        (false, true) => vec![Run::bold(primary)],
        (true, false) => vec![Run::bold(secondary)],
        (true, true) => return None,
    };
    Some(Block::Paragraph(runs))
}

/// `start - end`, or whichever bound exists.
fn date_range(start: &str, end: &str) -> Option<String> {
    match (start.is_empty(), end.is_empty()) {
        (false, false) => Some(format!("{start} - {end}")),
        (false, true) => Some(start.to_string()),
        (true, false) => Some(end.to_string()),
        (true, true) => None,
    }
}

/// Capitalizes the first letter of every alphabetic run and lowercases the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

// Document Renderer: ResumeRecord → story (pure) → PDF file.
// CPU-bound writing must run inside tokio::task::spawn_blocking.

pub mod font_metrics;
pub mod pdf;
pub mod story;

use std::path::Path;

use thiserror::Error;
use tracing::{error, info};

use crate::models::resume::ResumeRecord;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(String),
}

/// Renders the full resume document. Never panics or propagates: returns `false`
/// and logs the cause on failure, leaving the fallback decision to the caller.
pub fn render_resume(record: &ResumeRecord, path: &Path) -> bool {
    let story = story::build_story(record);
    match pdf::write_story(&story, story::DOCUMENT_TITLE, path) {
        Ok(pages) => {
            info!("Rendered {} ({} blocks, {pages} page(s))", path.display(), story.len());
            true
        }
        Err(e) => {
            error!("Error generating PDF at {}: {e:?}", path.display());
            false
        }
    }
}

/// Writes the minimal "processing failed" document.
pub fn render_fallback(path: &Path) -> Result<(), RenderError> {
    pdf::write_story(&story::fallback_story(), "Resume Processing Failed", path)?;
    Ok(())
}

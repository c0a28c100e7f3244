use crate::config::Config;
use crate::extraction::ResumeExtractor;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built once at startup; nothing in it is mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Extraction pipeline. Holds the model behind `Arc<dyn ResumeModel>`, so tests swap in a stub.
    pub extractor: ResumeExtractor,
}

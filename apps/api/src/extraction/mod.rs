// Resume extraction: model call, tolerant parsing, and normalization into `ResumeRecord`.
// Leaf-first: sanitize → tolerant → accessor → extractor.

pub mod accessor;
pub mod extractor;
pub mod prompts;
pub mod sanitize;
pub mod tolerant;

pub use extractor::ResumeExtractor;

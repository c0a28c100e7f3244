// Shared prompt constants.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Instruction fragment that enforces JSON-only output.
pub const JSON_ONLY_INSTRUCTION: &str = "Return valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    No comments or explanations.";

/// The built-in PDF fonts only cover a Latin charset.
pub const ASCII_ONLY_INSTRUCTION: &str = "IMPORTANT: Use only basic ASCII characters in your response. \
    Avoid special Unicode characters, emojis, or non-Latin scripts.";

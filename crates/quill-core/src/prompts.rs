//! Prompt file helpers.

/// Default system prompt: markup rules and the report directive format.
pub const SYSTEM_PROMPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/system_prompt.md"
));

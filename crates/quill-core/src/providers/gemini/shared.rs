//! Gemini request building and error classification.

use serde_json::{Value, json};

use crate::providers::{ChatMessage, ProviderError, ProviderErrorKind};

/// Converts the message log into Gemini `contents`.
pub fn build_contents(messages: &[ChatMessage]) -> Vec<Value> {
    messages
        .iter()
        .filter(|m| !m.text.is_empty())
        .map(|m| {
            json!({
                "role": m.role.as_str(),
                "parts": [{ "text": m.text }],
            })
        })
        .collect()
}

/// Builds the `streamGenerateContent` request body.
pub fn build_gemini_request(
    messages: &[ChatMessage],
    system: Option<&str>,
    max_output_tokens: Option<u32>,
) -> Value {
    let mut request = json!({
        "contents": build_contents(messages),
    });

    if let Some(prompt) = system
        && !prompt.trim().is_empty()
    {
        request["system_instruction"] = json!({
            "parts": [{ "text": prompt }]
        });
    }

    if let Some(max) = max_output_tokens
        && max > 0
    {
        request["generationConfig"] = json!({ "maxOutputTokens": max });
    }

    request
}

/// Maps transport-level reqwest failures to provider error kinds.
pub fn classify_reqwest_error(e: &reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::timeout(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ProviderError::timeout(format!("Connection failed: {e}"))
    } else if e.is_request() {
        ProviderError::new(ProviderErrorKind::HttpStatus, format!("Request error: {e}"))
    } else {
        ProviderError::new(ProviderErrorKind::HttpStatus, format!("Network error: {e}"))
    }
}

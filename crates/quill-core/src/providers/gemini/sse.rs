//! Gemini SSE stream parser.

use std::collections::VecDeque;
use std::pin::Pin;

use eventsource_stream::{EventStream, Eventsource};
use futures_util::Stream;
use serde_json::Value;

use crate::providers::{ProviderError, ProviderErrorKind, ProviderResult, StreamEvent, Usage};

/// Gemini SSE stream parser.
///
/// Parses Server-Sent Events from `streamGenerateContent?alt=sse` and converts
/// them to normalized `StreamEvent`s. Thought parts are dropped.
pub struct GeminiSseParser<S> {
    inner: EventStream<S>,
    model: String,
    pending: VecDeque<StreamEvent>,
    final_usage: Option<Usage>,
    emitted_done: bool,
}

impl<S> GeminiSseParser<S> {
    pub fn new(stream: S, model: String) -> Self
    where
        S: Eventsource,
    {
        Self {
            inner: stream.eventsource(),
            model,
            pending: VecDeque::new(),
            final_usage: None,
            emitted_done: false,
        }
    }

    fn handle_event_data(&mut self, data: &str) -> ProviderResult<()> {
        let trimmed = data.trim();
        if trimmed.is_empty() || trimmed == "[DONE]" {
            return Ok(());
        }

        let value = serde_json::from_str::<Value>(trimmed).map_err(|err| {
            ProviderError::new(
                ProviderErrorKind::Parse,
                format!("Failed to parse SSE JSON: {err}"),
            )
        })?;
        self.handle_chunk(&value);
        Ok(())
    }

    fn handle_chunk(&mut self, value: &Value) {
        let payload = value.get("response").unwrap_or(value);

        if let Some(error) = value.get("error").or_else(|| payload.get("error")) {
            let error_type = error
                .get("status")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| error.get("code").map(ToString::to_string))
                .unwrap_or_else(|| "error".to_string());
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            self.pending.push_back(StreamEvent::Error {
                error_type,
                message,
            });
            return;
        }

        if let Some(usage) = payload.get("usageMetadata") {
            self.final_usage = Some(Usage {
                input_tokens: usage
                    .get("promptTokenCount")
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
                output_tokens: usage
                    .get("candidatesTokenCount")
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
            });
        }

        let Some(candidate) = payload
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|c| c.first())
        else {
            return;
        };

        if let Some(parts) = candidate
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(Value::as_array)
        {
            let combined_text: String = parts
                .iter()
                .filter(|part| !part.get("thought").and_then(Value::as_bool).unwrap_or(false))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();

            // Chunks are incremental; each one is appended as-is.
            if !combined_text.is_empty() {
                self.pending
                    .push_back(StreamEvent::TextDelta { text: combined_text });
            }
        }

        if let Some(reason) = candidate.get("finishReason").and_then(Value::as_str)
            && !self.emitted_done
        {
            self.emitted_done = true;
            tracing::debug!(model = %self.model, reason, "gemini stream finished");
            self.pending.push_back(StreamEvent::MessageCompleted {
                stop_reason: Some(map_finish_reason(reason)),
                usage: self.final_usage.clone().unwrap_or_default(),
            });
        }
    }
}

impl<S, E> Stream for GeminiSseParser<S>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = ProviderResult<StreamEvent>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        use std::task::Poll;

        loop {
            if let Some(event) = self.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }

            let inner = Pin::new(&mut self.inner);
            match inner.poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    if let Err(err) = self.handle_event_data(&event.data) {
                        return Poll::Ready(Some(Err(err)));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(ProviderError::new(
                        ProviderErrorKind::Parse,
                        format!("SSE stream error: {e}"),
                    ))));
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Maps Gemini finish reasons to normalized stop reasons.
pub fn map_finish_reason(reason: &str) -> String {
    match reason {
        "MAX_TOKENS" | "max_tokens" => "max_tokens".to_string(),
        "STOP" | "stop" => "stop".to_string(),
        other => other.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures_util::{StreamExt, stream};
    use serde_json::json;

    use super::*;

    fn create_test_parser() -> GeminiSseParser<impl Stream<Item = Result<Bytes, std::io::Error>>> {
        GeminiSseParser::new(stream::empty(), "gemini-2.5-flash".to_string())
    }

    fn text_chunk(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] }
            }]
        })
    }

    #[test]
    fn test_text_parts_emit_deltas() {
        let mut parser = create_test_parser();
        parser.handle_chunk(&text_chunk("Hello, "));
        parser.handle_chunk(&text_chunk("world"));

        let events: Vec<_> = parser.pending.drain(..).collect();
        assert_eq!(
            events,
            vec![
                StreamEvent::TextDelta {
                    text: "Hello, ".to_string()
                },
                StreamEvent::TextDelta {
                    text: "world".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_chunks_repeating_previous_text_are_kept_whole() {
        let mut parser = create_test_parser();
        for chunk in ["Intro\n", "\n", "\n### H", "ha", "haha"] {
            parser.handle_chunk(&text_chunk(chunk));
        }

        let joined: String = parser
            .pending
            .drain(..)
            .map(|event| match event {
                StreamEvent::TextDelta { text } => text,
                other => panic!("unexpected event: {other:?}"),
            })
            .collect();
        assert_eq!(joined, "Intro\n\n\n### Hhahaha");
    }

    #[test]
    fn test_thought_parts_are_skipped() {
        let mut parser = create_test_parser();
        parser.handle_chunk(&json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "thought": true, "text": "Let me think..." },
                        { "text": "Answer" }
                    ]
                }
            }]
        }));

        assert_eq!(
            parser.pending.drain(..).collect::<Vec<_>>(),
            vec![StreamEvent::TextDelta {
                text: "Answer".to_string()
            }]
        );
    }

    #[test]
    fn test_finish_reason_emits_completion_with_usage() {
        let mut parser = create_test_parser();
        parser.handle_chunk(&json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Done" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 3 }
        }));

        assert_eq!(
            parser.pending.pop_back(),
            Some(StreamEvent::MessageCompleted {
                stop_reason: Some("stop".to_string()),
                usage: Usage {
                    input_tokens: 12,
                    output_tokens: 3
                },
            })
        );
    }

    #[test]
    fn test_error_payload_becomes_error_event() {
        let mut parser = create_test_parser();
        parser.handle_chunk(&json!({
            "error": { "code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED" }
        }));

        assert_eq!(
            parser.pending.pop_front(),
            Some(StreamEvent::Error {
                error_type: "RESOURCE_EXHAUSTED".to_string(),
                message: "Quota exceeded".to_string(),
            })
        );
    }

    #[test]
    fn test_invalid_json_is_a_parse_error() {
        let mut parser = create_test_parser();
        let err = parser.handle_event_data("{not json").unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Parse);
        assert!(parser.handle_event_data("[DONE]").is_ok());
    }

    #[tokio::test]
    async fn test_stream_parses_sse_bytes() {
        let body = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hi\"}]}}]}\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\" there\"}]},\"finishReason\":\"STOP\"}]}\n\n",
        );
        let chunks = vec![Ok::<_, std::io::Error>(Bytes::from(body))];
        let parser = GeminiSseParser::new(stream::iter(chunks), "m".to_string());

        let events: Vec<_> = parser.map(|e| e.unwrap()).collect().await;
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[1],
            StreamEvent::TextDelta {
                text: " there".to_string()
            }
        );
        assert!(matches!(events[2], StreamEvent::MessageCompleted { .. }));
    }
}

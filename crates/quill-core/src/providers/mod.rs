//! Model provider transport.

pub mod gemini;
pub mod shared;

pub use shared::{
    ChatMessage, MISSING_CREDENTIAL_MESSAGE, ProviderError, ProviderErrorKind, ProviderResult,
    ProviderStream, Role, StreamEvent, Usage, resolve_api_key, resolve_base_url,
};

//! Core Quill library (markup, streaming turns, report layout, Gemini transport, config).

pub mod config;
pub mod core;
pub mod directive;
pub mod document;
pub mod layout;
pub mod logging;
pub mod markup;
pub mod prompts;
pub mod providers;

//! Core module: UI-agnostic turn handling.
//!
//! This module contains:
//! - `turn`: Per-turn streaming accumulator and display states
//! - `conversation`: Message log, transport seam and display channel

pub mod conversation;
pub mod turn;

pub use conversation::{
    Conversation, DisplayRx, DisplaySender, DisplayTx, Transport, create_display_channel,
};
pub use turn::{
    DisplayState, FALLBACK_ERROR_MESSAGE, ReportArtifact, StreamTurn, TurnOutcome, TurnPhase,
};

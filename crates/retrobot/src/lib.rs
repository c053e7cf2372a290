//! retrobot: a Discord bot that streams LLM answers as paced messages.
//!
//! The framing engine lives in `retrobot-frames`; this crate wires it to
//! LLM providers on one side and to Discord (or a terminal) on the other.

pub mod config;
pub mod gateway;
pub mod llm;
pub mod responses;
pub mod sse;
pub mod terminal;
pub mod words;
pub mod zig;

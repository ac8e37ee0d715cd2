//! Quill Core - Headless Script Engine
//!
//! This crate provides the engine behind quill's chat-model scripts,
//! completely independent of any UI framework. It can drive a terminal
//! surface, an editor widget, or run headless for testing.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Surfaces                              │
//! │    ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐   │
//! │    │  Chat (TUI)  │  │ Editor (TUI) │  │ Headless / Tests │   │
//! │    └──────┬───────┘  └──────┬───────┘  └────────┬─────────┘   │
//! │           └─────────────────┴──────────────────┘              │
//! │                          │                                    │
//! │                  ChatSurface (down)                           │
//! │                  submissions (up)                             │
//! └──────────────────────────┼────────────────────────────────────┘
//!                            │
//! ┌──────────────────────────┼────────────────────────────────────┐
//! │                     QUILL CORE                                │
//! │  ┌───────────────────────┴─────────────────────────────────┐  │
//! │  │                     ChatEngine                           │  │
//! │  │  ┌───────────┐ ┌────────────┐ ┌─────────┐ ┌──────────┐  │  │
//! │  │  │  Session  │ │ Controller │ │ Scripts │ │ Backend  │  │  │
//! │  │  │(transcript)│ │ (stream)  │ │(prompts)│ │  (LLM)   │  │  │
//! │  │  └───────────┘ └────────────┘ └─────────┘ └──────────┘  │  │
//! │  └──────────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ChatEngine`]: drives one script's conversation with the model
//! - [`StreamController`]: per-invocation streaming state machine
//! - [`ChatBackend`]: model client abstraction (OpenAI-compatible APIs)
//! - [`ChatSurface`]: what a UI must expose to display a conversation
//! - [`Session`]: conversation state, loadable from / savable to a transcript
//! - [`Script`]: the built-in script definitions and their prompts
//!
//! # Module Overview
//!
//! - [`backend`]: model client trait and the OpenAI implementation
//! - [`config`]: TOML + environment configuration
//! - [`controller`]: streaming response controller
//! - [`engine`]: ties session, backend and controller together
//! - [`markdown`]: lightweight markdown block model for rendering hints
//! - [`scripts`]: the built-in scripts (prompts, kickoff inputs)
//! - [`session`]: conversation state and persistence
//! - [`surface`]: the presentation surface abstraction
//! - [`transcript`]: the on-disk transcript format
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework. It's pure engine logic that can be used anywhere.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod controller;
pub mod engine;
pub mod markdown;
pub mod scripts;
pub mod session;
pub mod surface;
pub mod transcript;

// Re-exports for convenience
pub use backend::{ChatBackend, ChatRequest, OpenAiBackend, StreamEvent};
pub use config::{default_config_path, ConfigError, QuillConfig};
pub use controller::{StallState, StreamController, StreamOutcome, STALL_NOTICE};
pub use engine::{ActiveStream, ChatEngine, EngineConfig};
pub use scripts::{Script, SurfaceKind};
pub use session::Session;
pub use surface::{ChatSurface, ContentKind, MessageSlot, SurfaceContent};
pub use transcript::{Speaker, TranscriptError, Turn};

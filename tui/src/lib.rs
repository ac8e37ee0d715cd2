//! Quill TUI - Terminal surfaces for quill's scripts
//!
//! This crate provides the terminal front end: a chat surface for the
//! conversational scripts, an editor surface for the generate-and-edit
//! scripts, and a story picker with a live filtered preview.
//!
//! # Architecture
//!
//! The TUI is a thin display client. All conversation logic lives in
//! `quill-core`; this crate converts terminal events into submissions,
//! implements `ChatSurface` on its display state, and renders whatever
//! the engine writes into it.

pub mod app;
pub mod display;
pub mod editor;
pub mod picker;
pub mod render;
pub mod theme;

pub use app::ChatApp;
pub use display::{DisplayMessage, DisplayRole, DisplayState};
pub use editor::EditorApp;
pub use picker::StoryPicker;

//! Model Client Abstraction
//!
//! Trait definitions for chat-model backends plus the OpenAI
//! implementation. The abstraction lets the engine work with any
//! hosted chat API without changing core logic.

pub mod openai;
pub mod traits;

pub use openai::OpenAiBackend;
pub use traits::{ChatBackend, ChatRequest, StreamEvent};

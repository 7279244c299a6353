//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the summarisation core and an
//! external system (the language model, the filesystem). Implementations
//! live in `src/adapters/`.

pub mod filesystem;
pub mod llm;

pub use filesystem::FileSystem;
pub use llm::{CompletionFuture, CompletionRequest, CompletionResponse, LlmClient};

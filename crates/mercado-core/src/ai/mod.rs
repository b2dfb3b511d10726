pub mod chat;

pub use chat::{ChatCompletionClient, CompletionBackend, CompletionMessage, CompletionRequest};

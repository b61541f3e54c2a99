//! Gateway to the generative-AI service.
//!
//! [`Gateway`] wraps any [`Completion`] backend with the rate-limit retry
//! policy and exposes the four structured calls the app makes. The default
//! backend is [`GeminiClient`].

pub mod client;
pub mod completion;
pub mod error;
pub mod gateway;
mod prompts;
pub mod retry;

pub use client::{GeminiClient, GeminiConfig};
pub use completion::{Completion, CompletionRequest};
pub use error::{Error, Result};
pub use gateway::Gateway;
pub use retry::RetryPolicy;

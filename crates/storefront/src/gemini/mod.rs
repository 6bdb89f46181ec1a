//! Gemini client for the shop's chat assistant.
//!
//! Every conversation starts from the same two-turn persona history (the
//! shop's instructions and the assistant's greeting) followed by the
//! shopper's message. Nothing is stored between requests.

mod client;
mod error;
pub mod persona;
pub mod types;

pub use client::GeminiClient;
pub use error::GeminiError;

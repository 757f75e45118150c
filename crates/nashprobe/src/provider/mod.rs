//! Provider seam: one trait for every text-generation backend, with a
//! client that normalizes whatever the backend returns.
//!
//! [`http::HttpProvider`] covers the chat-completions and Anthropic
//! messages APIs; anything else implements [`Provider`] directly.

pub mod client;
pub mod default;
pub mod http;
pub mod types;

pub use client::*;
pub use http::HttpProvider;
pub use types::*;

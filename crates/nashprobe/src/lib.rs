//! Recover structured decisions from free-text LLM replies to
//! game-theoretic prompts.
//!
//! [`normalize`] turns any reply text into a [`NormalizedReply`]; providers
//! plug in through [`provider::Provider`] and are wrapped by
//! [`provider::ReplyClient`].

pub mod config;
pub mod model;
pub mod normalize;
pub mod provider;

pub use model::{NormalizedReply, RAW_OUTPUT_KEY, RawReply, ReplyOrigin};
pub use normalize::normalize;

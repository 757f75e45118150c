//! Reply domain types: raw text, normalized mapping, typed game fields.

pub mod fields;
pub mod reply;

pub use fields::*;
pub use reply::*;

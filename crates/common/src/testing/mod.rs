//! Testing utilities and helpers
//!
//! - **[`fixtures`]**: Token records with controlled expiry
//! - **[`mocks`]**: In-memory token cache and token endpoint
//!
//! Available to other crates through the `test-utils` feature.

pub mod fixtures;
pub mod mocks;

pub use fixtures::{token_record, valid_token};
pub use mocks::{MemoryTokenCache, MockTokenExchange};

//! Error conversions into [`nadctl_domain::NadError`].

pub mod conversions;

pub use conversions::{upstream_error, InfraError, IntoNadError};

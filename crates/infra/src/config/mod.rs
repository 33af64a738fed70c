//! Configuration loading
//!
//! Loads [`nadctl_domain::Config`] from environment variables and files.

pub mod loader;

pub use loader::{
    default_token_cache_path, load, load_from_env, load_from_file, probe_config_paths,
    token_cache_path,
};

//! Configuration loading and CLI definitions.
//!
//! This crate is organized into several modules:
//! - `types` - Configuration type definitions
//! - `loader` - File loading and the error type
//! - `validate` - Configuration validation
//! - `cli` - CLI override definitions and application
//! - `defaults` - Default value functions for serde

mod cli;
mod defaults;
mod loader;
mod types;
mod validate;

pub use cli::{CliOverrides, apply_overrides};
pub use loader::{ConfigError, load_config};
pub use types::*;
pub use validate::validate_config;

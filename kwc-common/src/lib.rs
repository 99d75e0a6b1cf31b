//! # KWC Common Library
//!
//! Shared code for the keyword collection services:
//! - Error types
//! - Configuration loading (environment, TOML, compiled defaults)
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod time;

pub use config::{Settings, StorefrontCredentials, TomlConfig};
pub use error::{Error, Result};

//! # eventos-core
//!
//! Core types, settings, logging, and error types for the eventos workspace.
//! This crate has no web or database dependencies and provides the foundation
//! for all other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Application settings with defaults
//! - [`settings_loader`] - Loading settings from TOML and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`signing`] - HMAC signing for values stored client-side

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod signing;

pub use error::{EventosError, EventosResult, ValidationError};
pub use settings::{DatabaseEngine, DatabaseSettings, Settings};

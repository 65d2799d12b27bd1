//! maplead core - shared foundation for the lead extraction workspace.
//!
//! This crate holds the value types every other crate speaks in, the central
//! error types, and the TOML-backed application configuration.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML configuration with platform paths and env overrides
//! - [`types`] - Listing records, filter settings, job parameters and job state
//!
//! # Example
//!
//! ```rust
//! use maplead_core::{FilterConfig, Record};
//!
//! let record = Record::new("Seattle", "https://www.google.com/maps/place/x");
//! let filters = FilterConfig::default();
//! assert!(filters.is_passthrough());
//! assert!(record.name.is_none());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BrowserConfig, ExportConfig, ScrapingConfig, ServerConfig};
pub use error::{ConfigError, ConfigResult, MapleadError, Result};
pub use types::{FilterConfig, JobParameters, JobState, Record};

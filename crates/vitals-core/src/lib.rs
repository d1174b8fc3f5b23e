//! Core types, configuration, and error handling for the vitals toolset.
//!
//! This crate provides the shared foundation used by all other vitals crates:
//! - [`VitalsError`] — unified error type using `thiserror`
//! - [`VitalsConfig`] — configuration loaded from `.vitals.toml`
//! - Report types: [`SectionReport`], [`SectionItem`], [`SectionStatus`],
//!   [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{FpmConfig, NginxConfig, TraceConfig, VitalsConfig};
pub use error::VitalsError;
pub use types::{OutputFormat, SectionItem, SectionReport, SectionStatus};

/// A convenience `Result` type for vitals operations.
pub type Result<T> = std::result::Result<T, VitalsError>;

use std::path::PathBuf;

/// Errors that can occur across the vitals toolset.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette` diagnostics at the
/// boundary.
///
/// # Examples
///
/// ```
/// use vitals_core::VitalsError;
///
/// let err = VitalsError::Config("window duration must be positive".into());
/// assert!(err.to_string().contains("must be positive"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum VitalsError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Collaborator output could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// An external command failed or could not be started.
    #[error("probe error: {0}")]
    Probe(String),

    /// A required external tool is not installed.
    #[error("tool not found: {0}")]
    ToolMissing(String),

    /// Hook installation failure (not a repository, unwritable hooks dir).
    #[error("hook error: {0}")]
    Hook(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::VitalsError;

/// Top-level configuration loaded from `.vitals.toml`.
///
/// Every section has working defaults so the tool runs without a config
/// file at all; resolution order is CLI flags > local config > defaults.
///
/// # Examples
///
/// ```
/// use vitals_core::VitalsConfig;
///
/// let config = VitalsConfig::default();
/// assert_eq!(config.fpm.process_marker, "php-fpm");
/// assert_eq!(config.nginx.tail_lines, 50_000);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VitalsConfig {
    /// PHP-FPM process and pool settings.
    #[serde(default)]
    pub fpm: FpmConfig,
    /// nginx access-log analysis settings.
    #[serde(default)]
    pub nginx: NginxConfig,
    /// Syscall trace capture settings.
    #[serde(default)]
    pub trace: TraceConfig,
}

impl VitalsConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`VitalsError::Io`] if the file cannot be read, or
    /// [`VitalsError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vitals_core::VitalsConfig;
    /// use std::path::Path;
    ///
    /// let config = VitalsConfig::from_file(Path::new(".vitals.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, VitalsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`VitalsError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use vitals_core::VitalsConfig;
    ///
    /// let toml = r#"
    /// [nginx]
    /// marker = "/api/v2/index.php"
    /// "#;
    /// let config = VitalsConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.nginx.marker, "/api/v2/index.php");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, VitalsError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// PHP-FPM process and pool configuration.
///
/// # Examples
///
/// ```
/// use vitals_core::FpmConfig;
///
/// let config = FpmConfig::default();
/// assert_eq!(config.process_marker, "php-fpm");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FpmConfig {
    /// Substring that identifies worker processes in the process table.
    #[serde(default = "default_process_marker")]
    pub process_marker: String,
    /// Path to the FPM pool configuration file.
    #[serde(default = "default_pool_config")]
    pub pool_config: PathBuf,
}

fn default_process_marker() -> String {
    "php-fpm".into()
}

fn default_pool_config() -> PathBuf {
    PathBuf::from("/etc/php-fpm.d/www.conf")
}

impl Default for FpmConfig {
    fn default() -> Self {
        Self {
            process_marker: default_process_marker(),
            pool_config: default_pool_config(),
        }
    }
}

/// nginx access-log analysis configuration.
///
/// `tail_lines` bounds how much of each log is scanned: only the trailing
/// segment is read, so events older than the segment but inside the window
/// can be missed on very busy logs. It is a cost bound, not a correctness
/// guarantee.
///
/// # Examples
///
/// ```
/// use vitals_core::NginxConfig;
///
/// let config = NginxConfig::default();
/// assert_eq!(config.marker, "/index.php");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NginxConfig {
    /// Access logs to analyze, each reported separately.
    #[serde(default = "default_access_logs")]
    pub access_logs: Vec<PathBuf>,
    /// Request-target substring that counts a line as "matched".
    #[serde(default = "default_marker")]
    pub marker: String,
    /// Trailing lines of each log to scan.
    #[serde(default = "default_tail_lines")]
    pub tail_lines: usize,
}

fn default_access_logs() -> Vec<PathBuf> {
    vec![PathBuf::from("/var/log/nginx/access.log")]
}

fn default_marker() -> String {
    "/index.php".into()
}

fn default_tail_lines() -> usize {
    50_000
}

impl Default for NginxConfig {
    fn default() -> Self {
        Self {
            access_logs: default_access_logs(),
            marker: default_marker(),
            tail_lines: default_tail_lines(),
        }
    }
}

/// Syscall trace capture configuration.
///
/// # Examples
///
/// ```
/// use vitals_core::TraceConfig;
///
/// let config = TraceConfig::default();
/// assert_eq!(config.timeout_secs, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Seconds to let the tracer run before killing it.
    #[serde(default = "default_trace_timeout")]
    pub timeout_secs: u64,
    /// File name for the transcript written to the working directory.
    #[serde(default = "default_transcript")]
    pub transcript: String,
}

fn default_trace_timeout() -> u64 {
    10
}

fn default_transcript() -> String {
    "vitals-trace.txt".into()
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_trace_timeout(),
            transcript: default_transcript(),
        }
    }
}

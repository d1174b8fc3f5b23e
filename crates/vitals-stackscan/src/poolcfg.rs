//! FPM pool configuration parsing.
//!
//! Pool files are flat `key = value` lines with `;`/`#` comments and
//! `[section]` headers. The report cares about the `pm.*` worker-limit
//! keys; everything else is kept accessible for completeness.

use serde::{Deserialize, Serialize};

/// Parsed pool configuration, order-preserving.
///
/// # Examples
///
/// ```
/// use vitals_stackscan::PoolConfig;
///
/// let pool = PoolConfig::parse("pm = dynamic\npm.max_children = 50\n");
/// assert_eq!(pool.get("pm"), Some("dynamic"));
/// assert_eq!(pool.worker_limits().max_children, Some(50));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    entries: Vec<(String, String)>,
}

/// The `pm.*` concurrency limits of one pool.
///
/// Absent keys stay `None`; FPM itself defaults them, the report only shows
/// what the file pins down.
///
/// # Examples
///
/// ```
/// use vitals_stackscan::WorkerLimits;
///
/// let limits = WorkerLimits::default();
/// assert!(limits.max_children.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerLimits {
    /// Process-manager mode (`static`, `dynamic`, `ondemand`).
    pub mode: Option<String>,
    /// Hard cap on worker processes.
    pub max_children: Option<u32>,
    /// Workers started with the pool (dynamic mode).
    pub start_servers: Option<u32>,
    /// Lower idle-worker bound (dynamic mode).
    pub min_spare_servers: Option<u32>,
    /// Upper idle-worker bound (dynamic mode).
    pub max_spare_servers: Option<u32>,
    /// Requests served before a worker is recycled.
    pub max_requests: Option<u32>,
}

impl PoolConfig {
    /// Parse pool-file content. Never fails: unparsable lines are ignored,
    /// matching how FPM itself tolerates sloppy files.
    pub fn parse(content: &str) -> Self {
        let mut entries = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            entries.push((key.trim().to_string(), value.trim().to_string()));
        }
        Self { entries }
    }

    /// Last value for `key`, matching FPM's last-one-wins semantics.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key)?.parse().ok()
    }

    /// Extract the worker-limit keys.
    pub fn worker_limits(&self) -> WorkerLimits {
        WorkerLimits {
            mode: self.get("pm").map(str::to_owned),
            max_children: self.get_u32("pm.max_children"),
            start_servers: self.get_u32("pm.start_servers"),
            min_spare_servers: self.get_u32("pm.min_spare_servers"),
            max_spare_servers: self.get_u32("pm.max_spare_servers"),
            max_requests: self.get_u32("pm.max_requests"),
        }
    }

    /// Number of parsed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was parsed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
; Start a new pool named 'www'.
[www]
user = apache
group = apache
listen = /run/php-fpm/www.sock

pm = dynamic
pm.max_children = 50
pm.start_servers = 5
pm.min_spare_servers = 5
pm.max_spare_servers = 35
pm.max_requests = 500
; pm.status_path = /status
php_admin_value[error_log] = /var/log/php-fpm/www-error.log
";

    #[test]
    fn extracts_worker_limits() {
        let pool = PoolConfig::parse(SAMPLE);
        let limits = pool.worker_limits();
        assert_eq!(limits.mode.as_deref(), Some("dynamic"));
        assert_eq!(limits.max_children, Some(50));
        assert_eq!(limits.start_servers, Some(5));
        assert_eq!(limits.min_spare_servers, Some(5));
        assert_eq!(limits.max_spare_servers, Some(35));
        assert_eq!(limits.max_requests, Some(500));
    }

    #[test]
    fn comments_and_sections_are_skipped() {
        let pool = PoolConfig::parse(SAMPLE);
        assert!(pool.get("pm.status_path").is_none());
        assert!(pool.get("[www]").is_none());
        assert_eq!(pool.get("user"), Some("apache"));
    }

    #[test]
    fn last_value_wins() {
        let pool = PoolConfig::parse("pm.max_children = 10\npm.max_children = 80\n");
        assert_eq!(pool.worker_limits().max_children, Some(80));
    }

    #[test]
    fn values_with_equals_keep_the_tail() {
        let pool = PoolConfig::parse("env[PATH] = /usr/local/bin:/usr/bin\n");
        assert_eq!(pool.get("env[PATH]"), Some("/usr/local/bin:/usr/bin"));
    }

    #[test]
    fn missing_keys_are_none() {
        let pool = PoolConfig::parse("pm = static\n");
        let limits = pool.worker_limits();
        assert_eq!(limits.mode.as_deref(), Some("static"));
        assert!(limits.max_children.is_none());
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(PoolConfig::parse("").is_empty());
        assert_eq!(PoolConfig::parse("; only a comment\n").len(), 0);
    }
}

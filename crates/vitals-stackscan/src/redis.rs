//! Redis `INFO` block parsing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Key-value pairs from a Redis `INFO` dump.
///
/// # Examples
///
/// ```
/// use vitals_stackscan::RedisInfo;
///
/// let info = RedisInfo::parse("# Memory\r\nused_memory_human:1.21M\r\n");
/// assert_eq!(info.get("used_memory_human"), Some("1.21M"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedisInfo {
    entries: HashMap<String, String>,
}

impl RedisInfo {
    /// Parse `INFO` output. `# Section` headers and blank lines are
    /// skipped; `redis-cli` emits CRLF line endings, which are stripped.
    pub fn parse(output: &str) -> Self {
        let mut entries = HashMap::new();
        for line in output.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                entries.insert(key.to_string(), value.to_string());
            }
        }
        Self { entries }
    }

    /// Raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key)?.parse().ok()
    }

    /// Human-formatted memory in use, e.g. `1.21M`.
    pub fn used_memory(&self) -> Option<&str> {
        self.get("used_memory_human")
    }

    /// Currently connected clients.
    pub fn connected_clients(&self) -> Option<u64> {
        self.get_u64("connected_clients")
    }

    /// Keyspace hit ratio as a percentage, rounded to two decimals.
    ///
    /// `None` until the server has seen at least one lookup.
    pub fn hit_ratio(&self) -> Option<f64> {
        let hits = self.get_u64("keyspace_hits")?;
        let misses = self.get_u64("keyspace_misses")?;
        let lookups = hits + misses;
        if lookups == 0 {
            return None;
        }
        let pct = hits as f64 * 100.0 / lookups as f64;
        Some((pct * 100.0).round() / 100.0)
    }

    /// True when nothing was parsed (e.g. the server refused the
    /// connection and the client printed an error instead).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! MySQL status-variable parsing.
//!
//! Accepts both output shapes a client produces for
//! `SHOW GLOBAL STATUS`: tab-separated `Variable_name\tValue` rows (batch
//! mode) and the `| name | value |` ASCII table (interactive mode).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Status variables from one `SHOW GLOBAL STATUS` run.
///
/// # Examples
///
/// ```
/// use vitals_stackscan::MysqlStatus;
///
/// let status = MysqlStatus::parse("Threads_connected\t42\nUptime\t86400\n");
/// assert_eq!(status.threads_connected(), Some(42));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MysqlStatus {
    entries: HashMap<String, String>,
}

impl MysqlStatus {
    /// Parse client output; unrecognized lines are ignored.
    pub fn parse(output: &str) -> Self {
        let mut entries = HashMap::new();
        for line in output.lines() {
            if let Some((name, value)) = split_row(line) {
                entries.insert(name.to_string(), value.to_string());
            }
        }
        Self { entries }
    }

    /// Raw value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name)?.parse().ok()
    }

    /// Open client connections.
    pub fn threads_connected(&self) -> Option<u64> {
        self.get_u64("Threads_connected")
    }

    /// Actively running threads.
    pub fn threads_running(&self) -> Option<u64> {
        self.get_u64("Threads_running")
    }

    /// Queries that exceeded `long_query_time`.
    pub fn slow_queries(&self) -> Option<u64> {
        self.get_u64("Slow_queries")
    }

    /// Server uptime in seconds.
    pub fn uptime_secs(&self) -> Option<u64> {
        self.get_u64("Uptime")
    }

    /// Lifetime average queries per second, rounded to two decimals.
    pub fn queries_per_second(&self) -> Option<f64> {
        let questions = self.get_u64("Questions")?;
        let uptime = self.uptime_secs()?;
        if uptime == 0 {
            return None;
        }
        let qps = questions as f64 / uptime as f64;
        Some((qps * 100.0).round() / 100.0)
    }

    /// True when nothing was parsed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn split_row(line: &str) -> Option<(&str, &str)> {
    // Batch mode: Variable_name<TAB>Value
    if let Some((name, value)) = line.split_once('\t') {
        let name = name.trim();
        if name.is_empty() || name == "Variable_name" {
            return None;
        }
        return Some((name, value.trim()));
    }

    // Table mode: | Variable_name | Value |
    let line = line.trim();
    if !line.starts_with('|') || !line.ends_with('|') {
        return None;
    }
    let mut cells = line[1..line.len() - 1].splitn(2, '|');
    let name = cells.next()?.trim();
    let value = cells.next()?.trim();
    if name.is_empty() || name == "Variable_name" {
        return None;
    }
    Some((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_batch_rows() {
        let out = "Variable_name\tValue\nThreads_connected\t42\nThreads_running\t3\nSlow_queries\t17\nQuestions\t864000\nUptime\t86400\n";
        let status = MysqlStatus::parse(out);
        assert_eq!(status.threads_connected(), Some(42));
        assert_eq!(status.threads_running(), Some(3));
        assert_eq!(status.slow_queries(), Some(17));
        assert_eq!(status.queries_per_second(), Some(10.0));
    }

    #[test]
    fn parses_ascii_table_rows() {
        let out = "\
+-------------------+-------+
| Variable_name     | Value |
+-------------------+-------+
| Threads_connected | 8     |
| Uptime            | 3600  |
| Questions         | 9000  |
+-------------------+-------+
";
        let status = MysqlStatus::parse(out);
        assert_eq!(status.threads_connected(), Some(8));
        assert_eq!(status.queries_per_second(), Some(2.5));
    }

    #[test]
    fn header_and_rules_are_ignored() {
        let status = MysqlStatus::parse("+---+---+\n| Variable_name | Value |\n");
        assert!(status.is_empty());
    }

    #[test]
    fn qps_needs_uptime() {
        let status = MysqlStatus::parse("Questions\t100\nUptime\t0\n");
        assert_eq!(status.queries_per_second(), None);
    }

    #[test]
    fn access_denied_output_is_empty() {
        let status =
            MysqlStatus::parse("ERROR 1045 (28000): Access denied for user 'root'@'localhost'\n");
        assert!(status.is_empty());
    }
}

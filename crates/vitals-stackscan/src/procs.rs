//! Process-table snapshot parsing.
//!
//! Consumes `ps aux` output and extracts the worker processes matching a
//! name marker, with their memory and CPU figures.

use serde::{Deserialize, Serialize};

/// One process row from a `ps aux` snapshot.
///
/// # Examples
///
/// ```
/// use vitals_stackscan::ProcessInfo;
///
/// let proc = ProcessInfo {
///     pid: 4321,
///     cpu_percent: 1.5,
///     rss_kb: 65536,
///     command: "php-fpm: pool www".into(),
/// };
/// assert_eq!(proc.rss_kb / 1024, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInfo {
    /// Process id.
    pub pid: u32,
    /// CPU usage as reported by `ps` (%CPU column).
    pub cpu_percent: f64,
    /// Resident set size in kilobytes.
    pub rss_kb: u64,
    /// Full command line.
    pub command: String,
}

/// Worker processes filtered out of one snapshot.
///
/// # Examples
///
/// ```
/// use vitals_stackscan::ProcessSnapshot;
///
/// let snapshot = ProcessSnapshot::default();
/// assert_eq!(snapshot.count(), 0);
/// assert_eq!(snapshot.avg_rss_kb(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSnapshot {
    /// Matching processes, in snapshot order.
    pub workers: Vec<ProcessInfo>,
}

impl ProcessSnapshot {
    /// Number of matching workers.
    pub fn count(&self) -> usize {
        self.workers.len()
    }

    /// Summed resident memory of all workers, in kilobytes.
    pub fn total_rss_kb(&self) -> u64 {
        self.workers.iter().map(|w| w.rss_kb).sum()
    }

    /// Mean resident memory per worker, in kilobytes. Zero when empty.
    pub fn avg_rss_kb(&self) -> u64 {
        if self.workers.is_empty() {
            0
        } else {
            self.total_rss_kb() / self.workers.len() as u64
        }
    }

    /// Summed %CPU of all workers.
    pub fn total_cpu_percent(&self) -> f64 {
        self.workers.iter().map(|w| w.cpu_percent).sum()
    }
}

/// Parse `ps aux` output, keeping rows whose command contains `marker`.
///
/// The header row and rows that do not fit the expected column layout are
/// skipped; a snapshot with zero matching workers is a valid (reportable)
/// result, not an error.
///
/// # Examples
///
/// ```
/// use vitals_stackscan::parse_ps_aux;
///
/// let ps = "\
/// USER  PID %CPU %MEM    VSZ   RSS TTY STAT START TIME COMMAND
/// root  910  0.0  0.4 221000 18000 ?   Ss   Jan01 0:04 php-fpm: master process
/// www   911  2.0  1.1 250000 45056 ?   S    Jan01 1:22 php-fpm: pool www
/// www   950  0.0  0.1  12000  4000 ?   S    Jan01 0:00 nginx: worker process
/// ";
/// let snapshot = parse_ps_aux(ps, "php-fpm");
/// assert_eq!(snapshot.count(), 2);
/// assert_eq!(snapshot.total_rss_kb(), 63056);
/// ```
pub fn parse_ps_aux(output: &str, marker: &str) -> ProcessSnapshot {
    let mut workers = Vec::new();

    for line in output.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        // USER PID %CPU %MEM VSZ RSS TTY STAT START TIME COMMAND...
        if fields.len() < 11 {
            continue;
        }
        let command = fields[10..].join(" ");
        if !command.contains(marker) {
            continue;
        }
        let (Ok(pid), Ok(cpu_percent), Ok(rss_kb)) = (
            fields[1].parse::<u32>(),
            fields[2].parse::<f64>(),
            fields[5].parse::<u64>(),
        ) else {
            continue;
        };
        workers.push(ProcessInfo {
            pid,
            cpu_percent,
            rss_kb,
            command,
        });
    }

    ProcessSnapshot { workers }
}

//! Time-windowed aggregation over access-log lines.
//!
//! The window is the trailing interval `[now - duration, now]`, computed
//! once per invocation. Each log file is aggregated independently against
//! the same window so the report can show a per-file breakdown.

use std::path::Path;

use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use vitals_core::VitalsError;

use crate::tail::tail_lines;

/// Timestamp layout inside the bracketed field of an access-log line,
/// e.g. `12/Mar/2024:10:30:00 +0000`.
const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// The trailing time interval requests are counted against.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use vitals_logwin::Window;
///
/// let window = Window::trailing(Utc::now(), 600).unwrap();
/// assert_eq!(window.seconds(), 600);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    seconds: i64,
}

impl Window {
    /// Build the window `[now - seconds, now]`.
    ///
    /// # Errors
    ///
    /// A non-positive duration cannot come out of the parser; if one shows
    /// up anyway it is a configuration error, returned as
    /// [`VitalsError::Config`] rather than risking a division by zero later.
    pub fn trailing(now: DateTime<Utc>, seconds: i64) -> Result<Self, VitalsError> {
        if seconds <= 0 {
            return Err(VitalsError::Config(format!(
                "window duration must be positive, got {seconds}"
            )));
        }
        Ok(Self {
            start: now - ChronoDuration::seconds(seconds),
            end: now,
            seconds,
        })
    }

    /// Window length in seconds.
    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Whether `instant` falls inside the window (boundaries inclusive).
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// Aggregated traffic inside one window, for one log file.
///
/// # Examples
///
/// ```
/// use vitals_logwin::WindowStats;
///
/// let stats = WindowStats::idle(600);
/// assert!(stats.is_idle());
/// assert_eq!(stats.total_rate, 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowStats {
    /// Requests timestamped inside the window.
    pub total: u64,
    /// In-window requests whose target contains the marker.
    pub matched: u64,
    /// In-window requests without the marker.
    pub remainder: u64,
    /// `total / window seconds`, rounded to two decimals.
    pub total_rate: f64,
    /// `matched / window seconds`, rounded to two decimals.
    pub matched_rate: f64,
    /// Window length the rates were computed over.
    pub window_secs: i64,
    /// Lines whose timestamp could not be parsed (rotated or torn writes).
    pub skipped: u64,
}

impl WindowStats {
    /// The zero-activity result: a clean scan that found nothing in-window.
    pub fn idle(window_secs: i64) -> Self {
        Self {
            total: 0,
            matched: 0,
            remainder: 0,
            total_rate: 0.0,
            matched_rate: 0.0,
            window_secs,
            skipped: 0,
        }
    }

    /// True when no request fell inside the window.
    pub fn is_idle(&self) -> bool {
        self.total == 0
    }
}

/// Aggregate `lines` against `window`.
///
/// Lines with an unparsable timestamp are counted in
/// [`WindowStats::skipped`] and otherwise ignored; garbled lines are
/// expected in rotated or concurrently-written logs and never abort the
/// scan. An empty result is the distinct zero-activity value, not an error.
///
/// # Errors
///
/// Only fails if `window` itself is invalid, which [`Window::trailing`]
/// already prevents.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use vitals_logwin::{aggregate, Window};
///
/// let now = Utc.with_ymd_and_hms(2024, 3, 12, 10, 30, 0).unwrap();
/// let window = Window::trailing(now, 300).unwrap();
/// let lines = [
///     r#"10.0.0.1 - - [12/Mar/2024:10:28:00 +0000] "GET /index.php?x=1 HTTP/1.1" 200 512"#,
///     r#"10.0.0.2 - - [12/Mar/2024:10:29:00 +0000] "GET /static/app.css HTTP/1.1" 200 99"#,
/// ];
/// let stats = aggregate(&window, "/index.php", lines.iter().map(|s| &**s));
/// assert_eq!(stats.total, 2);
/// assert_eq!(stats.matched, 1);
/// ```
pub fn aggregate<'a, I>(window: &Window, marker: &str, lines: I) -> WindowStats
where
    I: IntoIterator<Item = &'a str>,
{
    let mut stats = WindowStats::idle(window.seconds());

    for line in lines {
        let Some((instant, target)) = parse_line(line) else {
            stats.skipped += 1;
            continue;
        };
        if !window.contains(instant.with_timezone(&Utc)) {
            continue;
        }
        stats.total += 1;
        if target.contains(marker) {
            stats.matched += 1;
        } else {
            stats.remainder += 1;
        }
    }

    stats.total_rate = round2(stats.total as f64 / window.seconds() as f64);
    stats.matched_rate = round2(stats.matched as f64 / window.seconds() as f64);
    stats
}

/// Aggregate the trailing segment of the log file at `path`.
///
/// Reads at most `tail_limit` lines (see [`tail_lines`]) and feeds them to
/// [`aggregate`].
///
/// # Errors
///
/// Returns [`VitalsError::FileNotFound`] or [`VitalsError::Io`] when the
/// log cannot be read; the caller downgrades that to a warning section.
pub fn analyze_log(
    path: &Path,
    window: &Window,
    marker: &str,
    tail_limit: usize,
) -> Result<WindowStats, VitalsError> {
    let lines = tail_lines(path, tail_limit)?;
    Ok(aggregate(window, marker, lines.iter().map(String::as_str)))
}

/// Extract the timestamp and request target from one access-log line.
///
/// Expects the common/combined layout: timestamp in the first `[...]`
/// field, request line in the first `"..."` field. Returns `None` for
/// anything that does not fit.
fn parse_line(line: &str) -> Option<(DateTime<FixedOffset>, &str)> {
    let open = line.find('[')?;
    let rest = &line[open + 1..];
    let close = rest.find(']')?;
    let instant = DateTime::parse_from_str(&rest[..close], TIMESTAMP_FORMAT).ok()?;

    let after = &rest[close + 1..];
    let quote = after.find('"')?;
    let request = &after[quote + 1..];
    let end_quote = request.find('"')?;
    Some((instant, &request[..end_quote]))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 12, 10, 30, 0).unwrap()
    }

    fn log_line(ts: &str, target: &str) -> String {
        format!(r#"203.0.113.7 - - [{ts}] "GET {target} HTTP/1.1" 200 1024 "-" "curl/8.0""#)
    }

    #[test]
    fn window_rejects_non_positive_duration() {
        assert!(matches!(
            Window::trailing(now(), 0),
            Err(VitalsError::Config(_))
        ));
        assert!(matches!(
            Window::trailing(now(), -5),
            Err(VitalsError::Config(_))
        ));
    }

    #[test]
    fn window_boundaries_are_inclusive() {
        let window = Window::trailing(now(), 600).unwrap();
        assert!(window.contains(now()));
        assert!(window.contains(now() - ChronoDuration::seconds(600)));
        assert!(!window.contains(now() - ChronoDuration::seconds(601)));
        assert!(!window.contains(now() + ChronoDuration::seconds(1)));
    }

    #[test]
    fn all_lines_outside_window_is_idle_not_error() {
        let window = Window::trailing(now(), 60).unwrap();
        let lines = [
            log_line("12/Mar/2024:09:00:00 +0000", "/index.php"),
            log_line("12/Mar/2024:08:00:00 +0000", "/index.php"),
        ];
        let stats = aggregate(&window, "/index.php", lines.iter().map(String::as_str));
        assert!(stats.is_idle());
        assert_eq!(stats, WindowStats::idle(60));
    }

    #[test]
    fn counts_and_rates_split_by_marker() {
        let window = Window::trailing(now(), 300).unwrap();
        let lines = [
            log_line("12/Mar/2024:10:26:00 +0000", "/index.php?route=a"),
            log_line("12/Mar/2024:10:27:00 +0000", "/index.php?route=b"),
            log_line("12/Mar/2024:10:28:00 +0000", "/static/logo.png"),
            log_line("12/Mar/2024:10:29:30 +0000", "/index.php"),
        ];
        let stats = aggregate(&window, "/index.php", lines.iter().map(String::as_str));
        assert_eq!(stats.total, 4);
        assert_eq!(stats.matched, 3);
        assert_eq!(stats.remainder, 1);
        assert_eq!(stats.total_rate, 0.01);
        assert_eq!(stats.matched_rate, 0.01);
        assert_eq!(stats.window_secs, 300);
    }

    #[test]
    fn rates_round_to_two_decimals() {
        let window = Window::trailing(now(), 3).unwrap();
        let lines = [
            log_line("12/Mar/2024:10:29:58 +0000", "/index.php"),
            log_line("12/Mar/2024:10:29:59 +0000", "/static/a.js"),
        ];
        let stats = aggregate(&window, "/index.php", lines.iter().map(String::as_str));
        // 2/3 and 1/3 round to 0.67 and 0.33
        assert_eq!(stats.total_rate, 0.67);
        assert_eq!(stats.matched_rate, 0.33);
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let window = Window::trailing(now(), 300).unwrap();
        let good = log_line("12/Mar/2024:10:29:00 +0000", "/index.php");
        let lines = [
            good.as_str(),
            "garbled fragment without a timestamp",
            "1.2.3.4 - - [not/a/date] \"GET / HTTP/1.1\" 200 1",
        ];
        let stats = aggregate(&window, "/index.php", lines.iter().copied());
        assert_eq!(stats.total, 1);
        assert_eq!(stats.skipped, 2);
    }

    #[test]
    fn timezone_offsets_are_honored() {
        let window = Window::trailing(now(), 300).unwrap();
        // 12:28 at +0200 is 10:28 UTC, inside the window.
        let line = log_line("12/Mar/2024:12:28:00 +0200", "/index.php");
        let stats = aggregate(&window, "/index.php", std::iter::once(line.as_str()));
        assert_eq!(stats.total, 1);
    }

    #[test]
    fn analyze_log_reads_trailing_segment() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for minute in 0..30 {
            let ts = format!("12/Mar/2024:10:{minute:02}:30 +0000");
            writeln!(file, "{}", log_line(&ts, "/index.php")).unwrap();
        }
        file.flush().unwrap();

        let window = Window::trailing(now(), 600).unwrap();
        let stats = analyze_log(file.path(), &window, "/index.php", 50_000).unwrap();
        // Minutes 20..29 have their :30 mark inside [10:20:00, 10:30:00].
        assert_eq!(stats.total, 10);
        assert_eq!(stats.matched, 10);
    }

    #[test]
    fn analyze_log_missing_file_is_an_error() {
        let window = Window::trailing(now(), 600).unwrap();
        let err = analyze_log(Path::new("/no/such/log"), &window, "/", 100).unwrap_err();
        assert!(matches!(err, VitalsError::FileNotFound(_)));
    }
}

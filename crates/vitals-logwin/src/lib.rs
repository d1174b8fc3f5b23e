//! Trailing-window traffic analysis over web-server access logs.
//!
//! The structural core of the vitals report: parse an operator-supplied
//! duration token, read the trailing segment of each access log, and count
//! requests inside `[now - duration, now]`, split by a marker substring in
//! the request target.

mod duration;
mod tail;
mod window;

pub use duration::{parse_duration, WindowDuration, DEFAULT_WINDOW_SECS};
pub use tail::tail_lines;
pub use window::{aggregate, analyze_log, Window, WindowStats};

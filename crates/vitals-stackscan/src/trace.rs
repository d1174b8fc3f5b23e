//! Bounded syscall trace capture.
//!
//! Attaches `strace` to a worker process for a fixed wall-clock budget,
//! keeps whatever it streamed before the kill, and writes it to a
//! transcript file in the working directory. The timeout firing is the
//! expected outcome here, not a failure.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vitals_core::{TraceConfig, VitalsError};
use vitals_probe::CommandRunner;

/// Result of one bounded trace.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use vitals_stackscan::TraceCapture;
///
/// let capture = TraceCapture {
///     transcript: PathBuf::from("vitals-trace.txt"),
///     bytes: 2048,
///     truncated: true,
/// };
/// assert!(capture.truncated);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceCapture {
    /// Where the transcript was written.
    pub transcript: PathBuf,
    /// Transcript size in bytes.
    pub bytes: usize,
    /// True when the timeout killed the tracer (the normal case).
    pub truncated: bool,
}

/// Trace `pid` for at most `config.timeout_secs` seconds and write the
/// transcript into `out_dir`.
///
/// `strace` streams the trace on stderr; stdout (usually empty) is
/// appended after it so nothing is lost.
///
/// # Errors
///
/// Returns [`VitalsError::ToolMissing`] when `strace` is not installed,
/// [`VitalsError::Probe`] when it cannot attach (typically a permissions
/// problem that the privilege gate should have caught), and
/// [`VitalsError::Io`] when the transcript cannot be written.
pub fn capture_trace(
    runner: &dyn CommandRunner,
    pid: u32,
    config: &TraceConfig,
    out_dir: &Path,
) -> Result<TraceCapture, VitalsError> {
    let pid_arg = pid.to_string();
    let args = ["-p", pid_arg.as_str(), "-f", "-tt", "-T"];
    let output = runner.run(
        "strace",
        &args,
        Some(Duration::from_secs(config.timeout_secs)),
    )?;

    let mut transcript_body = output.stderr;
    transcript_body.push_str(&output.stdout);

    // A clean exit with nothing captured means strace never attached.
    if !output.timed_out && transcript_body.trim().is_empty() {
        return Err(VitalsError::Probe(format!(
            "strace produced no output for pid {pid} (exit code {:?})",
            output.exit_code
        )));
    }

    let transcript = out_dir.join(&config.transcript);
    std::fs::write(&transcript, &transcript_body)?;

    Ok(TraceCapture {
        transcript,
        bytes: transcript_body.len(),
        truncated: output.timed_out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitals_probe::{ProbeOutput, ScriptedRunner};

    fn config() -> TraceConfig {
        TraceConfig {
            timeout_secs: 1,
            transcript: "trace-test.txt".into(),
        }
    }

    #[test]
    fn partial_output_is_written_on_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new().with(
            "strace",
            ProbeOutput {
                stdout: String::new(),
                stderr: "10:30:01 epoll_wait(8, ...) = 1 <0.000123>\n".into(),
                exit_code: None,
                timed_out: true,
            },
        );

        let capture = capture_trace(&runner, 911, &config(), dir.path()).unwrap();
        assert!(capture.truncated);
        assert_eq!(capture.transcript, dir.path().join("trace-test.txt"));

        let body = std::fs::read_to_string(&capture.transcript).unwrap();
        assert!(body.contains("epoll_wait"));
        assert_eq!(capture.bytes, body.len());
    }

    #[test]
    fn missing_strace_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new();
        let err = capture_trace(&runner, 911, &config(), dir.path()).unwrap_err();
        assert!(matches!(err, VitalsError::ToolMissing(_)));
    }

    #[test]
    fn silent_clean_exit_is_a_probe_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new().with(
            "strace",
            ProbeOutput {
                stdout: String::new(),
                stderr: String::new(),
                exit_code: Some(1),
                timed_out: false,
            },
        );
        let err = capture_trace(&runner, 911, &config(), dir.path()).unwrap_err();
        assert!(matches!(err, VitalsError::Probe(_)));
        assert!(!dir.path().join("trace-test.txt").exists());
    }
}

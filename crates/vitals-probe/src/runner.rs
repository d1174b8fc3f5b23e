use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use vitals_core::VitalsError;

/// Captured result of one external command.
///
/// # Examples
///
/// ```
/// use vitals_probe::ProbeOutput;
///
/// let out = ProbeOutput {
///     stdout: "PONG\n".into(),
///     stderr: String::new(),
///     exit_code: Some(0),
///     timed_out: false,
/// };
/// assert!(out.success());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProbeOutput {
    /// Everything the command wrote to stdout.
    pub stdout: String,
    /// Everything the command wrote to stderr.
    pub stderr: String,
    /// Exit code, `None` if killed by a signal (including our timeout kill).
    pub exit_code: Option<i32>,
    /// Whether the wall-clock timeout fired and the command was killed.
    pub timed_out: bool,
}

impl ProbeOutput {
    /// True when the command exited normally with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out
    }
}

/// Capability to run an external command and capture its output.
///
/// Report sections depend on this trait instead of `std::process` directly
/// so their parsing logic can be exercised against canned output. The
/// contract on timeout: kill the child, keep whatever it wrote, and set
/// [`ProbeOutput::timed_out`] — a timed-out probe is still a result, not an
/// error.
pub trait CommandRunner {
    /// Run `program` with `args`, waiting at most `timeout` if given.
    ///
    /// # Errors
    ///
    /// Returns [`VitalsError::ToolMissing`] if `program` is not installed,
    /// or [`VitalsError::Probe`] if it could not be spawned or waited on.
    fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<ProbeOutput, VitalsError>;
}

/// Real implementation over `std::process::Command`.
///
/// The calling thread blocks until the child exits or the deadline kills
/// it. Both pipes are drained on background reader threads for the whole
/// run: a child that writes more than the OS pipe buffer (`ps aux` on a
/// busy box easily does) keeps making progress instead of blocking on a
/// full pipe until the deadline, and partial output survives a kill.
///
/// # Examples
///
/// ```no_run
/// use vitals_probe::{CommandRunner, SystemRunner};
///
/// let out = SystemRunner.run("id", &["-u"], None).unwrap();
/// assert!(out.success());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<ProbeOutput, VitalsError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VitalsError::ToolMissing(program.to_string())
            } else {
                VitalsError::Probe(format!("failed to spawn {program}: {e}"))
            }
        })?;

        // Drain both pipes from the start; whatever arrived before a kill
        // is what the report gets.
        let stdout = drain_pipe(child.stdout.take());
        let stderr = drain_pipe(child.stderr.take());

        let mut timed_out = false;
        if let Some(limit) = timeout {
            let deadline = Instant::now() + limit;
            loop {
                match child.try_wait() {
                    Ok(Some(_)) => break,
                    Ok(None) => {
                        if Instant::now() >= deadline {
                            let _ = child.kill();
                            timed_out = true;
                            break;
                        }
                        std::thread::sleep(Duration::from_millis(50));
                    }
                    Err(e) => {
                        return Err(VitalsError::Probe(format!(
                            "failed to poll {program}: {e}"
                        )));
                    }
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| VitalsError::Probe(format!("failed to wait on {program}: {e}")))?;

        Ok(ProbeOutput {
            stdout: String::from_utf8_lossy(&stdout.join().unwrap_or_default()).into_owned(),
            stderr: String::from_utf8_lossy(&stderr.join().unwrap_or_default()).into_owned(),
            exit_code: status.code(),
            timed_out,
        })
    }
}

/// Read a pipe to EOF on its own thread so the child never blocks on a
/// full pipe buffer while the parent is only polling `try_wait`.
fn drain_pipe<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_and_exit_code() {
        let out = SystemRunner.run("echo", &["hello"], None).unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "hello");
        assert!(!out.timed_out);
    }

    #[test]
    fn missing_tool_is_a_distinct_error() {
        let err = SystemRunner
            .run("definitely-not-a-real-tool-xyz", &[], None)
            .unwrap_err();
        assert!(matches!(err, VitalsError::ToolMissing(_)));
    }

    #[test]
    fn nonzero_exit_is_not_success() {
        let out = SystemRunner.run("false", &[], None).unwrap();
        assert!(!out.success());
        assert_ne!(out.exit_code, Some(0));
    }

    #[test]
    fn timeout_kills_and_flags() {
        let start = Instant::now();
        let out = SystemRunner
            .run("sleep", &["30"], Some(Duration::from_millis(200)))
            .unwrap();
        assert!(out.timed_out);
        assert!(!out.success());
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn partial_output_survives_timeout() {
        // The sleep's stdout is redirected so the killed shell is the only
        // writer left on the pipe and the drain sees EOF immediately.
        let out = SystemRunner
            .run(
                "sh",
                &["-c", "echo early; sleep 30 > /dev/null 2>&1"],
                Some(Duration::from_millis(200)),
            )
            .unwrap();
        assert!(out.timed_out);
        assert_eq!(out.stdout.trim(), "early");
    }

    #[test]
    fn output_larger_than_pipe_buffer_is_drained() {
        // 200 kB is well past the ~64 KiB pipe buffer; without a reader
        // the child would block on write and die at the deadline.
        let start = Instant::now();
        let out = SystemRunner
            .run(
                "sh",
                &["-c", "yes x | head -c 200000"],
                Some(Duration::from_secs(5)),
            )
            .unwrap();
        assert!(!out.timed_out);
        assert!(out.success());
        assert_eq!(out.stdout.len(), 200_000);
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}

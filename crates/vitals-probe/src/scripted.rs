use std::collections::HashMap;
use std::time::Duration;

use vitals_core::VitalsError;

use crate::runner::{CommandRunner, ProbeOutput};

/// Canned-output runner for tests.
///
/// Maps a program name to a fixed [`ProbeOutput`]; programs without an entry
/// behave as not installed. Lives in the library (not behind `cfg(test)`)
/// because downstream crates drive their section logic with it.
///
/// # Examples
///
/// ```
/// use vitals_probe::{CommandRunner, ProbeOutput, ScriptedRunner};
///
/// let runner = ScriptedRunner::new().with("redis-cli", ProbeOutput {
///     stdout: "used_memory_human:1.2M\n".into(),
///     exit_code: Some(0),
///     ..Default::default()
/// });
///
/// let out = runner.run("redis-cli", &["info"], None).unwrap();
/// assert!(out.stdout.contains("used_memory_human"));
/// assert!(runner.run("mysql", &[], None).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    outputs: HashMap<String, ProbeOutput>,
}

impl ScriptedRunner {
    /// An empty runner where every tool is missing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register canned output for `program`.
    #[must_use]
    pub fn with(mut self, program: &str, output: ProbeOutput) -> Self {
        self.outputs.insert(program.to_string(), output);
        self
    }

    /// Register a program that exits 0 with `stdout`.
    #[must_use]
    pub fn with_stdout(self, program: &str, stdout: &str) -> Self {
        self.with(
            program,
            ProbeOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
                exit_code: Some(0),
                timed_out: false,
            },
        )
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(
        &self,
        program: &str,
        _args: &[&str],
        _timeout: Option<Duration>,
    ) -> Result<ProbeOutput, VitalsError> {
        self.outputs
            .get(program)
            .cloned()
            .ok_or_else(|| VitalsError::ToolMissing(program.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_program_is_missing() {
        let runner = ScriptedRunner::new();
        let err = runner.run("vmstat", &[], None).unwrap_err();
        assert!(matches!(err, VitalsError::ToolMissing(_)));
    }

    #[test]
    fn with_stdout_exits_zero() {
        let runner = ScriptedRunner::new().with_stdout("free", "Mem: 1 2 3\n");
        let out = runner.run("free", &["-m"], None).unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "Mem: 1 2 3\n");
    }
}

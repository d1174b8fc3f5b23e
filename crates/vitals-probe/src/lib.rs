//! External command execution for the vitals report.
//!
//! Everything the report learns about the host comes from external tools
//! (`ps`, `free`, `redis-cli`, `mysql`, `strace`, ...). This crate models
//! that single capability: run a command, capture stdout/stderr/exit code,
//! honor a wall-clock timeout. [`SystemRunner`] is the real thing;
//! [`ScriptedRunner`] feeds canned output to tests.

mod runner;
mod scripted;

pub use runner::{CommandRunner, ProbeOutput, SystemRunner};
pub use scripted::ScriptedRunner;

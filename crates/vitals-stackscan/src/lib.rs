//! Parsers for the collaborator output the health report consumes.
//!
//! Each module handles one external surface: `ps` snapshots, `free` memory
//! tables, FPM pool files, Redis `INFO`, MySQL status variables, and the
//! bounded `strace` capture. All parsers are pure text-in/struct-out so
//! they can be tested against captured samples without the real tools.

mod memory;
mod mysql;
mod poolcfg;
mod procs;
mod redis;
mod trace;

pub use memory::{parse_free, MemoryInfo};
pub use mysql::MysqlStatus;
pub use poolcfg::{PoolConfig, WorkerLimits};
pub use procs::{parse_ps_aux, ProcessInfo, ProcessSnapshot};
pub use redis::RedisInfo;
pub use trace::{capture_trace, TraceCapture};

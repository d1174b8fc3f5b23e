//! Gathers the sections of the health report.
//!
//! Every section degrades instead of failing: a missing tool renders as an
//! informational skip, unreadable input as a warning, and the rest of the
//! report still prints. The only hard precondition (root privilege) is
//! checked in `main` before any of this runs.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use vitals_core::{SectionItem, SectionReport, VitalsConfig, VitalsError};
use vitals_logwin::{analyze_log, Window};
use vitals_probe::CommandRunner;
use vitals_stackscan::{
    capture_trace, parse_free, parse_ps_aux, MysqlStatus, PoolConfig, ProcessSnapshot, RedisInfo,
};

/// Upper bound for any single probe; nothing here should take this long.
const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// The complete report, ready for text or JSON rendering.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorReport {
    /// Window length the traffic sections were computed over.
    pub window_secs: i64,
    /// True when the operator's duration token was invalid and the
    /// default was substituted.
    pub window_fell_back: bool,
    /// Whether any worker process matched the configured marker. An empty
    /// match is an unmet precondition and turns into a non-zero exit.
    pub workers_found: bool,
    /// All report sections, in render order.
    pub sections: Vec<SectionReport>,
}

/// Run every probe and assemble the report.
///
/// `out_dir` is where the trace transcript lands (the working directory in
/// normal operation, a temp dir in tests).
pub fn gather(
    runner: &dyn CommandRunner,
    config: &VitalsConfig,
    window: &Window,
    window_fell_back: bool,
    out_dir: &Path,
) -> DoctorReport {
    let mut sections = Vec::new();

    let (workers, snapshot) = workers_section(runner, config);
    let workers_found = snapshot.as_ref().is_some_and(|s| s.count() > 0);
    sections.push(workers);

    sections.push(memory_section(runner));
    sections.push(pool_section(config));
    sections.push(redis_section(runner));
    sections.push(mysql_section(runner));
    sections.push(mongo_section(runner));
    sections.extend(traffic_sections(config, window));
    sections.push(trace_section(runner, config, snapshot.as_ref(), out_dir));

    DoctorReport {
        window_secs: window.seconds(),
        window_fell_back,
        workers_found,
        sections,
    }
}

/// Map a gather failure onto the section taxonomy.
fn degraded(name: &str, err: VitalsError) -> SectionReport {
    match err {
        VitalsError::ToolMissing(tool) => {
            SectionReport::skipped(name, format!("{tool} not installed"))
        }
        other => SectionReport::warn(name, other.to_string()),
    }
}

fn workers_section(
    runner: &dyn CommandRunner,
    config: &VitalsConfig,
) -> (SectionReport, Option<ProcessSnapshot>) {
    let marker = &config.fpm.process_marker;
    let output = match runner.run("ps", &["aux"], Some(PROBE_TIMEOUT)) {
        Ok(out) => out,
        Err(err) => return (degraded("workers", err), None),
    };

    let snapshot = parse_ps_aux(&output.stdout, marker);
    if snapshot.count() == 0 {
        let section = SectionReport::warn(
            "workers",
            format!("no processes matching '{marker}' in the process table"),
        );
        return (section, Some(snapshot));
    }

    let items = vec![
        SectionItem::new("processes", snapshot.count().to_string()),
        SectionItem::new(
            "resident memory",
            format!("{} MB total", snapshot.total_rss_kb() / 1024),
        ),
        SectionItem::new(
            "per worker",
            format!("{} MB avg", snapshot.avg_rss_kb() / 1024),
        ),
        SectionItem::new("cpu", format!("{:.1}%", snapshot.total_cpu_percent())),
    ];
    (SectionReport::ok("workers", items), Some(snapshot))
}

fn memory_section(runner: &dyn CommandRunner) -> SectionReport {
    let output = match runner.run("free", &["-m"], Some(PROBE_TIMEOUT)) {
        Ok(out) => out,
        Err(err) => return degraded("memory", err),
    };
    let mem = match parse_free(&output.stdout) {
        Ok(mem) => mem,
        Err(err) => return degraded("memory", err),
    };

    let mut items = vec![
        SectionItem::new(
            "physical",
            format!(
                "{} MB used of {} MB ({}%)",
                mem.used_mb,
                mem.total_mb,
                mem.used_percent()
            ),
        ),
        SectionItem::new("free", format!("{} MB", mem.free_mb)),
    ];
    if let Some(available) = mem.available_mb {
        items.push(SectionItem::new("available", format!("{available} MB")));
    }
    items.push(SectionItem::new(
        "swap",
        if mem.swapping() {
            format!("{} MB in use of {} MB", mem.swap_used_mb, mem.swap_total_mb)
        } else {
            "not in use".into()
        },
    ));
    SectionReport::ok("memory", items)
}

fn pool_section(config: &VitalsConfig) -> SectionReport {
    let path = &config.fpm.pool_config;
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => {
            return SectionReport::warn("pool config", format!("cannot read {}", path.display()));
        }
    };

    let pool = PoolConfig::parse(&content);
    let limits = pool.worker_limits();
    let mut items = Vec::new();
    if let Some(mode) = &limits.mode {
        items.push(SectionItem::new("pm", mode.clone()));
    }
    for (label, value) in [
        ("pm.max_children", limits.max_children),
        ("pm.start_servers", limits.start_servers),
        ("pm.min_spare_servers", limits.min_spare_servers),
        ("pm.max_spare_servers", limits.max_spare_servers),
        ("pm.max_requests", limits.max_requests),
    ] {
        if let Some(value) = value {
            items.push(SectionItem::new(label, value.to_string()));
        }
    }
    if items.is_empty() {
        return SectionReport::warn(
            "pool config",
            format!("no pm.* keys in {}", path.display()),
        );
    }
    SectionReport::ok("pool config", items)
}

fn redis_section(runner: &dyn CommandRunner) -> SectionReport {
    let output = match runner.run("redis-cli", &["info"], Some(PROBE_TIMEOUT)) {
        Ok(out) => out,
        Err(err) => return degraded("redis", err),
    };

    let info = RedisInfo::parse(&output.stdout);
    if info.used_memory().is_none() && info.connected_clients().is_none() {
        return SectionReport::warn("redis", "server not reachable on the default socket");
    }

    let mut items = Vec::new();
    if let Some(memory) = info.used_memory() {
        items.push(SectionItem::new("memory", memory));
    }
    if let Some(clients) = info.connected_clients() {
        items.push(SectionItem::new("clients", clients.to_string()));
    }
    if let Some(ratio) = info.hit_ratio() {
        items.push(SectionItem::new("hit ratio", format!("{ratio}%")));
    }
    SectionReport::ok("redis", items)
}

fn mysql_section(runner: &dyn CommandRunner) -> SectionReport {
    let args = ["-N", "-B", "-e", "SHOW GLOBAL STATUS"];
    let output = match runner.run("mysql", &args, Some(PROBE_TIMEOUT)) {
        Ok(out) => out,
        Err(err) => return degraded("mysql", err),
    };

    let status = MysqlStatus::parse(&output.stdout);
    if status.is_empty() {
        let note = if output.stderr.trim().is_empty() {
            "no status output from the client".to_string()
        } else {
            output.stderr.lines().next().unwrap_or_default().to_string()
        };
        return SectionReport::warn("mysql", note);
    }

    let mut items = Vec::new();
    if let Some(connected) = status.threads_connected() {
        items.push(SectionItem::new("connections", connected.to_string()));
    }
    if let Some(running) = status.threads_running() {
        items.push(SectionItem::new("running", running.to_string()));
    }
    if let Some(slow) = status.slow_queries() {
        items.push(SectionItem::new("slow queries", slow.to_string()));
    }
    if let Some(qps) = status.queries_per_second() {
        items.push(SectionItem::new("qps", format!("{qps} avg")));
    }
    SectionReport::ok("mysql", items)
}

fn mongo_section(runner: &dyn CommandRunner) -> SectionReport {
    let output = match runner.run("mongostat", &["-n", "1"], Some(PROBE_TIMEOUT)) {
        Ok(out) => out,
        Err(err) => return degraded("mongodb", err),
    };

    let sample = output
        .stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty());
    match sample {
        Some(line) => SectionReport::ok(
            "mongodb",
            vec![SectionItem::new("sample", line.to_string())],
        ),
        None => SectionReport::warn("mongodb", "mongostat produced no sample"),
    }
}

fn traffic_sections(config: &VitalsConfig, window: &Window) -> Vec<SectionReport> {
    let marker = &config.nginx.marker;
    let mut sections = Vec::new();

    for path in &config.nginx.access_logs {
        let name = format!("traffic {}", path.display());
        match analyze_log(path, window, marker, config.nginx.tail_lines) {
            Ok(stats) if stats.is_idle() => {
                let section = SectionReport::ok(
                    name.as_str(),
                    vec![SectionItem::new(
                        "requests",
                        format!("none in the last {} s", window.seconds()),
                    )],
                );
                sections.push(section);
            }
            Ok(stats) => {
                let mut items = vec![
                    SectionItem::new("requests", stats.total.to_string()),
                    SectionItem::new(
                        format!("matching {marker}"),
                        format!("{} ({} other)", stats.matched, stats.remainder),
                    ),
                    SectionItem::new("rate", format!("{:.2} req/s", stats.total_rate)),
                    SectionItem::new("matched rate", format!("{:.2} req/s", stats.matched_rate)),
                ];
                if stats.skipped > 0 {
                    items.push(SectionItem::new(
                        "unparsed lines",
                        stats.skipped.to_string(),
                    ));
                }
                sections.push(SectionReport::ok(name.as_str(), items));
            }
            Err(err) => sections.push(SectionReport::warn(name.as_str(), err.to_string())),
        }
    }

    sections
}

fn trace_section(
    runner: &dyn CommandRunner,
    config: &VitalsConfig,
    snapshot: Option<&ProcessSnapshot>,
    out_dir: &Path,
) -> SectionReport {
    // Prefer a pool worker over the master; the master mostly sleeps.
    let worker = snapshot.and_then(|s| {
        s.workers
            .iter()
            .find(|w| !w.command.contains("master process"))
            .or_else(|| s.workers.first())
    });
    let Some(worker) = worker else {
        return SectionReport::skipped("trace", "no worker process to attach to");
    };

    match capture_trace(runner, worker.pid, &config.trace, out_dir) {
        Ok(capture) => SectionReport::ok(
            "trace",
            vec![
                SectionItem::new("pid", worker.pid.to_string()),
                SectionItem::new(
                    "transcript",
                    format!("{} ({} bytes)", capture.transcript.display(), capture.bytes),
                ),
                SectionItem::new(
                    "bounded",
                    format!("{} s wall clock", config.trace.timeout_secs),
                ),
            ],
        ),
        Err(err) => degraded("trace", err),
    }
}

use std::io::IsTerminal;
use std::path::PathBuf;

use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, WrapErr};

use vitals_core::{OutputFormat, SectionStatus, VitalsConfig};
use vitals_logwin::{parse_duration, Window, DEFAULT_WINDOW_SECS};
use vitals_probe::{CommandRunner, SystemRunner};

mod report;

use report::{gather, DoctorReport};

#[derive(Parser)]
#[command(
    name = "vitals",
    version,
    about = "Web-stack health reports for deployment servers",
    long_about = "Vitals prints a one-shot health report of a PHP-FPM web stack and installs\n\
                   rollback-safety git hooks on deployment servers.\n\n\
                   The report is read-only and single-pass: worker processes, system memory,\n\
                   pool limits, Redis, MySQL, MongoDB, windowed nginx traffic, and a bounded\n\
                   syscall trace. Missing tools are skipped, never fatal.\n\n\
                   Examples:\n  \
                     vitals doctor                 Full report, prompts for the window\n  \
                     vitals doctor --window 5m     Analyze the last five minutes of traffic\n  \
                     vitals install-hooks          Install rollback-tag hooks into this repo\n  \
                     vitals init                   Create a default .vitals.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .vitals.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text  Colorized sections (default)\n  \
                         json  Machine-readable JSON with camelCase keys"
    )]
    format: OutputFormat,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Print the web-stack health report
    #[command(long_about = "Print the web-stack health report.\n\n\
        Must run as root. Traffic figures cover the trailing window; pass a\n\
        duration token (30, 5m, 2h, 1d) or answer the prompt. Invalid tokens\n\
        fall back to 600 seconds and the report says so.\n\n\
        Examples:\n  vitals doctor --window 15m\n  vitals doctor --log /var/log/nginx/api.log")]
    Doctor {
        /// Trailing window to analyze (e.g. 30, 5m, 2h, 1d)
        #[arg(long)]
        window: Option<String>,

        /// Access log(s) to analyze instead of the configured ones
        #[arg(long)]
        log: Vec<PathBuf>,
    },
    /// Install rollback-tag git hooks into a repository
    #[command(long_about = "Install rollback-tag git hooks into a repository.\n\n\
        Writes fixed post-merge and pre-push scripts that tag the repository\n\
        state around pull and push, so deployments can be rolled back to any\n\
        previous revision. Idempotent; fails outside a git repository.")]
    InstallHooks {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
    /// Create a default .vitals.toml configuration file
    #[command(long_about = "Create a default .vitals.toml in the current directory.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .vitals.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1m\x1b[33m⚕\x1b[0m \x1b[1mvitals\x1b[0m v{version} — web-stack health at a glance\n");

        println!("Quick start:");
        println!("  \x1b[36mvitals init\x1b[0m             Create a .vitals.toml config file");
        println!("  \x1b[36mvitals doctor\x1b[0m           Print the full health report (as root)");
        println!("  \x1b[36mvitals install-hooks\x1b[0m    Install rollback-tag git hooks\n");

        println!("All commands:");
        println!("  \x1b[32mdoctor\x1b[0m         Processes, memory, pool, Redis, MySQL, traffic, trace");
        println!("  \x1b[32minstall-hooks\x1b[0m  Auto-tag repository state around pull/push");
        println!("  \x1b[32minit\x1b[0m           Create default configuration\n");
    } else {
        println!("vitals v{version} — web-stack health at a glance\n");

        println!("Quick start:");
        println!("  vitals init             Create a .vitals.toml config file");
        println!("  vitals doctor           Print the full health report (as root)");
        println!("  vitals install-hooks    Install rollback-tag git hooks\n");

        println!("All commands:");
        println!("  doctor         Processes, memory, pool, Redis, MySQL, traffic, trace");
        println!("  install-hooks  Auto-tag repository state around pull/push");
        println!("  init           Create default configuration\n");
    }

    println!("Run 'vitals <command> --help' for details.");
}

const DEFAULT_CONFIG: &str = r#"# Vitals configuration
# All keys are optional; the values shown are the defaults.

[fpm]
# Substring that identifies worker processes in the process table
# process_marker = "php-fpm"
# Pool file the worker limits are read from
# pool_config = "/etc/php-fpm.d/www.conf"

[nginx]
# Access logs to analyze; each gets its own report section
# access_logs = ["/var/log/nginx/access.log"]
# Request-target substring that counts a line as "matched"
# marker = "/index.php"
# Only the trailing segment of each log is scanned
# tail_lines = 50000

[trace]
# Seconds to let strace run before it is killed
# timeout_secs = 10
# Transcript file written to the working directory
# transcript = "vitals-trace.txt"
"#;

/// Hard precondition: the probes (strace especially) need root.
///
/// Checked through the probe runner so the report logic never has to think
/// about privileges again.
fn require_root(runner: &dyn CommandRunner) -> Result<()> {
    let output = runner
        .run("id", &["-u"], None)
        .map_err(|e| miette::miette!("cannot determine effective uid: {e}"))?;
    let euid = output.stdout.trim().to_string();
    if euid != "0" {
        miette::bail!("vitals doctor must run as root (current euid: {euid})");
    }
    Ok(())
}

/// One interactive prompt for the window token. `None` means blank input
/// or a non-interactive stdin; both take the default silently.
fn prompt_window() -> Option<String> {
    use std::io::Write;

    print!("analysis window [{DEFAULT_WINDOW_SECS}s]: ");
    std::io::stdout().flush().ok()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line).ok()?;
    let token = line.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn status_symbol(status: SectionStatus, use_color: bool) -> String {
    match (status, use_color) {
        (SectionStatus::Ok, true) => "\x1b[32m\u{2713}\x1b[0m".into(),
        (SectionStatus::Ok, false) => "\u{2713}".into(),
        (SectionStatus::Warn, true) => "\x1b[33m!\x1b[0m".into(),
        (SectionStatus::Warn, false) => "!".into(),
        (SectionStatus::Skipped, true) => "\x1b[2m~\x1b[0m".into(),
        (SectionStatus::Skipped, false) => "~".into(),
    }
}

fn render_text(report: &DoctorReport, use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");
    println!("vitals v{version} — Web Stack Health Report\n");

    if report.window_fell_back {
        println!(
            "window: {} s (invalid duration token, default substituted)\n",
            report.window_secs
        );
    } else {
        println!("window: {} s\n", report.window_secs);
    }

    for section in &report.sections {
        let sym = status_symbol(section.status, use_color);
        match &section.note {
            Some(note) => println!("  {sym} {:<28} {note}", section.name),
            None => println!("  {sym} {}", section.name),
        }
        for item in &section.items {
            println!("      {:<24} {}", item.label, item.value);
        }
    }

    let ok = count_status(report, SectionStatus::Ok);
    let warn = count_status(report, SectionStatus::Warn);
    let skipped = count_status(report, SectionStatus::Skipped);
    println!("\n{ok} sections ok, {warn} warnings, {skipped} skipped");
}

fn count_status(report: &DoctorReport, status: SectionStatus) -> usize {
    report
        .sections
        .iter()
        .filter(|s| s.status == status)
        .count()
}

fn run_doctor(
    config: &VitalsConfig,
    window_flag: Option<String>,
    logs: Vec<PathBuf>,
    format: OutputFormat,
    use_color: bool,
) -> Result<bool> {
    let runner = SystemRunner;

    // Privilege is the one hard precondition; nothing runs before it.
    require_root(&runner)?;

    let token = window_flag.or_else(|| {
        std::io::stdin()
            .is_terminal()
            .then(prompt_window)
            .flatten()
    });
    let (seconds, fell_back) = match token {
        Some(token) => {
            let parsed = parse_duration(&token);
            (parsed.seconds, parsed.fell_back)
        }
        None => (DEFAULT_WINDOW_SECS, false),
    };

    let window = Window::trailing(Utc::now(), seconds)?;

    let mut config = config.clone();
    if !logs.is_empty() {
        config.nginx.access_logs = logs;
    }

    let out_dir = std::env::current_dir().into_diagnostic()?;
    let report = gather(&runner, &config, &window, fell_back, &out_dir);

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).into_diagnostic()?
            );
        }
        OutputFormat::Text => render_text(&report, use_color),
    }

    Ok(report.workers_found)
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => VitalsConfig::from_file(path)
            .wrap_err_with(|| format!("loading {}", path.display()))?,
        None => {
            let default_path = std::path::Path::new(".vitals.toml");
            if default_path.exists() {
                VitalsConfig::from_file(default_path)?
            } else {
                VitalsConfig::default()
            }
        }
    };

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    match cli.command {
        None => print_welcome(use_color),
        Some(Command::Doctor { window, log }) => {
            let workers_found = run_doctor(&config, window, log, cli.format, use_color)?;
            if !workers_found {
                // Report already printed; an empty worker pool is an unmet
                // precondition per the exit-code contract.
                std::process::exit(1);
            }
        }
        Some(Command::InstallHooks { repo }) => {
            let hooks = vitals_githooks::install_hooks(&repo)?;
            println!("Installed rollback-tag hooks:");
            println!("  {}", hooks.post_merge.display());
            println!("  {}", hooks.pre_push.display());
        }
        Some(Command::Init) => {
            let path = std::path::Path::new(".vitals.toml");
            if path.exists() {
                miette::bail!(".vitals.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .vitals.toml with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "vitals", &mut std::io::stdout());
        }
    }

    Ok(())
}

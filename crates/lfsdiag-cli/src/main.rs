//! lfsdiag - diagnostic capture and crash reporting CLI
//!
//! Every line this program prints goes through [`Diagnostics`], so a fatal
//! error can write a panic log carrying the full transcript of the run.
//!
//! ## Commands
//!
//! - `version`: Print the version descriptor
//! - `env`: Print version, git version, log locations and the environment
//! - `logs`: List panic logs (`last`, `show`, `clear`, `boom` subcommands)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use lfsdiag_core::{
    clear_logs, last_log, list_logs, read_log, require_in_repo, DiagConfig, Diagnostics,
    LogEntry, WrappedError,
};

#[derive(Parser)]
#[command(name = "lfsdiag")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Diagnostic capture and panic logs for command-line tools", long_about = None)]
struct Cli {
    /// Escalate every error to a panic log and print debug lines
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit JSON-formatted debug lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Directory panic logs are written to (default: <git-dir>/lfs/logs)
    #[arg(long, global = true, env = "LFSDIAG_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the version descriptor
    Version,

    /// Show version, log locations and the environment
    Env,

    /// Inspect panic logs (lists them when no action is given)
    Logs {
        #[command(subcommand)]
        action: Option<LogsAction>,

        /// Emit the listing as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum LogsAction {
    /// Print the most recent panic log
    Last,

    /// Print a panic log by name
    Show {
        /// Log name, with or without the .log extension
        name: String,
    },

    /// Delete every panic log
    Clear,

    /// Raise a fatal error to exercise the panic log path
    Boom,
}

fn main() {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let explicit_log_dir = cli.log_dir.is_some();
    let mut config = DiagConfig::from_env(&cwd);
    config.debugging |= cli.debug;
    if let Some(dir) = cli.log_dir {
        config.log_dir = dir;
    }

    let diag = Diagnostics::new(config);
    let level = if diag.debugging() {
        Level::DEBUG
    } else if diag.config().log_stats {
        Level::INFO
    } else {
        Level::WARN
    };
    lfsdiag_core::init_tracing(cli.json_logs, level, diag.error_sink());
    diag.debug(format_args!("log dir: {}", diag.log_dir().display()));

    if matches!(cli.command, Commands::Logs { .. }) && !explicit_log_dir {
        require_in_repo(&diag, &cwd);
    }

    if let Err(err) = run(&diag, cli.command) {
        diag.exit_with_error(&err);
    }

    diag.flush_stats();
    diag.cleanup();
}

fn run(diag: &Diagnostics, command: Commands) -> Result<()> {
    match command {
        Commands::Version => cmd_version(diag),
        Commands::Env => cmd_env(diag),
        Commands::Logs { action, json } => match action {
            None => cmd_logs_list(diag, json),
            Some(LogsAction::Last) => cmd_logs_last(diag),
            Some(LogsAction::Show { name }) => cmd_logs_show(diag, &name),
            Some(LogsAction::Clear) => cmd_logs_clear(diag),
            Some(LogsAction::Boom) => cmd_logs_boom(diag),
        },
    }
}

/// Print the version descriptor
fn cmd_version(diag: &Diagnostics) -> Result<()> {
    diag.print(diag.host().version_desc());
    Ok(())
}

/// Print everything a panic log header would record, plus log locations
fn cmd_env(diag: &Diagnostics) -> Result<()> {
    let host = diag.host();
    diag.print(host.version_desc());
    match host.vcs_version() {
        Ok(version) => diag.print(version),
        Err(e) => diag.print(format_args!("Error getting git version: {e}")),
    }
    diag.print("");
    diag.print(format_args!("LocalLogDir={}", diag.log_dir().display()));
    diag.print(format_args!(
        "LocalTempDir={}",
        diag.config().tmp_dir.display()
    ));
    diag.print(format_args!("Debugging={}", diag.debugging()));
    for var in host.environ() {
        diag.print(var);
    }
    Ok(())
}

fn cmd_logs_list(diag: &Diagnostics, json: bool) -> Result<()> {
    let logs = list_logs(diag.log_dir())
        .with_context(|| format!("Failed to list logs in {}", diag.log_dir().display()))?;

    if json {
        let out = serde_json::to_string_pretty(&logs).context("Failed to serialize log list")?;
        diag.print(out);
    } else {
        for line in render_log_list(&logs) {
            diag.print(line);
        }
    }
    Ok(())
}

fn cmd_logs_last(diag: &Diagnostics) -> Result<()> {
    let entry = last_log(diag.log_dir()).context("Failed to find the last log")?;
    let body = read_log(diag.log_dir(), &entry.name)
        .with_context(|| format!("Failed to read log {}", entry.name))?;
    diag.print(body.trim_end());
    Ok(())
}

fn cmd_logs_show(diag: &Diagnostics, name: &str) -> Result<()> {
    let body =
        read_log(diag.log_dir(), name).with_context(|| format!("Failed to read log {name}"))?;
    diag.print(body.trim_end());
    Ok(())
}

fn cmd_logs_clear(diag: &Diagnostics) -> Result<()> {
    let removed = clear_logs(diag.log_dir())
        .with_context(|| format!("Failed to clear logs in {}", diag.log_dir().display()))?;
    diag.print(format_args!(
        "Cleared {removed} log{} in {}",
        if removed == 1 { "" } else { "s" },
        diag.log_dir().display()
    ));
    Ok(())
}

fn cmd_logs_boom(diag: &Diagnostics) -> Result<()> {
    diag.print("Raising a sample fatal error");
    Err(WrappedError::new("Sample panic message")
        .fatal()
        .with_context("command", "logs boom")
        .into())
}

/// One line per log: `<name>  (<size> bytes)`.
fn render_log_list(logs: &[LogEntry]) -> Vec<String> {
    logs.iter()
        .map(|log| format!("{}  ({} bytes)", log.name, log.size))
        .collect()
}

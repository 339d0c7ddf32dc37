use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hdl_copilot::project::types::Severity;
use hdl_copilot::project::Project;

#[derive(Debug, Parser)]
#[command(
    name = "hdl-copilot",
    version,
    about = "Language server for Verilog/SystemVerilog projects",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the language server over stdio
    Lsp {
        /// Log file; defaults to hdl-copilot-<pid>.log in the temp dir
        #[arg(long, value_name = "FILE")]
        log_file: Option<PathBuf>,
    },
    /// Compile a project once and print its diagnostics
    Check {
        #[arg(value_name = "DIR", default_value = ".")]
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Lsp { log_file } => {
            if let Err(err) = init_file_logging(log_file) {
                eprintln!("failed to set up logging: {err}");
            }
            install_signal_handlers();
            if let Err(err) = hdl_copilot::lsp::serve_stdio() {
                eprintln!("LSP server failed: {err}");
                std::process::exit(1);
            }
        }
        Commands::Check { path } => {
            init_stderr_logging();
            check_project(&path);
        }
    }
}

/// Stdout carries the protocol, so the server logs to a file.
fn init_file_logging(log_file: Option<PathBuf>) -> io::Result<()> {
    let path = log_file.unwrap_or_else(|| {
        std::env::temp_dir().join(format!("hdl-copilot-{}.log", std::process::id()))
    });
    let file = std::fs::File::create(&path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    info!(version = env!("CARGO_PKG_VERSION"), "starting hdl-copilot");
    Ok(())
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();
}

fn check_project(path: &PathBuf) {
    let mut project = match Project::create(path) {
        Ok(project) => project,
        Err(err) => {
            eprintln!("failed to open project at {}: {err}", path.display());
            std::process::exit(1);
        }
    };
    let diagnostics = project.find_diagnostics();
    let mut errors = 0usize;
    for diag in &diagnostics {
        let severity = match diag.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Information => "info",
            Severity::Hint => "hint",
            Severity::None => continue,
        };
        if diag.severity == Severity::Error {
            errors += 1;
        }
        println!(
            "{}:{}:{}: {severity}: {} [{}]",
            diag.path.display(),
            diag.range.start.line + 1,
            diag.range.start.character + 1,
            diag.message,
            diag.name
        );
    }
    println!("{} diagnostics, {errors} errors", diagnostics.len());
    if errors > 0 {
        std::process::exit(1);
    }
}

#[cfg(unix)]
fn install_signal_handlers() {
    use signal_hook::consts::{SIGPIPE, SIGTERM};
    use signal_hook::iterator::Signals;

    match Signals::new([SIGTERM, SIGPIPE]) {
        Ok(mut signals) => {
            std::thread::spawn(move || {
                for signal in signals.forever() {
                    tracing::error!(signal, "received fatal signal");
                    std::process::exit(1);
                }
            });
        }
        Err(err) => tracing::warn!(%err, "failed to install signal handlers"),
    }
}

#[cfg(not(unix))]
fn install_signal_handlers() {}

//! jobsh CLI entry point.
//!
//! Usage:
//!   jobsh                      # Interactive shell (or read lines from stdin)
//!   jobsh -c <command>         # Execute one line and exit

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        None => {
            let code = jobsh_repl::run()?;
            Ok(exit_code(code))
        }

        Some("--help" | "-h") => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }

        Some("--version" | "-V") => {
            println!("jobsh {} ({} {})",
                     env!("CARGO_PKG_VERSION"),
                     env!("JOBSH_GIT_HASH"),
                     env!("JOBSH_BUILD_DATE"));
            Ok(ExitCode::SUCCESS)
        }

        Some("-c") => {
            let cmd = args.get(2)
                .context("-c requires a command argument")?;
            let code = jobsh_repl::run_command(cmd)?;
            Ok(exit_code(code))
        }

        Some(unknown) => {
            eprintln!("Unknown option: {unknown}");
            eprintln!("Run 'jobsh --help' for usage.");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from((code & 0xff) as u8)
}

fn print_help() {
    println!(r#"jobsh v{}

Usage:
  jobsh                        Interactive shell
  jobsh -c <command>           Execute one line and exit

Options:
  -c <command>                 Execute command line and exit
  -h, --help                   Show this help
  -V, --version                Show version

Syntax:
  cmd args...                  Run a program (searched in $JOBSH_BIN_DIR, then PATH)
  a | b | c                    Pipeline
  cmd < in > out               Redirect input / output (>> appends)
  cmd &                        Run in background

Builtins:
  cd [dir | -]                 Change directory
  jobs                         List jobs
  fg [N | %N]                  Resume a job in the foreground
  bg [N | %N]                  Resume a stopped job in the background
  exit [code]                  Leave the shell

Environment:
  JOBSH_BIN_DIR                Directory searched before PATH
  RUST_LOG                     Log filter for diagnostics on stderr
"#, env!("CARGO_PKG_VERSION"));
}

//! `code-analyze` — lint a JavaScript/TypeScript tree with a fixed ESLint setup.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load run settings ([`config::load_config`]).
//! 3. Make sure the ESLint packages are installed ([`bootstrap`]).
//! 4. Discover source files ([`discovery::discover`]).
//! 5. Lint them through a bounded worker pool ([`dispatcher`], [`engine`]).
//! 6. Render the requested report ([`report`]).
//! 7. Exit `0` once the run completes (findings do not change the exit code),
//!    `1` on usage/bootstrap/discovery errors, `130` when interrupted.
//!
//! A first Ctrl-C stops new files from starting and lets in-flight ones
//! finish; a second abandons those too. Either way the partial report is
//! printed.

mod bootstrap;
mod cli;
mod config;
mod discovery;
mod dispatcher;
mod engine;
mod errors;
mod models;
mod report;
mod run;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use bootstrap::{NpmEnvironment, PackageEnvironment};
use cli::{Cli, ReportFormat};
use config::{load_config, Settings};
use dispatcher::{DispatchOptions, StopSignal};
use engine::eslint::EslintEngine;
use errors::UsageError;
use run::{RunOutcome, RunPlan};

const EXIT_FAILURE: u8 = 1;
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    init_tracing(cli.verbose, !cli.no_color);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            for line in error_lines(&e) {
                eprintln!("{line}");
            }
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn init_tracing(verbose: u8, ansi: bool) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(std::io::stderr)
        .init();
}

/// What a failed run prints to stderr.
fn error_lines(e: &anyhow::Error) -> Vec<String> {
    match e.downcast_ref::<UsageError>() {
        Some(usage) => vec![
            usage.to_string().red().to_string(),
            "Usage: code-analyze <directory-path>".blue().to_string(),
        ],
        None => vec![format!("{} {:#}", "Error during code analysis:".red(), e)],
    }
}

/// CLI flags override the settings file; zero is rejected either way.
fn dispatch_options(cli: &Cli, settings: &Settings) -> Result<DispatchOptions, UsageError> {
    let concurrency = cli.concurrency.unwrap_or(settings.analysis.concurrency);
    if concurrency == 0 {
        return Err(UsageError::ZeroConcurrency);
    }
    let timeout_secs = cli.timeout.unwrap_or(settings.analysis.timeout_secs);
    if timeout_secs == 0 {
        return Err(UsageError::ZeroTimeout);
    }
    Ok(DispatchOptions {
        concurrency,
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn exit_code(outcome: &RunOutcome, stop: StopSignal) -> u8 {
    match outcome {
        RunOutcome::NoFilesFound => 0,
        RunOutcome::Completed(_) if stop != StopSignal::Run => EXIT_INTERRUPTED,
        RunOutcome::Completed(_) => 0,
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let path = cli.path.clone().ok_or(UsageError::MissingPath)?;

    // Resolve project path
    let path = path.canonicalize().unwrap_or(path);

    let settings = load_config(&path, cli.config.as_deref())?;
    let dispatch = dispatch_options(&cli, &settings)?;

    // JSON output keeps stderr free of status lines as well.
    let quiet = cli.quiet || cli.format == ReportFormat::Json;

    let plan = RunPlan {
        root: path,
        extensions: settings.analysis.extensions.clone(),
        exclude: settings.analysis.exclude.clone(),
        packages: settings.dependencies.packages.clone(),
        dispatch,
        quiet,
    };
    tracing::debug!(?plan, "starting run");

    let engine = EslintEngine::new(&settings.engine)?;
    let npm = NpmEnvironment::new(settings.engine.env_root.clone());
    let env: Option<&dyn PackageEnvironment> = if cli.skip_install { None } else { Some(&npm) };

    let (stop_tx, stop_rx) = watch::channel(StopSignal::Run);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!(
            "{}",
            report::terminal::warn(
                "Interrupted; finishing files in progress (Ctrl-C again to abandon them)..."
            )
        );
        let _ = stop_tx.send(StopSignal::Drain);

        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", report::terminal::warn("Abandoning files in progress..."));
            let _ = stop_tx.send(StopSignal::Abort);
        }
    });

    let outcome = run::execute(&plan, env, &engine, stop_rx.clone()).await;
    interrupt.abort();
    let outcome = outcome?;

    match (&outcome, cli.format) {
        (RunOutcome::NoFilesFound, ReportFormat::Terminal) => println!(
            "{}",
            report::terminal::warn("No JavaScript or TypeScript files found.")
        ),
        (RunOutcome::NoFilesFound, ReportFormat::Json) => {
            println!("{}", report::json::format_report(&[])?.0)
        }
        (RunOutcome::Completed(results), ReportFormat::Terminal) => {
            report::terminal::render(results, cli.quiet);
        }
        (RunOutcome::Completed(results), ReportFormat::Json) => {
            println!("{}", report::json::format_report(results)?.0);
        }
    }

    let stop = *stop_rx.borrow();
    Ok(exit_code(&outcome, stop))
}

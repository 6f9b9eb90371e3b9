#![forbid(unsafe_code)]

mod cli;

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use simharness::config::{self, HarnessConfig};
use simharness::error::HarnessError;
use simharness::harness::{self, RunRequest};
use simharness::{logging, output, riscof};

fn main() -> Result<()> {
    let cli = cli::parse_args()?;
    logging::init(cli.verbose, cli.quiet_mode);

    // Set up interrupt handling: tests not yet started are skipped, running ones finish
    let interrupted = Arc::new(AtomicBool::new(false));
    let _ = signal_hook::flag::register(signal_hook::consts::SIGINT, interrupted.clone());
    let _ = signal_hook::flag::register(signal_hook::consts::SIGTERM, interrupted.clone());

    let config_path = config::locate_config(cli.config_path.as_deref());
    if let Some(path) = &config_path {
        log::info!("using config file {}", path.display());
    }
    let mut config = HarnessConfig::load(config_path.as_deref(), cli.preset.as_deref(), cli.layer)
        .context("Failed to load configuration")?;
    cli.overrides.apply(&mut config)?;

    let request = RunRequest {
        release: cli.release,
        skip_build: cli.no_build,
        echo_build: !cli.quiet_mode && !cli.json_output,
        echo_smoke: !cli.quiet_mode && !cli.json_output,
        show_progress: !cli.quiet_mode,
        interrupted,
    };

    match cli.mode {
        cli::Mode::Run => run_mode(&config, &request, cli.json_output),
        cli::Mode::Riscof => riscof_mode(&config, &request),
    }
}

fn run_mode(config: &HarnessConfig, request: &RunRequest, json_output: bool) -> Result<()> {
    // JSON keeps stdout for the report alone
    let result = if json_output {
        harness::run(config, request, &mut io::stderr())
    } else {
        harness::run(config, request, &mut io::stdout())
    };

    let report = match result {
        Ok(report) => report,
        Err(err) => return Err(report_gate_failure(err, json_output)),
    };

    let mut stdout = io::stdout().lock();
    if json_output {
        output::format_json(&report, &mut stdout)?;
    } else {
        output::format_human(&report, config.report_paths, &mut stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn riscof_mode(config: &HarnessConfig, request: &RunRequest) -> Result<()> {
    match riscof::run(config, request, &mut io::stdout()) {
        Ok(_) => Ok(()),
        Err(err) => Err(report_gate_failure(err, false)),
    }
}

/// Print the failure banner and captured output, then hand the error back for the exit status
fn report_gate_failure(err: HarnessError, to_stderr: bool) -> anyhow::Error {
    let printed = if to_stderr {
        output::format_gate_failure(&err, &mut io::stderr())
    } else {
        output::format_gate_failure(&err, &mut io::stdout())
    };
    if let Err(print_err) = printed {
        log::warn!("could not print failure output: {}", print_err);
    }
    err.into()
}

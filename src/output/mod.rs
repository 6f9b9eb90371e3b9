//! Output formatting module
//!
//! Handles:
//! - Human-readable run report (one line per test, sorted by return code)
//! - Smoke-test dump with the full simulator output
//! - JSON report for scripting
//! - Gate failure banners (build, RISCOF)

use anyhow::Result;
use std::io::Write;

use crate::error::HarnessError;
use crate::models::{ExecutionResult, Outcome, PathStyle, RunReport};

pub mod progress;

/// Write the human-readable report. The smoke test is not repeated here; it
/// was printed with [`format_smoke`] as soon as it finished.
pub fn format_human<W: Write>(report: &RunReport, style: PathStyle, out: &mut W) -> Result<()> {
    for result in &report.results {
        writeln!(out, "{}", result_line(result, style))?;
    }
    if !report.results.is_empty() {
        writeln!(out)?;
    }

    let summary = &report.summary;
    writeln!(out, "Run Summary:")?;
    writeln!(
        out,
        "  {} tests run, {} passed, {} failed",
        summary.dispatched, summary.passed, summary.failed
    )?;
    if summary.not_run > 0 {
        writeln!(out, "  Not run: {} tests", summary.not_run)?;
    }

    let duration_sec = summary.duration_ms as f64 / 1000.0;
    if duration_sec < 1.0 {
        writeln!(out, "  Duration: {}ms", summary.duration_ms)?;
    } else {
        writeln!(out, "  Duration: {:.2}s", duration_sec)?;
    }

    if let Some(true) = summary.interrupted {
        writeln!(out, "  Status: Interrupted by user")?;
    }

    // repeat failures last so they are what is left on screen
    let mut failures = report.results.failures().peekable();
    if failures.peek().is_some() {
        writeln!(out, "\nFailures:")?;
        for result in failures {
            writeln!(out, "  {}", result_line(result, style))?;
        }
    }

    Ok(())
}

/// Write one result with its complete output
pub fn format_smoke<W: Write + ?Sized>(
    result: &ExecutionResult,
    style: PathStyle,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "Smoke test: {}", result.test.display_name(style))?;
    writeln!(out, "Return Code: {}", result.exit_code)?;
    writeln!(out, "Output:")?;
    write!(out, "{}", result.combined_output)?;
    if !result.combined_output.is_empty() && !result.combined_output.ends_with('\n') {
        writeln!(out)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Write the report as pretty JSON
pub fn format_json<W: Write>(report: &RunReport, out: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

/// Banner plus captured output for a failed gate. Errors that carry no
/// captured output write nothing.
pub fn format_gate_failure<W: Write>(err: &HarnessError, out: &mut W) -> Result<()> {
    let title = match err {
        HarnessError::BuildFailed { .. } => "Build".to_string(),
        HarnessError::GateFailed { name, .. } => name.clone(),
        _ => return Ok(()),
    };

    writeln!(out, "{} Failed!", title)?;
    if let Some(output) = err.captured_output() {
        writeln!(out, "Output:")?;
        write!(out, "{}", output)?;
        if !output.is_empty() && !output.ends_with('\n') {
            writeln!(out)?;
        }
    }
    Ok(())
}

fn result_line(result: &ExecutionResult, style: PathStyle) -> String {
    let name = result.test.display_name(style);
    match &result.outcome {
        Outcome::CrashOrTimeout { reason } => {
            format!("{}, ret_code: {} ({})", name, result.exit_code, reason)
        }
        _ => format!("{}, ret_code: {}", name, result.exit_code),
    }
}

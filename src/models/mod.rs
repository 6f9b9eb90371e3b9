//! Data models module
//!
//! Defines core data structures:
//! - TestCase: one test program path
//! - CommandSpec / ExecutionSpec: structured program + argument lists
//! - Outcome / ExecutionResult: what a single run produced
//! - ResultSet: results ordered for triage
//! - RunSummary / RunReport: aggregated run statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{DISPATCH_FAILURE_EXIT_CODE, TEST_FILE_FLAG};

#[cfg(test)]
mod tests;

/// A single test program to run against the simulator
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestCase {
    path: PathBuf,
}

impl TestCase {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name shown in the report, either the full path or just the file name
    pub fn display_name(&self, style: PathStyle) -> String {
        match style {
            PathStyle::Full => self.path.display().to_string(),
            PathStyle::Basename => self
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string()),
        }
    }
}

/// How test identities are printed by the reporter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStyle {
    #[default]
    Full,
    Basename,
}

/// A program plus its argument list. No shell is involved in running it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory for the child; inherits ours when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            workdir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Space-joined rendering for logs and diagnostics
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Simulator invocation template: `<program> <args..> <flags..> -f <test>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSpec {
    #[serde(flatten)]
    pub base: CommandSpec,
    /// Mode flags passed through untouched (`--clk=N`, `--tohost-check`, `-d`, `--am`)
    #[serde(default)]
    pub flags: Vec<String>,
}

impl ExecutionSpec {
    pub fn new(base: CommandSpec, flags: Vec<String>) -> Self {
        Self { base, flags }
    }

    /// Build the concrete command for one test program
    pub fn command_for(&self, test: &TestCase) -> CommandSpec {
        let mut command = self.base.clone();
        command.args.extend(self.flags.iter().cloned());
        command.args.push(TEST_FILE_FLAG.to_string());
        command.args.push(test.path().to_string_lossy().into_owned());
        command
    }
}

/// Categorised result of one simulator run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail { code: i32 },
    CrashOrTimeout { reason: String },
}

impl Outcome {
    pub fn from_exit_code(code: i32) -> Self {
        if code == 0 {
            Outcome::Pass
        } else {
            Outcome::Fail { code }
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }
}

/// Outcome record for one dispatched test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub test: TestCase,
    pub exit_code: i32,
    /// Interleaved stdout and stderr in arrival order
    pub combined_output: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Degraded result for a test whose process could not be started
    pub fn dispatch_failure(test: TestCase, error: &std::io::Error) -> Self {
        let reason = format!("failed to dispatch: {}", error);
        Self {
            test,
            exit_code: DISPATCH_FAILURE_EXIT_CODE,
            combined_output: format!("{}\n", reason),
            outcome: Outcome::CrashOrTimeout { reason },
            duration_ms: 0,
        }
    }
}

/// Results ordered by ascending exit code. Equal codes keep the order they
/// were given in, so callers pass results in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    results: Vec<ExecutionResult>,
}

impl ResultSet {
    pub fn new(mut results: Vec<ExecutionResult>) -> Self {
        // sort_by_key is stable
        results.sort_by_key(|result| result.exit_code);
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExecutionResult> {
        self.results.iter()
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_pass()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.results.iter().filter(|r| !r.outcome.is_pass())
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ExecutionResult;
    type IntoIter = std::slice::Iter<'a, ExecutionResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Summary statistics for a harness run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Tests that were handed to a worker
    pub dispatched: usize,
    pub passed: usize,
    pub failed: usize,
    /// Tests resolved but never started because the run was interrupted
    pub not_run: usize,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupted: Option<bool>,
}

/// Complete output of one harness run, also the JSON report shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoke: Option<ExecutionResult>,
    pub results: ResultSet,
    pub summary: RunSummary,
}

//! Harness entry point
//!
//! Resolve the corpus, pass the build gate, run everything, and hand back a
//! report. Nothing here prints the report itself; `status` only receives the
//! progress banners a person watches while the run is going.

use std::io::Write;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use log::{info, warn};

use crate::build;
use crate::config::HarnessConfig;
use crate::corpus::{self, CorpusQuery};
use crate::error::{HarnessError, Result};
use crate::exec::ExecOptions;
use crate::models::{ResultSet, RunReport, RunSummary, TestCase};
use crate::output::{self, progress::TestProgress};
use crate::runner::{self, RunOptions};

/// Per-invocation switches that are not part of the run's configuration
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Run the release configure step before building
    pub release: bool,
    pub skip_build: bool,
    /// Stream build output while it runs
    pub echo_build: bool,
    /// Stream the smoke test's output while it runs
    pub echo_smoke: bool,
    pub show_progress: bool,
    pub interrupted: Arc<AtomicBool>,
}

/// Run the whole harness once.
///
/// Fails only on configuration problems or a failed build gate; test
/// failures are part of the returned report.
pub fn run(
    config: &HarnessConfig,
    request: &RunRequest,
    status: &mut dyn Write,
) -> Result<RunReport> {
    let started_at = Utc::now();
    let start = Instant::now();

    let cases = resolve_corpus(config)?;
    info!("resolved {} tests under {}", cases.len(), config.root.display());
    status_line(status, &format!("Total Test Count: {}", cases.len()));

    if request.skip_build {
        info!("build gate skipped");
    } else if let Some(spec) = &config.build {
        build::build_simulator(spec, request.release, request.echo_build)?;
        status_line(status, "Build Success!");
    }

    let smoke = config.smoke_path().map(|path| {
        info!("running smoke test {}", path.display());
        let options = ExecOptions {
            echo: request.echo_smoke,
            timeout: config.timeout(),
        };
        let result = runner::run_test(&TestCase::new(path), &config.simulator, &options);
        // printed before dispatch; the final report does not repeat it
        if let Err(err) = output::format_smoke(&result, config.report_paths, &mut *status)
            .and_then(|_| status.flush().map_err(Into::into))
        {
            warn!("could not write smoke test output: {}", err);
        }
        result
    });

    let options = RunOptions {
        jobs: config.jobs,
        timeout: config.timeout(),
        interrupted: Arc::clone(&request.interrupted),
    };
    let mut progress = TestProgress::new(cases.len(), request.show_progress);
    let outcome = runner::run_tests(&cases, &config.simulator, &options, |result| {
        progress.record(result)
    })?;
    progress.finish();

    let results = ResultSet::new(outcome.results);
    let passed = results.passed();
    let summary = RunSummary {
        dispatched: results.len(),
        passed,
        failed: results.len() - passed,
        not_run: outcome.not_run,
        duration_ms: start.elapsed().as_millis() as u64,
        interrupted: outcome.interrupted.then_some(true),
    };

    Ok(RunReport {
        started_at,
        smoke,
        results,
        summary,
    })
}

/// Expand the configured patterns into test cases
pub fn resolve_corpus(config: &HarnessConfig) -> Result<Vec<TestCase>> {
    let has_relative = config
        .patterns
        .iter()
        .any(|pattern| !Path::new(pattern).is_absolute());
    if has_relative && !config.root.is_dir() {
        return Err(HarnessError::Config(format!(
            "test root does not exist or is not a directory: {}",
            config.root.display()
        )));
    }

    corpus::resolve(&CorpusQuery {
        root: &config.root,
        patterns: &config.patterns,
        skip: &config.skip,
        excluded_suffixes: &config.excluded_suffixes,
    })
}

fn status_line(status: &mut dyn Write, line: &str) {
    if let Err(err) = writeln!(status, "{}", line).and_then(|_| status.flush()) {
        warn!("could not write status line: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuildSpec, Preset};
    use crate::models::{CommandSpec, ExecutionSpec, Outcome};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const FAKE_SIM: &str = r#"
while [ $# -gt 0 ]; do
    if [ "$1" = "-f" ]; then shift; file="$1"; fi
    shift
done
exit "$(cat "$file")"
"#;

    fn setup(
        tests: &[(&str, &str)],
        build_script: Option<&str>,
    ) -> (TempDir, HarnessConfig) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("isa");
        fs::create_dir(&root).unwrap();
        for (name, content) in tests {
            fs::write(root.join(name), content).unwrap();
        }
        let script = dir.path().join("sim.sh");
        fs::write(&script, FAKE_SIM).unwrap();

        let config = HarnessConfig {
            root,
            patterns: vec!["rv64ui-p*".to_string(), "rv64um-p*".to_string()],
            skip: Vec::new(),
            simulator: ExecutionSpec::new(
                CommandSpec::new("sh").arg(script.to_string_lossy()),
                vec!["--tohost-check".to_string()],
            ),
            build: build_script.map(|body| BuildSpec {
                command: CommandSpec::new("sh").args(["-c", body]),
                release_configure: None,
            }),
            smoke: None,
            jobs: 2,
            ..Preset::Isa.config()
        };
        (dir, config)
    }

    #[test]
    fn test_full_run_sorted_and_complete() {
        let (_dir, config) = setup(
            &[
                ("rv64ui-p-add", "1"),
                ("rv64ui-p-sub", "0"),
                ("rv64um-p-mul", "2"),
                ("rv64ui-p-add.dump", "9"),
            ],
            Some("exit 0"),
        );
        let mut status = Vec::new();
        let report = run(&config, &RunRequest::default(), &mut status).unwrap();

        let codes: Vec<i32> = report.results.iter().map(|r| r.exit_code).collect();
        assert_eq!(codes, vec![0, 1, 2]);
        assert_eq!(report.summary.dispatched, 3);
        assert_eq!(report.summary.passed, 1);
        assert_eq!(report.summary.failed, 2);
        assert!(report.summary.interrupted.is_none());

        let status = String::from_utf8(status).unwrap();
        assert!(status.contains("Total Test Count: 3"));
        assert!(status.contains("Build Success!"));
    }

    #[test]
    fn test_build_failure_dispatches_nothing() {
        let (dir, mut config) = setup(&[("rv64ui-p-add", "0")], None);
        let marker = dir.path().join("ran");
        config.simulator = ExecutionSpec::new(
            CommandSpec::new("touch").arg(marker.to_string_lossy()),
            Vec::new(),
        );
        config.build = Some(BuildSpec {
            command: CommandSpec::new("sh").args(["-c", "echo link error 1>&2; exit 1"]),
            release_configure: None,
        });

        let err = run(&config, &RunRequest::default(), &mut Vec::new()).unwrap_err();
        match err {
            HarnessError::BuildFailed { code, ref output } => {
                assert_eq!(code, 1);
                assert!(output.contains("link error"));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(!marker.exists());
    }

    #[test]
    fn test_skip_build_bypasses_gate() {
        let (_dir, config) = setup(&[("rv64ui-p-add", "0")], Some("exit 1"));
        let request = RunRequest {
            skip_build: true,
            ..Default::default()
        };
        let report = run(&config, &request, &mut Vec::new()).unwrap();
        assert_eq!(report.summary.dispatched, 1);
    }

    #[test]
    fn test_zero_tests_is_not_an_error() {
        let (_dir, config) = setup(&[], None);
        let report = run(&config, &RunRequest::default(), &mut Vec::new()).unwrap();
        assert!(report.results.is_empty());
        assert_eq!(report.summary.dispatched, 0);
    }

    #[test]
    fn test_smoke_test_runs_separately() {
        let (_dir, mut config) = setup(&[("rv64ui-p-add", "0"), ("smoke.bin", "3")], None);
        config.smoke = Some(PathBuf::from("smoke.bin"));

        let mut status = Vec::new();
        let report = run(&config, &RunRequest::default(), &mut status).unwrap();
        let smoke = report.smoke.unwrap();
        assert_eq!(smoke.exit_code, 3);
        assert_eq!(smoke.outcome, Outcome::Fail { code: 3 });
        assert_eq!(report.summary.dispatched, 1);

        let status = String::from_utf8(status).unwrap();
        assert!(status.contains("Smoke test: "));
        assert!(status.contains("Return Code: 3"));
    }

    #[test]
    fn test_missing_root_is_config_error() {
        let (_dir, mut config) = setup(&[], None);
        config.root = PathBuf::from("/definitely/not/here");
        let err = run(&config, &RunRequest::default(), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }
}

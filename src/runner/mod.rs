//! Concurrent test dispatch
//!
//! One job per test case on a rayon pool. Workers block on their simulator
//! child and send the finished result down a channel; the calling thread is
//! the only place results are collected, so no locking is needed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use log::{debug, warn};
use rayon::ThreadPoolBuilder;

use crate::error::Result;
use crate::exec::{self, ExecOptions};
use crate::models::{ExecutionResult, ExecutionSpec, TestCase};

/// Knobs for a batch run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Worker threads; 0 lets rayon pick the available parallelism
    pub jobs: usize,
    pub timeout: Option<Duration>,
    /// Once set, jobs that have not started yet are skipped
    pub interrupted: Arc<AtomicBool>,
}

/// What a batch run produced
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// One entry per dispatched test, in the order the tests were given
    pub results: Vec<ExecutionResult>,
    /// Tests never started because of an interrupt
    pub not_run: usize,
    pub interrupted: bool,
}

/// Run every test case against the simulator and wait for all of them.
///
/// `on_complete` sees each result as it finishes, in completion order.
pub fn run_tests<F>(
    cases: &[TestCase],
    spec: &ExecutionSpec,
    options: &RunOptions,
    mut on_complete: F,
) -> Result<RunOutcome>
where
    F: FnMut(&ExecutionResult),
{
    if cases.is_empty() {
        return Ok(RunOutcome::default());
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(options.jobs)
        .thread_name(|index| format!("simharness-worker-{}", index))
        .build()?;
    debug!("dispatching {} tests on {} workers", cases.len(), pool.current_num_threads());

    let spec = Arc::new(spec.clone());
    let (sender, receiver) = mpsc::channel();

    for (index, case) in cases.iter().cloned().enumerate() {
        let sender = sender.clone();
        let spec = Arc::clone(&spec);
        let interrupted = Arc::clone(&options.interrupted);
        let exec_options = ExecOptions {
            echo: false,
            timeout: options.timeout,
        };

        pool.spawn(move || {
            let result = if interrupted.load(Ordering::Relaxed) {
                None
            } else {
                Some(run_test(&case, &spec, &exec_options))
            };
            // receiver outlives every job; a failed send means the aggregator is gone anyway
            let _ = sender.send((index, result));
        });
    }
    // the receive loop ends once every job has dropped its sender
    drop(sender);

    let mut slots: Vec<Option<ExecutionResult>> = vec![None; cases.len()];
    let mut not_run = 0;
    for (index, result) in receiver {
        match result {
            Some(result) => {
                on_complete(&result);
                slots[index] = Some(result);
            }
            None => not_run += 1,
        }
    }

    Ok(RunOutcome {
        results: slots.into_iter().flatten().collect(),
        not_run,
        interrupted: options.interrupted.load(Ordering::Relaxed),
    })
}

/// Run a single test case. Spawn failures become a degraded result.
pub fn run_test(case: &TestCase, spec: &ExecutionSpec, options: &ExecOptions) -> ExecutionResult {
    let command = spec.command_for(case);
    match exec::execute(&command, options) {
        Ok(output) => {
            debug!("{} finished with {}", case.path().display(), output.return_code);
            ExecutionResult {
                test: case.clone(),
                exit_code: output.return_code,
                outcome: output.outcome(),
                duration_ms: output.duration.as_millis() as u64,
                combined_output: output.combined_output,
            }
        }
        Err(err) => {
            warn!("could not dispatch {}: {}", case.path().display(), err);
            ExecutionResult::dispatch_failure(case.clone(), &err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DISPATCH_FAILURE_EXIT_CODE;
    use crate::models::{CommandSpec, Outcome, ResultSet};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Fake simulator: exits with the number stored in the `-f` file and
    /// echoes its arguments
    const FAKE_SIM: &str = r#"
file=""
while [ $# -gt 0 ]; do
    if [ "$1" = "-f" ]; then
        shift
        file="$1"
    fi
    shift
done
echo "args ok for $file"
exit "$(cat "$file")"
"#;

    fn fake_simulator(dir: &Path, flags: &[&str]) -> ExecutionSpec {
        let script = dir.join("fake-sim.sh");
        fs::write(&script, FAKE_SIM).unwrap();
        ExecutionSpec::new(
            CommandSpec::new("sh").arg(script.to_string_lossy()),
            flags.iter().map(|f| f.to_string()).collect(),
        )
    }

    fn test_files(dir: &TempDir, codes: &[i32]) -> Vec<TestCase> {
        codes
            .iter()
            .enumerate()
            .map(|(index, code)| {
                let path = dir.path().join(format!("test-{:03}", index));
                fs::write(&path, code.to_string()).unwrap();
                TestCase::new(path)
            })
            .collect()
    }

    #[test]
    fn test_example_scenario_reports_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let spec = fake_simulator(dir.path(), &[]);
        let cases = test_files(&dir, &[1, 0, 2]);

        let outcome = run_tests(&cases, &spec, &RunOptions::default(), |_| {}).unwrap();
        let discovery_codes: Vec<i32> = outcome.results.iter().map(|r| r.exit_code).collect();
        assert_eq!(discovery_codes, vec![1, 0, 2]);

        let sorted = ResultSet::new(outcome.results);
        let codes: Vec<i32> = sorted.iter().map(|r| r.exit_code).collect();
        assert_eq!(codes, vec![0, 1, 2]);
    }

    #[test]
    fn test_every_dispatched_test_produces_one_result() {
        let dir = tempfile::tempdir().unwrap();
        let spec = fake_simulator(dir.path(), &[]);
        let codes: Vec<i32> = (0..40).map(|i| i % 3).collect();
        let cases = test_files(&dir, &codes);

        let mut completed = 0;
        let options = RunOptions {
            jobs: 4,
            ..Default::default()
        };
        let outcome = run_tests(&cases, &spec, &options, |_| completed += 1).unwrap();

        assert_eq!(outcome.results.len(), cases.len());
        assert_eq!(completed, cases.len());
        assert_eq!(outcome.not_run, 0);
        for (case, result) in cases.iter().zip(&outcome.results) {
            assert_eq!(&result.test, case);
        }
    }

    #[test]
    fn test_flags_are_passed_through() {
        let dir = tempfile::tempdir().unwrap();
        let spec = fake_simulator(dir.path(), &["--clk=3000000", "--tohost-check"]);
        let cases = test_files(&dir, &[0]);

        let outcome = run_tests(&cases, &spec, &RunOptions::default(), |_| {}).unwrap();
        let result = &outcome.results[0];
        assert_eq!(result.outcome, Outcome::Pass);
        assert!(result.combined_output.contains("args ok for"));
    }

    #[test]
    fn test_failures_do_not_short_circuit() {
        let dir = tempfile::tempdir().unwrap();
        let spec = fake_simulator(dir.path(), &[]);
        let cases = test_files(&dir, &[7, 7, 7, 0]);

        let outcome = run_tests(&cases, &spec, &RunOptions::default(), |_| {}).unwrap();
        assert_eq!(outcome.results.len(), 4);
        assert_eq!(
            outcome.results.iter().filter(|r| r.outcome == Outcome::Fail { code: 7 }).count(),
            3
        );
    }

    #[test]
    fn test_spawn_failure_becomes_degraded_result() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ExecutionSpec::new(CommandSpec::new("/no/such/simulator"), Vec::new());
        let cases = test_files(&dir, &[0, 0]);

        let outcome = run_tests(&cases, &spec, &RunOptions::default(), |_| {}).unwrap();
        assert_eq!(outcome.results.len(), 2);
        for result in &outcome.results {
            assert_eq!(result.exit_code, DISPATCH_FAILURE_EXIT_CODE);
            assert!(matches!(result.outcome, Outcome::CrashOrTimeout { .. }));
            assert!(!result.combined_output.is_empty());
        }
    }

    #[test]
    fn test_no_cases_is_empty_outcome() {
        let spec = ExecutionSpec::new(CommandSpec::new("unused"), Vec::new());
        let outcome = run_tests(&[], &spec, &RunOptions::default(), |_| {}).unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.not_run, 0);
        assert!(!outcome.interrupted);
    }

    #[test]
    fn test_interrupt_before_dispatch_skips_everything() {
        let dir = tempfile::tempdir().unwrap();
        let spec = fake_simulator(dir.path(), &[]);
        let cases = test_files(&dir, &[0, 1, 2]);

        let options = RunOptions {
            interrupted: Arc::new(AtomicBool::new(true)),
            ..Default::default()
        };
        let outcome = run_tests(&cases, &spec, &options, |_| {}).unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.not_run, 3);
        assert!(outcome.interrupted);
    }
}

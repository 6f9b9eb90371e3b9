//! Progress indicator for test runs
//!
//! Rewrites a single stderr line as tests complete, then leaves a final
//! completion line behind.

use std::io::{self, Write};

use crate::models::ExecutionResult;

/// Progress indicator for a batch of dispatched tests
pub struct TestProgress {
    enabled: bool,
    total: usize,
    passed: usize,
    failed: usize,
    finished: bool,
}

impl TestProgress {
    /// Create a progress indicator; a disabled one prints nothing
    pub fn new(total: usize, enabled: bool) -> Self {
        Self {
            enabled,
            total,
            passed: 0,
            failed: 0,
            finished: false,
        }
    }

    pub fn completed(&self) -> usize {
        self.passed + self.failed
    }

    /// Count one finished test and redraw
    pub fn record(&mut self, result: &ExecutionResult) {
        if result.outcome.is_pass() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.update_progress();
    }

    fn update_progress(&self) {
        if !self.enabled {
            return;
        }

        eprint!(
            "\rCompleted {}/{} tests (passed: {}, failed: {})",
            self.completed(),
            self.total,
            self.passed,
            self.failed
        );
        io::stderr().flush().unwrap_or(());
    }

    /// Replace the progress line with a completion line
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        if !self.enabled || self.total == 0 {
            return;
        }

        eprint!("\r");
        eprintln!(
            "✓ Completed {}/{} tests (passed: {}, failed: {})",
            self.completed(),
            self.total,
            self.passed,
            self.failed
        );
        io::stderr().flush().unwrap_or(());
    }
}

impl Drop for TestProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

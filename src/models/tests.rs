//! Unit tests for data models module
//!
//! Covers command construction, outcome classification, result ordering
//! and the JSON shape of reports.

use super::*;

fn result(path: &str, code: i32) -> ExecutionResult {
    ExecutionResult {
        test: TestCase::new(path),
        exit_code: code,
        combined_output: String::new(),
        outcome: Outcome::from_exit_code(code),
        duration_ms: 0,
    }
}

#[test]
fn test_display_name_styles() {
    let case = TestCase::new("/opt/riscv-tests/isa/rv64ui-p-add");
    assert_eq!(case.display_name(PathStyle::Full), "/opt/riscv-tests/isa/rv64ui-p-add");
    assert_eq!(case.display_name(PathStyle::Basename), "rv64ui-p-add");
}

#[test]
fn test_command_for_places_flags_before_test_file() {
    let spec = ExecutionSpec::new(
        CommandSpec::new("xmake").args(["r", "Vtop"]),
        vec!["-d".to_string(), "--clk=3000000".to_string(), "--tohost-check".to_string()],
    );
    let command = spec.command_for(&TestCase::new("/tests/rv64ui-p-add"));

    assert_eq!(command.program, "xmake");
    assert_eq!(
        command.args,
        vec!["r", "Vtop", "-d", "--clk=3000000", "--tohost-check", "-f", "/tests/rv64ui-p-add"]
    );
    assert_eq!(
        command.display(),
        "xmake r Vtop -d --clk=3000000 --tohost-check -f /tests/rv64ui-p-add"
    );
}

#[test]
fn test_command_for_keeps_paths_with_spaces_as_one_argument() {
    let spec = ExecutionSpec::new(CommandSpec::new("sim"), Vec::new());
    let command = spec.command_for(&TestCase::new("/my tests/a b.bin"));
    assert_eq!(command.args, vec!["-f", "/my tests/a b.bin"]);
}

#[test]
fn test_outcome_from_exit_code() {
    assert_eq!(Outcome::from_exit_code(0), Outcome::Pass);
    assert_eq!(Outcome::from_exit_code(3), Outcome::Fail { code: 3 });
    assert!(!Outcome::from_exit_code(-1).is_pass());
}

#[test]
fn test_result_set_sorted_ascending() {
    let set = ResultSet::new(vec![result("a", 1), result("b", 0), result("c", 2)]);
    let codes: Vec<i32> = set.iter().map(|r| r.exit_code).collect();
    assert_eq!(codes, vec![0, 1, 2]);
}

#[test]
fn test_result_set_sort_is_stable() {
    let set = ResultSet::new(vec![
        result("first-fail", 1),
        result("first-pass", 0),
        result("second-fail", 1),
        result("second-pass", 0),
        result("third-fail", 1),
    ]);
    let names: Vec<String> = set
        .iter()
        .map(|r| r.test.display_name(PathStyle::Full))
        .collect();
    assert_eq!(
        names,
        vec!["first-pass", "second-pass", "first-fail", "second-fail", "third-fail"]
    );
}

#[test]
fn test_result_set_counts() {
    let set = ResultSet::new(vec![result("a", 0), result("b", 4), result("c", 0)]);
    assert_eq!(set.len(), 3);
    assert_eq!(set.passed(), 2);
    assert_eq!(set.failures().count(), 1);
    assert!(ResultSet::default().is_empty());
}

#[test]
fn test_dispatch_failure_is_degraded_result() {
    let err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
    let degraded = ExecutionResult::dispatch_failure(TestCase::new("/gone"), &err);

    assert_eq!(degraded.exit_code, crate::constants::DISPATCH_FAILURE_EXIT_CODE);
    assert!(degraded.combined_output.contains("no such file"));
    assert!(matches!(degraded.outcome, Outcome::CrashOrTimeout { .. }));
}

#[test]
fn test_outcome_json_is_tagged() {
    let json = serde_json::to_value(Outcome::Fail { code: 2 }).unwrap();
    assert_eq!(json["kind"], "fail");
    assert_eq!(json["code"], 2);

    let json = serde_json::to_value(Outcome::Pass).unwrap();
    assert_eq!(json["kind"], "pass");
}

#[test]
fn test_summary_interrupted_omitted_when_none() {
    let summary = RunSummary {
        dispatched: 2,
        passed: 2,
        failed: 0,
        not_run: 0,
        duration_ms: 10,
        interrupted: None,
    };
    let json = serde_json::to_string(&summary).unwrap();
    assert!(!json.contains("interrupted"));

    let summary = RunSummary { interrupted: Some(true), ..summary };
    let json = serde_json::to_string(&summary).unwrap();
    assert!(json.contains("\"interrupted\":true"));
}

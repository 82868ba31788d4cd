//! End-to-end tests: run the `caseprobe` binary and inspect its stdout report

use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn caseprobe(args: &[&str]) -> Output {
    caseprobe_with_env(args, &[])
}

fn caseprobe_with_env(args: &[&str], vars: &[(&str, &str)]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_caseprobe"));
    command
        .args(args)
        .env("RUST_LOG", "warn")
        .env_remove("CASEPROBE_TRIM_OUTPUT")
        .env_remove("CASEPROBE_REALTIME_PRECISION")
        .env_remove("CASEPROBE_SOLUTION_STACK_MB");
    for (name, value) in vars {
        command.env(name, value);
    }
    command.output().expect("failed to spawn caseprobe")
}

fn write_cases(dir: &Path, content: &str) -> String {
    let path = dir.join("cases.json");
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

fn parse_report(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "caseprobe failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is a JSON report")
}

fn keys(report: &Value) -> Vec<String> {
    report.as_object().unwrap().keys().cloned().collect()
}

#[test]
fn sum_reports_result_and_measurements() {
    let dir = tempfile::tempdir().unwrap();
    let cases = write_cases(dir.path(), r#"{"tc1": {"input": {"a": 2, "b": 3}}}"#);

    let output = caseprobe(&["solutions/sum.rs", cases.as_str()]);
    let report = parse_report(&output);

    let tc1 = &report["tc1"];
    assert_eq!(tc1["result"], 5);
    assert_eq!(tc1["stderr"], Value::Null);
    assert_eq!(tc1["stdout"], "");
    assert!(tc1["utime"].as_u64().is_some());
    assert!(tc1["stime"].as_u64().is_some());
    assert!(tc1["realtime"].as_f64().unwrap() >= 0.0);
    assert!(tc1["max_memory"].as_u64().unwrap() > 0);

    let fields: Vec<_> = tc1.as_object().unwrap().keys().cloned().collect();
    assert_eq!(
        fields,
        vec!["result", "utime", "stime", "realtime", "max_memory", "stdout", "stderr"]
    );
}

#[test]
fn report_is_pretty_printed_with_two_space_indent() {
    let dir = tempfile::tempdir().unwrap();
    let cases = write_cases(dir.path(), r#"{"tc1": {"input": {"a": 1}}}"#);

    let output = caseprobe(&["sum", cases.as_str()]);
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(stdout.starts_with("{\n  \"tc1\": {\n    \"result\": 1,"));
    assert!(stdout.ends_with("}\n"));
}

#[test]
fn recognized_failure_is_reported_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let cases = write_cases(dir.path(), r#"{"tc2": {"input": {"a": 1, "b": 0}}}"#);

    let report = parse_report(&caseprobe(&["divide.py", cases.as_str()]));

    assert_eq!(report["tc2"]["result"], Value::Null);
    assert_eq!(report["tc2"]["stderr"], "division by zero");
}

#[test]
fn solution_output_is_captured_per_case() {
    let dir = tempfile::tempdir().unwrap();
    let cases = write_cases(
        dir.path(),
        r#"{"first": {"input": {"s": "hello", "n": 2}}, "second": {"input": {}}}"#,
    );

    let output = caseprobe(&["echo", cases.as_str()]);
    let report = parse_report(&output);

    assert_eq!(report["first"]["stdout"], "hello\n2\n");
    assert_eq!(report["first"]["result"], 2);
    assert_eq!(report["second"]["stdout"], "");
    assert_eq!(report["second"]["result"], 0);
}

#[test]
fn panic_keeps_partial_output_and_reports_unknown_error() {
    let dir = tempfile::tempdir().unwrap();
    let cases = write_cases(
        dir.path(),
        r#"{"bad": {"input": {"items": [1], "at": 4}}, "good": {"input": {"items": [7, 8], "at": 1}}}"#,
    );

    let report = parse_report(&caseprobe(&["lookup", cases.as_str()]));

    assert_eq!(report["bad"]["result"], Value::Null);
    assert_eq!(report["bad"]["stderr"], "Unknown error occurred");
    assert_eq!(report["bad"]["stdout"], "looking up position 4 of 1\n");
    assert_eq!(report["good"]["result"], 8);
    assert_eq!(report["good"]["stderr"], Value::Null);
}

#[test]
fn output_before_recognized_failure_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let cases = write_cases(
        dir.path(),
        r#"{"bad": {"input": {"text": "4x"}}, "good": {"input": {"text": "17"}}}"#,
    );

    let report = parse_report(&caseprobe(&["parse", cases.as_str()]));

    assert_eq!(report["bad"]["result"], Value::Null);
    assert_eq!(report["bad"]["stdout"], "parsing \"4x\"\n");
    assert_eq!(
        report["bad"]["stderr"],
        "cannot parse \"4x\": invalid digit found in string"
    );
    assert_eq!(report["good"]["result"], 17);
    assert_eq!(report["good"]["stdout"], "parsing \"17\"\n");
}

#[test]
fn deep_recursion_does_not_abort_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let cases = write_cases(
        dir.path(),
        r#"{"ok": {"input": [3]}, "deep": {"input": [1000000]}}"#,
    );

    let report = parse_report(&caseprobe(&["triangle", cases.as_str()]));

    assert_eq!(report["ok"]["result"], 6);
    assert_eq!(report["deep"]["result"], 500_000_500_000u64);
    assert_eq!(report["deep"]["stderr"], Value::Null);
}

#[test]
fn case_without_input_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let cases = write_cases(
        dir.path(),
        r#"{"tc1": {"input": {"a": 1}}, "tc2": {"expected": 4}, "tc3": {"input": {"a": 3}}}"#,
    );

    let output = caseprobe(&["sum", cases.as_str()]);
    let report = parse_report(&output);

    assert_eq!(keys(&report), vec!["tc1", "tc3"]);
    assert!(String::from_utf8_lossy(&output.stderr).contains("tc2"));
}

#[test]
fn skip_diagnostic_survives_silenced_logging() {
    let dir = tempfile::tempdir().unwrap();
    let cases = write_cases(
        dir.path(),
        r#"{"tc1": {"input": {"a": 1}}, "tc2": {"expected": 4}}"#,
    );

    let output = caseprobe_with_env(&["sum", cases.as_str()], &[("RUST_LOG", "off")]);
    let report = parse_report(&output);

    assert_eq!(keys(&report), vec!["tc1"]);
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("Test case tc2 does not contain 'input' field"));
}

#[test]
fn keys_follow_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let cases = write_cases(
        dir.path(),
        r#"{"zeta": {"input": {"a": 1}}, "alpha": {"input": {"a": 2}}, "mid": {"input": {"a": 3}}}"#,
    );

    let report = parse_report(&caseprobe(&["sum", cases.as_str()]));

    assert_eq!(keys(&report), vec!["zeta", "alpha", "mid"]);
}

#[test]
fn repeated_runs_agree_apart_from_measurements() {
    let dir = tempfile::tempdir().unwrap();
    let cases = write_cases(
        dir.path(),
        r#"{"a": {"input": {"x": 6, "y": 3}}, "b": {"input": {"x": 6, "y": 0}}}"#,
    );

    let strip = |mut report: Value| {
        for case in report.as_object_mut().unwrap().values_mut() {
            let fields = case.as_object_mut().unwrap();
            for measured in ["utime", "stime", "realtime", "max_memory"] {
                fields.remove(measured);
            }
        }
        report
    };

    let first = strip(parse_report(&caseprobe(&["divide", cases.as_str()])));
    let second = strip(parse_report(&caseprobe(&["divide", cases.as_str()])));

    assert_eq!(first, second);
}

#[test]
fn empty_document_gives_empty_report() {
    let dir = tempfile::tempdir().unwrap();
    let cases = write_cases(dir.path(), "{}");

    let report = parse_report(&caseprobe(&["sum", cases.as_str()]));

    assert_eq!(report, serde_json::json!({}));
}

#[test]
fn trim_output_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let cases = write_cases(dir.path(), r#"{"tc": {"input": ["spaced"]}}"#);

    let output = caseprobe_with_env(&["echo", cases.as_str()], &[("CASEPROBE_TRIM_OUTPUT", "true")]);
    let report = parse_report(&output);

    assert_eq!(report["tc"]["stdout"], "spaced");
}

#[test]
fn realtime_precision_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let cases = write_cases(dir.path(), r#"{"tc": {"input": {"a": 1}}}"#);
    let config = dir.path().join("caseprobe.json");
    fs::write(&config, r#"{"realtime_precision": 0}"#).unwrap();

    let report = parse_report(&caseprobe(&[
        "sum",
        cases.as_str(),
        "--config",
        config.to_str().unwrap(),
    ]));

    let realtime = report["tc"]["realtime"].as_f64().unwrap();
    assert_eq!(realtime, realtime.round());
}

#[test]
fn missing_arguments_exit_with_usage_error() {
    let output = caseprobe(&["sum"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn help_exits_successfully() {
    let output = caseprobe(&["--help"]);

    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn unopenable_testcase_file_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.json");

    let output = caseprobe(&["sum", missing.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("Failed to open testcase file").count(), 1);
}

#[test]
fn malformed_testcase_file_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let cases = write_cases(dir.path(), "{ this is not json");

    let output = caseprobe(&["sum", cases.as_str()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn unknown_solution_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let cases = write_cases(dir.path(), r#"{"tc": {"input": {}}}"#);

    let output = caseprobe(&["solutions/nonexistent.rs", cases.as_str()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("divide"));
}

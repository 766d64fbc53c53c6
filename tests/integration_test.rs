use serde_json::Value;
use std::fs;
use std::process::{Command, Output};
use tempfile::tempdir;

fn calc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_calc"))
        .args(["--config", "/nonexistent/calc-kit.toml", "--no-color"])
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute calc")
}

#[test]
fn test_add_prints_sum() {
    let output = calc(&["add", "-1", "-2"]);
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout.contains("-1 + -2 = -3"), "stdout was: {}", stdout);
    assert!(stdout.contains("All operations succeeded."));
}

#[test]
fn test_divide_by_zero_exits_with_failure() {
    let output = calc(&["--json", "divide", "3", "0"]);
    let stdout = String::from_utf8(output.stdout).unwrap();
    let report: Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(report["failed"], 1);
    assert_eq!(report["evaluations"][0]["error"], "divide by zero");
    assert_eq!(report["evaluations"][0]["expression"], "3 / 0");
}

#[test]
fn test_sqrt_of_negative_is_rejected_by_default() {
    let output = calc(&["--json", "sqrt", "-4"]);
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(report["evaluations"][0]["error"], "square root of negative number: -4");
}

#[test]
fn test_sqrt_nan_policy_from_config_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("calc.toml");
    fs::write(&config_path, "[arithmetic]\nnegative_root = \"NaN\"\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_calc"))
        .args(["--config", config_path.to_str().unwrap(), "--json", "sqrt", "-4"])
        .output()
        .expect("Failed to execute calc");
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(report["evaluations"][0]["value"], "NaN");
}

#[test]
fn test_eval_infix_expression() {
    let output = calc(&["--json", "eval", "sqrt(9)"]);
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(report["evaluations"][0]["value"], 3.0);
}

#[test]
fn test_eval_unknown_operation_is_reported() {
    let output = calc(&["eval", "multiply", "2", "3"]);
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("Unknown operation: 'multiply 2 3'"));
}

#[test]
fn test_run_script_directory_as_xml() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("add.calc"),
        "# input1,input2,expected\nadd,-1,-2\nadd,0,2\nadd,-1,1\nadd,1,2\n",
    )
    .unwrap();
    fs::write(dir.path().join("divide.calc"), "divide 9 3\n3 / 0\n").unwrap();

    let output = calc(&["--xml", "run", dir.path().to_str().unwrap()]);
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.starts_with("<?xml"));
    assert!(stdout.contains("<total>6</total>"));
    assert!(stdout.contains("<failed>1</failed>"));
    assert!(stdout.contains("<error>divide by zero</error>"));
}

#[test]
fn test_run_missing_path_is_usage_error() {
    let output = calc(&["run", "/nonexistent/scripts.calc"]);
    let stderr = String::from_utf8(output.stderr).unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("error:"));
}

#[test]
fn test_non_numeric_operand_is_usage_error() {
    let output = calc(&["add", "one", "2"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_run_table_with_header_row_succeeds() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("two-column.calc");
    fs::write(&script, "input1,input2,expected\nadd,-1,-2\nadd,0,2\n").unwrap();

    let output = calc(&["--json", "run", script.to_str().unwrap()]);
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(report["total"], 2);
    assert_eq!(report["evaluations"][0]["line_number"], 2);
}

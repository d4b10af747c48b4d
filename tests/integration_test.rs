use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{anyhow, Result};
use serde_json::Value;
use tempfile::{tempdir, TempDir};

fn run(args: &[&str]) -> Result<Output> {
    let binary_path = env!("CARGO_BIN_EXE_fraud-explorer");

    Ok(Command::new(binary_path).args(args).output()?)
}

fn path_arg(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| anyhow!("temporary path is not valid UTF-8"))
}

fn clean_sample() -> Result<(TempDir, PathBuf)> {
    let directory = tempdir()?;
    let cleaned = directory.path().join("cleansed").join("transactions_clean.csv");
    let sample_path = Path::new("samples").join("raw_transactions.csv");

    let output = run(&["clean", "--input", path_arg(&sample_path)?, "--output", path_arg(&cleaned)?])?;

    assert!(output.status.success(), "clean failed: {}", String::from_utf8_lossy(&output.stderr));

    Ok((directory, cleaned))
}

fn decimal_text(value: &Value) -> String {
    value.to_string().trim_matches('"').to_string()
}

#[test]
fn test_cli_clean_reports_dropped_rows() -> Result<()> {
    let directory = tempdir()?;
    let cleaned = directory.path().join("clean.csv");
    let sample_path = Path::new("samples").join("raw_transactions.csv");

    let output = run(&["clean", "--input", path_arg(&sample_path)?, "--output", path_arg(&cleaned)?])?;

    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout)?;

    assert_eq!(report["rows_read"], 13);
    assert_eq!(report["duplicates_dropped"], 2);
    assert_eq!(report["missing_dropped"], 1);
    assert_eq!(report["unparsable_dropped"], 1);
    assert_eq!(report["rows_written"], 9);

    let content = std::fs::read_to_string(&cleaned)?;
    let mut lines = content.lines();

    assert_eq!(lines.next(), Some("trans_num,timestamp,amount,category,merchant,is_fraud"));
    assert_eq!(lines.next(), Some("a01,2020-06-21 12:14:25,30,grocery_pos,Kirlin and Sons,0"));
    assert_eq!(lines.count(), 8);

    Ok(())
}

#[test]
fn test_cli_clean_with_abort_policy_fails_without_output() -> Result<()> {
    let directory = tempdir()?;
    let cleaned = directory.path().join("clean.csv");
    let sample_path = Path::new("samples").join("raw_transactions.csv");

    let output = run(&[
        "clean",
        "--input", path_arg(&sample_path)?,
        "--output", path_arg(&cleaned)?,
        "--on-parse-error", "abort"
    ])?;

    assert!(!output.status.success());
    assert!(!cleaned.exists());

    Ok(())
}

#[test]
fn test_cli_summarize_filters_by_amount_and_category() -> Result<()> {
    let (_directory, cleaned) = clean_sample()?;

    let output = run(&[
        "summarize",
        "--data", path_arg(&cleaned)?,
        "--min-amount", "0",
        "--max-amount", "50",
        "--category", "grocery_pos"
    ])?;

    assert!(output.status.success());

    let summary: Value = serde_json::from_slice(&output.stdout)?;

    assert_eq!(summary["rejected"], Value::Null);
    assert_eq!(summary["count"], 2);
    assert_eq!(decimal_text(&summary["total_amount"]), "54.84");
    assert_eq!(summary["fraud_rate"], 0.5);
    assert_eq!(summary["by_category"][0]["category"], "grocery_pos");
    assert_eq!(summary["by_hour"].as_array().map(Vec::len), Some(24));

    Ok(())
}

#[test]
fn test_cli_summarize_reports_rejected_selection_as_empty_result() -> Result<()> {
    let (_directory, cleaned) = clean_sample()?;

    let output = run(&["summarize", "--data", path_arg(&cleaned)?, "--min-amount", "100", "--max-amount", "-5"])?;

    assert!(output.status.success());

    let summary: Value = serde_json::from_slice(&output.stdout)?;

    assert!(summary["rejected"].is_string());
    assert_eq!(summary["count"], 0);
    assert_eq!(summary["fraud_rate"], Value::Null);

    Ok(())
}

#[test]
fn test_cli_filter_writes_overnight_transactions_as_csv() -> Result<()> {
    let (_directory, cleaned) = clean_sample()?;

    let output = run(&["filter", "--data", path_arg(&cleaned)?, "--from", "22:00", "--to", "04:00"])?;

    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let ids: Vec<&str> = stdout.lines()
        .skip(1)
        .filter_map(|line| line.split(',').next())
        .collect();

    assert_eq!(ids, vec!["a04", "a06", "a07", "a11"]);

    Ok(())
}

#[test]
fn test_cli_inspect_reports_bounds_and_categories() -> Result<()> {
    let (_directory, cleaned) = clean_sample()?;

    let output = run(&["inspect", "--data", path_arg(&cleaned)?])?;

    assert!(output.status.success());

    let inspection: Value = serde_json::from_slice(&output.stdout)?;

    assert_eq!(inspection["rows"], 9);
    assert_eq!(decimal_text(&inspection["bounds"]["min_amount"]), "-12.5");
    assert_eq!(decimal_text(&inspection["bounds"]["max_amount"]), "843.91");
    assert_eq!(inspection["bounds"]["categories"].as_array().map(Vec::len), Some(5));
    assert_eq!(inspection["default_selection"]["categories"], "all");

    Ok(())
}

#[test]
fn test_cli_refuses_to_summarize_a_missing_dataset() -> Result<()> {
    let directory = tempdir()?;
    let missing = directory.path().join("absent.csv");

    let output = run(&["summarize", "--data", path_arg(&missing)?])?;

    assert!(!output.status.success());

    Ok(())
}

#[test]
fn test_cli_rejects_unreadable_selection_times() -> Result<()> {
    let (_directory, cleaned) = clean_sample()?;

    let output = run(&["filter", "--data", path_arg(&cleaned)?, "--from", "25:00"])?;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("out of range"));
    assert!(output.stdout.is_empty());

    Ok(())
}

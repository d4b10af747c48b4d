use super::{CleanError, CleaningEngine, CleaningReport, ParsePolicy};

use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

use crate::models::{DataError, TableFormat};
use crate::storage::{CsvStorage, Storage};

const HEADER: &str = "trans_num,timestamp,amount,category,is_fraud";

struct Workspace {
    _directory: TempDir,
    raw: PathBuf,
    cleaned: PathBuf
}

fn create_workspace(raw_content: &str) -> Result<Workspace> {
    let directory = tempdir()?;
    let raw = directory.path().join("raw.csv");
    let cleaned = directory.path().join("cleansed").join("clean.csv");
    fs::write(&raw, raw_content)?;

    Ok(Workspace {
        _directory: directory,
        raw,
        cleaned
    })
}

async fn clean(raw: &Path, cleaned: &Path, policy: ParsePolicy) -> Result<CleaningReport, CleanError> {
    clean_with_format(raw, cleaned, &TableFormat::default(), policy).await
}

async fn clean_with_format(raw: &Path, cleaned: &Path, format: &TableFormat, policy: ParsePolicy) -> Result<CleaningReport, CleanError> {
    let storage = CsvStorage::new(cleaned, format.clone());
    CleaningEngine::new(storage, format.clone(), policy).run(raw).await
}

fn write_raw_bytes(workspace: &Workspace) -> Result<()> {
    let mut raw_content = format!("{HEADER}\nt1,2020-06-21 12:14:25,30.5,grocery_pos,0\n").into_bytes();
    raw_content.extend_from_slice(b"t\xff2,2020-06-21 12:15:00,12,travel,0\n");
    raw_content.extend_from_slice(b"t3,2020-06-21 12:16:00,7.25,travel,1\n");
    raw_content.extend_from_slice(b"t4,2020-06-21 12:17:00,8,gro\xffcery,0\n");
    fs::write(&workspace.raw, raw_content)?;

    Ok(())
}

#[tokio::test]
async fn test_cleaner_drops_duplicates_and_missing_values() -> Result<()> {
    let raw_content = format!("{HEADER}\n\
        t1,2020-06-21 12:14:25,30.00,grocery_pos,0\n\
        t2,2020-06-21 12:14:33,100.00,grocery_pos,0\n\
        t1,2020-06-21 12:14:25,30.00,grocery_pos,0\n\
        t3,2020-06-21 12:15:17,,shopping_net,1\n\
        t4,2020-06-21 12:15:40,7.25,travel,1\n\
        t2,2020-06-21 12:14:33,100.00,grocery_pos,0\n");
    let workspace = create_workspace(&raw_content)?;

    let report = clean(&workspace.raw, &workspace.cleaned, ParsePolicy::Drop).await?;

    assert_eq!(report, CleaningReport {
        rows_read: 6,
        duplicates_dropped: 2,
        missing_dropped: 1,
        unparsable_dropped: 0,
        normalized_duplicates_dropped: 0,
        rows_written: 3
    });
    assert_eq!(report.rows_dropped(), 3);

    let table = CsvStorage::new(&workspace.cleaned, TableFormat::default()).load()?;
    let ids: Vec<&str> = table.records().iter().map(|record| record.passthrough[0].as_str()).collect();

    assert_eq!(ids, vec!["t1", "t2", "t4"]);

    Ok(())
}

#[tokio::test]
async fn test_cleaner_is_idempotent() -> Result<()> {
    let raw_content = format!("{HEADER}\n\
        t1,21/06/2020 12:14,30.50,grocery_pos,True\n\
        t2,2020-06-21T23:59:59,-12,food_dining,no\n\
        t3,2020-06-22 00:00:00.500,1e2,misc_net,0\n");
    let workspace = create_workspace(&raw_content)?;

    clean(&workspace.raw, &workspace.cleaned, ParsePolicy::Drop).await?;
    let first_pass = fs::read_to_string(&workspace.cleaned)?;

    let second_output = workspace.cleaned.with_file_name("clean_again.csv");
    let report = clean(&workspace.cleaned, &second_output, ParsePolicy::Abort).await?;
    let second_pass = fs::read_to_string(&second_output)?;

    assert_eq!(report.rows_dropped(), 0);
    assert_eq!(first_pass, second_pass);
    assert_eq!(first_pass, format!("{HEADER}\n\
        t1,2020-06-21 12:14:00,30.5,grocery_pos,1\n\
        t2,2020-06-21 23:59:59,-12,food_dining,0\n\
        t3,2020-06-22 00:00:00.500,100,misc_net,0\n"));

    Ok(())
}

#[tokio::test]
async fn test_cleaner_collapses_rows_equal_after_normalization() -> Result<()> {
    let raw_content = format!("{HEADER}\n\
        t1,2020-06-21 12:14:25,30.5,grocery_pos,0\n\
        t1,2020-06-21 12:14:25,30.50,grocery_pos,0\n");
    let workspace = create_workspace(&raw_content)?;

    let report = clean(&workspace.raw, &workspace.cleaned, ParsePolicy::Drop).await?;

    assert_eq!(report.duplicates_dropped, 0);
    assert_eq!(report.normalized_duplicates_dropped, 1);
    assert_eq!(report.rows_written, 1);

    Ok(())
}

#[tokio::test]
async fn test_cleaner_drop_policy_counts_unparsable_rows() -> Result<()> {
    let raw_content = format!("{HEADER}\n\
        t1,2020-06-21 12:14:25,30.5,grocery_pos,0\n\
        t2,last tuesday,12.0,travel,0\n\
        t3,2020-06-21 12:14:25,twelve,travel,0\n\
        t4,2020-06-21 12:14:25,12.0,travel,perhaps\n\
        t5,2020-06-21 12:14:25,12.0,travel,0,unexpected\n");
    let workspace = create_workspace(&raw_content)?;

    let report = clean(&workspace.raw, &workspace.cleaned, ParsePolicy::Drop).await?;

    assert_eq!(report.unparsable_dropped, 4);
    assert_eq!(report.rows_written, 1);

    Ok(())
}

#[tokio::test]
async fn test_cleaner_abort_policy_writes_nothing() -> Result<()> {
    let raw_content = format!("{HEADER}\n\
        t1,2020-06-21 12:14:25,30.5,grocery_pos,0\n\
        t2,2020-06-21 12:14:25,twelve,travel,0\n");
    let workspace = create_workspace(&raw_content)?;

    let result = clean(&workspace.raw, &workspace.cleaned, ParsePolicy::Abort).await;

    assert!(matches!(result, Err(CleanError::Data(DataError::Parse { line: 3, .. }))));
    assert!(!workspace.cleaned.exists());
    assert!(!workspace.cleaned.with_file_name("clean.csv.partial").exists());

    Ok(())
}

#[tokio::test]
async fn test_cleaner_abort_policy_still_drops_missing_values() -> Result<()> {
    let raw_content = format!("{HEADER}\n\
        t1,2020-06-21 12:14:25,30.5,grocery_pos,0\n\
        t2,2020-06-21 12:14:25,NA,travel,0\n");
    let workspace = create_workspace(&raw_content)?;

    let report = clean(&workspace.raw, &workspace.cleaned, ParsePolicy::Abort).await?;

    assert_eq!(report.missing_dropped, 1);
    assert_eq!(report.rows_written, 1);

    Ok(())
}

#[tokio::test]
async fn test_cleaner_fails_on_missing_required_column() -> Result<()> {
    let workspace = create_workspace("trans_num,timestamp,amount,is_fraud\nt1,2020-06-21 12:14:25,30.5,0\n")?;

    let result = clean(&workspace.raw, &workspace.cleaned, ParsePolicy::Drop).await;

    assert!(matches!(result, Err(CleanError::Data(DataError::MissingColumn { .. }))));
    assert!(!workspace.cleaned.exists());

    Ok(())
}

#[tokio::test]
async fn test_cleaner_fails_on_missing_input_file() -> Result<()> {
    let workspace = create_workspace(HEADER)?;

    let result = clean(&workspace.raw.with_file_name("absent.csv"), &workspace.cleaned, ParsePolicy::Drop).await;

    assert!(matches!(result, Err(CleanError::Data(DataError::Io(_)))));

    Ok(())
}

#[tokio::test]
async fn test_cleaner_handles_header_only_input() -> Result<()> {
    let workspace = create_workspace(&format!("{HEADER}\n"))?;

    let report = clean(&workspace.raw, &workspace.cleaned, ParsePolicy::Drop).await?;

    assert_eq!(report, CleaningReport::default());
    assert_eq!(fs::read_to_string(&workspace.cleaned)?, format!("{HEADER}\n"));

    Ok(())
}

#[tokio::test]
async fn test_cleaner_output_reloads_under_custom_timestamp_formats() -> Result<()> {
    let format = TableFormat {
        timestamp_formats: vec!["%d/%m/%Y %H:%M".to_string()],
        ..TableFormat::default()
    };
    let raw_content = format!("{HEADER}\n\
        t1,21/06/2020 12:14,30.50,grocery_pos,1\n\
        t2,22/06/2020 03:05,-12,travel,0\n\
        t3,2020-06-22 03:05,4,travel,0\n");
    let workspace = create_workspace(&raw_content)?;

    let report = clean_with_format(&workspace.raw, &workspace.cleaned, &format, ParsePolicy::Drop).await?;

    assert_eq!(report.unparsable_dropped, 1);
    assert_eq!(report.rows_written, 2);

    let table = CsvStorage::new(&workspace.cleaned, format.clone()).load()?;

    assert_eq!(table.len(), 2);

    let again = workspace.cleaned.with_file_name("again.csv");
    let second_report = clean_with_format(&workspace.cleaned, &again, &format, ParsePolicy::Abort).await?;

    assert_eq!(second_report.rows_dropped(), 0);
    assert_eq!(second_report.rows_written, 2);
    assert_eq!(fs::read_to_string(&workspace.cleaned)?, fs::read_to_string(&again)?);
    assert_eq!(fs::read_to_string(&again)?, format!("{HEADER}\n\
        t1,2020-06-21 12:14:00,30.5,grocery_pos,1\n\
        t2,2020-06-22 03:05:00,-12,travel,0\n"));

    Ok(())
}

#[tokio::test]
async fn test_cleaner_drops_rows_that_are_not_utf8() -> Result<()> {
    let workspace = create_workspace(HEADER)?;
    write_raw_bytes(&workspace)?;

    let report = clean(&workspace.raw, &workspace.cleaned, ParsePolicy::Drop).await?;

    assert_eq!(report.rows_read, 4);
    assert_eq!(report.unparsable_dropped, 2);
    assert_eq!(report.rows_written, 2);

    let table = CsvStorage::new(&workspace.cleaned, TableFormat::default()).load()?;
    let ids: Vec<&str> = table.records().iter().map(|record| record.passthrough[0].as_str()).collect();

    assert_eq!(ids, vec!["t1", "t3"]);

    Ok(())
}

#[tokio::test]
async fn test_cleaner_abort_policy_reports_the_first_row_that_is_not_utf8() -> Result<()> {
    let workspace = create_workspace(HEADER)?;
    write_raw_bytes(&workspace)?;

    let result = clean(&workspace.raw, &workspace.cleaned, ParsePolicy::Abort).await;

    assert!(matches!(
        result,
        Err(CleanError::Data(DataError::Parse { line: 3, ref column, expected: "UTF-8 text", .. })) if column == "trans_num"
    ));
    assert!(!workspace.cleaned.exists());

    Ok(())
}

#[tokio::test]
async fn test_cleaner_output_holds_invariants_for_random_raw_tables() -> Result<()> {
    let timestamps = ["2020-06-21 12:14:25", "2020-06-21 03:00:00", "21/06/2020 22:10", "", "soon", "2020-06-22T08:30:00"];
    let amounts = ["30.5", "30.50", "-4", "100", "", "NaN", "abc", "0.01", "1e1"];
    let categories = ["grocery_pos", "travel", "misc_net", "", "null"];
    let flags = ["0", "1", "true", "", "maybe"];

    let mut rng = StdRng::seed_from_u64(1724);

    for _ in 0..20 {
        let mut rows = Vec::new();

        for _ in 0..rng.gen_range(0..60) {
            let row = format!(
                "t{},{},{},{},{}",
                rng.gen_range(0..5),
                timestamps.choose(&mut rng).copied().unwrap_or_default(),
                amounts.choose(&mut rng).copied().unwrap_or_default(),
                categories.choose(&mut rng).copied().unwrap_or_default(),
                flags.choose(&mut rng).copied().unwrap_or_default()
            );

            if rng.gen_bool(0.2) {
                rows.push(row.clone());
            }

            rows.push(row);
        }

        let body: String = rows.iter().map(|row| format!("{row}\n")).collect();
        let workspace = create_workspace(&format!("{HEADER}\n{body}"))?;
        let report = clean(&workspace.raw, &workspace.cleaned, ParsePolicy::Drop).await?;

        assert_eq!(report.rows_read, rows.len() as u64);
        assert_eq!(report.rows_written + report.rows_dropped(), report.rows_read);

        //NOTE: Loading is strict, so a successful load proves there are no missing values or duplicates
        let table = CsvStorage::new(&workspace.cleaned, TableFormat::default()).load()?;
        assert_eq!(table.len() as u64, report.rows_written);

        let again = workspace.cleaned.with_file_name("again.csv");
        let second_report = clean(&workspace.cleaned, &again, ParsePolicy::Abort).await?;

        assert_eq!(second_report.rows_dropped(), 0);
        assert_eq!(fs::read_to_string(&workspace.cleaned)?, fs::read_to_string(&again)?);
    }

    Ok(())
}

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim, WriterBuilder};
use tracing::{debug, info, warn};

use crate::models::{record_line, DataError, Schema, TableFormat, Transaction, TransactionTable};
use crate::storage::Storage;

/// Flat-file storage for a cleaned transaction table.
pub struct CsvStorage {
    path: PathBuf,
    format: TableFormat
}

impl CsvStorage {
    pub fn new(path: impl Into<PathBuf>, format: TableFormat) -> Self {
        Self {
            path: path.into(),
            format
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn partial_path(&self) -> PathBuf {
        let mut file_name = self.path.file_name().map(OsString::from).unwrap_or_default();
        file_name.push(".partial");
        self.path.with_file_name(file_name)
    }

    fn write_partial(&self, partial: &Path, table: &TransactionTable) -> Result<(), DataError> {
        let file = File::create(partial)?;
        write_records(BufWriter::new(file), table.schema(), table.records().iter(), self.format.delimiter)
    }
}

impl Storage for CsvStorage {
    /// Loads and validates a cleaned table.
    ///
    /// A cleaned file is trusted only as far as it validates: any missing value,
    /// unparsable value or duplicate row fails the whole load.
    fn load(&self) -> Result<TransactionTable, DataError> {
        let file = File::open(&self.path)?;

        let mut reader = ReaderBuilder::new()
            .delimiter(self.format.delimiter)
            .trim(Trim::Headers)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let headers = reader.headers()?.clone();
        let schema = Schema::resolve(&headers, &self.format.columns)?;

        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for result in reader.records() {
            let record = result?;
            let line = record_line(&record);
            let transaction = Transaction::from_record(&record, line, &schema, &self.format.timestamp_formats)?;

            if !seen.insert(transaction.to_row(&schema)) {
                return Err(DataError::DuplicateRow { line });
            }

            records.push(transaction);
        }

        info!("Loaded {} transactions from {}", records.len(), self.path.display());

        Ok(TransactionTable::new(schema, records))
    }

    /// Writes the table next to its destination and renames it into place,
    /// so readers never observe a partially written file.
    fn save(&self, table: &TransactionTable) -> Result<(), DataError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let partial = self.partial_path();

        if let Err(error) = self.write_partial(&partial, table) {
            if let Err(cleanup_error) = fs::remove_file(&partial) {
                warn!("Could not remove partial file {}: {cleanup_error}", partial.display());
            }

            return Err(error);
        }

        fs::rename(&partial, &self.path)?;
        debug!("Wrote {} transactions to {}", table.len(), self.path.display());

        Ok(())
    }
}

/// Writes a header and the normalized rows of `records` to any writer.
pub fn write_records<'a, W, I>(writer: W, schema: &Schema, records: I, delimiter: u8) -> Result<(), DataError>
where
    W: Write,
    I: Iterator<Item = &'a Transaction>,
{
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    writer.write_record(schema.headers())?;

    for transaction in records {
        writer.write_record(transaction.to_row(schema))?;
    }

    writer.flush()?;

    Ok(())
}

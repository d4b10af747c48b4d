use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::{ByteRecord, Reader, ReaderBuilder, StringRecord, Trim};
use tokio::sync::mpsc;
use tokio::task::{spawn_blocking, JoinHandle};
use tracing::{debug, error, info};

use crate::cleaner::errors::CleanError;
use crate::cleaner::{CleaningReport, ParsePolicy};
use crate::models::{DataError, Schema, TableFormat, Transaction, TransactionTable};
use crate::storage::Storage;
use crate::types::LineNumber;

struct RawRow {
    line: LineNumber,
    record: ByteRecord
}

impl RawRow {
    /// Decodes the row as UTF-8. An undecodable field makes the row unparsable.
    fn decode(self, schema: &Schema) -> Result<StringRecord, DataError> {
        let line = self.line;

        StringRecord::from_byte_record(self.record).map_err(|error| {
            let field = error.utf8_error().field();
            let value = error.into_byte_record()
                .get(field)
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                .unwrap_or_default();

            DataError::parse(line, schema.header(field), &value, "UTF-8 text")
        })
    }
}

/// Turns a raw transaction export into a cleaned table.
///
/// A blocking reader task streams rows over a bounded channel and a single
/// consumer applies the cleaning steps in file order, so every run over the
/// same input produces the same table.
pub struct CleaningEngine<S: Storage> {
    storage: S,
    format: TableFormat,
    policy: ParsePolicy,
    backpressure: usize
}

impl<S: Storage> CleaningEngine<S> {
    /// Creates a new engine that writes its result through `storage`.
    pub fn new(storage: S, format: TableFormat, policy: ParsePolicy) -> Self {
        Self {
            storage,
            format,
            policy,
            backpressure: 256
        }
    }

    /// Cleans the raw file at `path` and saves the result.
    ///
    /// Nothing is saved unless the whole file was processed, so an aborted run
    /// leaves any previous cleaned file untouched.
    ///
    /// # Errors
    /// Returns `CleanError` if:
    /// - The raw file cannot be opened or read.
    /// - A required column is missing from the header.
    /// - A value cannot be parsed and the policy is `ParsePolicy::Abort`.
    /// - The cleaned table cannot be saved.
    pub async fn run(&self, path: &Path) -> Result<CleaningReport, CleanError> {
        let mut reader = self.open(path)?;
        let headers = reader.headers().map_err(DataError::from)?.clone();
        let schema = Schema::resolve(&headers, &self.format.columns)?;

        let (sender, receiver) = mpsc::channel::<RawRow>(self.backpressure);
        let csv_handle = Self::spawn_csv_reader(reader, sender);
        let processing_result = self.process_rows(&schema, receiver).await;

        //NOTE: The receiver is gone by now, so an aborted run also stops the reader
        let reader_result = csv_handle.await?;

        let (records, mut report) = processing_result?;
        reader_result?;

        report.rows_written = records.len() as u64;
        self.storage.save(&TransactionTable::new(schema, records))?;
        report.log();

        Ok(report)
    }

    fn open(&self, path: &Path) -> Result<Reader<BufReader<File>>, DataError> {
        let file = File::open(path)?;

        info!("Cleaning raw transactions from {}", path.display());

        Ok(ReaderBuilder::new()
            .delimiter(self.format.delimiter)
            .trim(Trim::Headers)
            .flexible(true)
            .from_reader(BufReader::new(file)))
    }

    fn spawn_csv_reader(mut reader: Reader<BufReader<File>>, sender: mpsc::Sender<RawRow>) -> JoinHandle<Result<(), DataError>> {
        spawn_blocking(move || {
            for result in reader.byte_records() {
                let record = match result {
                    Ok(record) => record,
                    Err(error) => {
                        error!("CSV read error: {error}");
                        return Err(error.into());
                    }
                };

                let row = RawRow {
                    line: record.position().map(|position| position.line()).unwrap_or_default(),
                    record
                };

                if sender.blocking_send(row).is_err() {
                    break;
                }
            }

            Ok(())
        })
    }

    async fn process_rows(&self, schema: &Schema, mut receiver: mpsc::Receiver<RawRow>) -> Result<(Vec<Transaction>, CleaningReport), DataError> {
        let mut report = CleaningReport::default();
        let mut seen_raw = HashSet::<Vec<Vec<u8>>>::new();
        let mut seen_normalized = HashSet::<Vec<String>>::new();
        let mut records = Vec::new();

        while let Some(row) = receiver.recv().await {
            report.rows_read += 1;

            let raw: Vec<Vec<u8>> = row.record.iter().map(<[u8]>::to_vec).collect();

            if !seen_raw.insert(raw) {
                debug!("Dropping duplicate row on line [{}]", row.line);
                report.duplicates_dropped += 1;
                continue;
            }

            let line = row.line;
            let parsed = row.decode(schema)
                .and_then(|record| Transaction::from_record(&record, line, schema, &self.format.timestamp_formats));

            match parsed {
                Ok(transaction) => {
                    if seen_normalized.insert(transaction.to_row(schema)) {
                        records.push(transaction);
                    } else {
                        debug!("Dropping row on line [{line}] that duplicates an earlier row once normalized");
                        report.normalized_duplicates_dropped += 1;
                    }
                }
                Err(error @ DataError::MissingValue { .. }) => {
                    debug!("Dropping row: {error}");
                    report.missing_dropped += 1;
                }
                Err(error) if error.is_unparsable_row() && self.policy == ParsePolicy::Drop => {
                    debug!("Dropping row: {error}");
                    report.unparsable_dropped += 1;
                }
                Err(error) => {
                    error!("Aborting cleaning run: {error}");
                    return Err(error);
                }
            }
        }

        Ok((records, report))
    }
}

mod csv_storage;

use crate::models::{DataError, TransactionTable};

pub use csv_storage::{write_records, CsvStorage};

pub trait Storage {
    fn load(&self) -> Result<TransactionTable, DataError>;
    fn save(&self, table: &TransactionTable) -> Result<(), DataError>;
}

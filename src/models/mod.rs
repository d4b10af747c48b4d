mod errors;
mod schema;
mod table;
mod transaction;

pub use errors::DataError;
pub use schema::{ColumnNames, Schema, TableFormat, DEFAULT_TIMESTAMP_FORMATS};
pub use table::TransactionTable;
pub use transaction::{record_line, Transaction};

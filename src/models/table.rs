use crate::models::{Schema, Transaction};

/// A cleaned transaction table: the schema it was read with and its validated records.
///
/// Tables are never mutated once built. Sessions and views only borrow from them.
#[derive(Debug, Clone)]
pub struct TransactionTable {
    schema: Schema,
    records: Vec<Transaction>
}

impl TransactionTable {
    pub fn new(schema: Schema, records: Vec<Transaction>) -> Self {
        Self { schema, records }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[Transaction] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

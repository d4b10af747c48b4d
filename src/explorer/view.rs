use crate::explorer::errors::SelectionError;
use crate::explorer::FilterSelection;
use crate::models::Transaction;

/// The records of a table that satisfy a selection, borrowed from the table.
#[derive(Debug, Clone, Default)]
pub struct FilteredView<'a> {
    records: Vec<&'a Transaction>
}

impl<'a> FilteredView<'a> {
    pub fn apply<I>(records: I, selection: &FilterSelection) -> Result<Self, SelectionError>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        selection.validate()?;

        Ok(Self {
            records: records.into_iter().filter(|transaction| selection.matches(transaction)).collect()
        })
    }

    pub fn records(&self) -> &[&'a Transaction] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

mod aggregate;
mod errors;
mod selection;
mod session;
mod view;

pub use aggregate::Summary;
pub use errors::SelectionError;
pub use selection::{AmountRange, CategorySelection, FilterSelection, TimeWindow};
pub use session::Session;
pub use view::FilteredView;

mod event;
mod summary;
mod transaction;

pub use event::TriggerEvent;
pub use summary::{AggregateResult, ReportWindow};
pub use transaction::TransactionRecord;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::models::AggregateResult;

mod memory;
mod postgres;
mod query;

pub use memory::MemoryRecordStore;
pub use postgres::PostgresRecordStore;
pub use query::{AggregationRequest, RecordLayout};

/// Connection or query failure. Never used to signal "no records".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unable to connect to the record store: {0}")]
    Connection(String),
    #[error("aggregation query failed: {0}")]
    Query(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Runs the aggregation. `Ok(None)` means the window holds no records.
    async fn aggregate(&self, request: &AggregationRequest) -> Result<Option<AggregateResult>, StoreError>;
}

#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, uri: &str) -> Result<Box<dyn RecordStore>, StoreError>;
}

/// Picks the backend from the URI scheme: `file://` opens a JSON export in
/// memory, anything else is handed to Postgres.
#[derive(Debug, Clone)]
pub struct UriConnector {
    pub connect_timeout: Duration,
    pub statement_timeout: Duration,
}

#[async_trait]
impl StoreConnector for UriConnector {
    async fn connect(&self, uri: &str) -> Result<Box<dyn RecordStore>, StoreError> {
        if let Some(path) = uri.strip_prefix("file://") {
            let store = MemoryRecordStore::from_json_file(path).await?;
            return Ok(Box::new(store));
        }

        let store = PostgresRecordStore::connect(uri, self.connect_timeout, self.statement_timeout)?;
        Ok(Box::new(store))
    }
}

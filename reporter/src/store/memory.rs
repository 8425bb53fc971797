use async_trait::async_trait;
use tracing::info;

use crate::models::{AggregateResult, TransactionRecord};
use crate::store::{AggregationRequest, RecordStore, StoreError};

/// Records held in memory, e.g. a JSON export of the transactions collection.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: Vec<TransactionRecord>,
}

impl MemoryRecordStore {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self { records }
    }

    pub async fn from_json_file(path: &str) -> Result<Self, StoreError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Connection(format!("reading {}: {}", path, e)))?;
        let records: Vec<TransactionRecord> = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Query(format!("parsing {}: {}", path, e)))?;

        info!("Loaded {} records from {}", records.len(), path);
        Ok(Self::new(records))
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn aggregate(&self, request: &AggregationRequest) -> Result<Option<AggregateResult>, StoreError> {
        Ok(request.fold(&self.records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReportWindow;
    use crate::store::RecordLayout;
    use chrono::{TimeZone, Utc};
    use std::io::Write;

    fn request() -> AggregationRequest {
        let window = ReportWindow {
            start: Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap(),
            label: "2024-03-09".to_string(),
            zone_name: "EDT".to_string(),
        };
        let layout = RecordLayout::new("power_transaction_items", "date_created", "status", "amount").unwrap();
        AggregationRequest::for_window(&layout, &window, "fulfilled")
    }

    #[tokio::test]
    async fn loads_an_export_and_aggregates_it() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"date_created": "2024-03-10 01:00:00", "status": "fulfilled", "amount": "12.00"}},
                {{"date_created": "2024-03-10 02:00:00", "status": "failed", "amount": "3.00"}},
                {{"date_created": "2024-03-10 03:00:00", "status": null, "amount": null}}
            ]"#
        )
        .unwrap();

        let store = MemoryRecordStore::from_json_file(file.path().to_str().unwrap()).await.unwrap();
        let result = store.aggregate(&request()).await.unwrap().unwrap();

        assert_eq!(result.total_count, 3);
        assert_eq!(result.success_count, 1);
        assert_eq!(result.failure_count, 2);
        assert_eq!(result.success_amount_sum, rust_decimal::Decimal::from(12));
    }

    #[tokio::test]
    async fn malformed_export_is_a_store_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let result = MemoryRecordStore::from_json_file(file.path().to_str().unwrap()).await;
        assert!(matches!(result, Err(StoreError::Query(_))));
    }

    #[tokio::test]
    async fn empty_store_is_not_an_error() {
        let store = MemoryRecordStore::default();
        assert_eq!(store.aggregate(&request()).await.unwrap(), None);
    }
}

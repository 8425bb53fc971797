use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use rust_decimal::Decimal;
use tokio_postgres::NoTls;
use tracing::{debug, error, warn};

use crate::models::AggregateResult;
use crate::store::{AggregationRequest, RecordStore, StoreError};

/// A single-connection pool owned by one run. Dropping the store closes the
/// pool, so the connection is released on every exit path.
pub struct PostgresRecordStore {
    db_pool: Pool,
}

impl PostgresRecordStore {
    pub fn connect(uri: &str, connect_timeout: Duration, statement_timeout: Duration) -> Result<Self, StoreError> {
        let mut pg_config = uri
            .parse::<tokio_postgres::Config>()
            .map_err(|e| StoreError::Connection(format!("invalid connection uri: {}", e)))?;
        pg_config.connect_timeout(connect_timeout);
        pg_config.options(&format!("-c statement_timeout={}", statement_timeout.as_millis()));

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let db_pool = Pool::builder(manager)
            .max_size(1)
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self { db_pool })
    }

    fn process_aggregate_row(row: &tokio_postgres::Row) -> Result<Option<AggregateResult>, StoreError> {
        let read = |e: tokio_postgres::Error| StoreError::Query(format!("unexpected aggregate row: {}", e));

        let total_count: i64 = row.try_get("total_count").map_err(read)?;
        if total_count == 0 {
            return Ok(None);
        }

        let raw_sum: String = row.try_get("success_amount_sum").map_err(read)?;
        let mut amount_anomalies: i64 = row.try_get("amount_anomalies").map_err(read)?;
        let success_amount_sum = match parse_sum(&raw_sum) {
            Ok(sum) => sum,
            Err(saturated) => {
                amount_anomalies += 1;
                saturated
            }
        };

        Ok(Some(AggregateResult {
            total_count,
            success_amount_sum,
            success_count: row.try_get("success_count").map_err(read)?,
            failure_count: row.try_get("failure_count").map_err(read)?,
            amount_anomalies,
        }))
    }
}

/// The numeric total arrives as text so a sum beyond `Decimal`'s range is a
/// data anomaly rather than a failed row conversion. `Err` carries the
/// saturated value.
fn parse_sum(raw: &str) -> Result<Decimal, Decimal> {
    Decimal::from_str(raw.trim()).map_err(|e| {
        let saturated = if raw.trim_start().starts_with('-') { Decimal::MIN } else { Decimal::MAX };
        warn!("Successful amount total {} is out of range ({}); reporting {}", raw, e, saturated);
        saturated
    })
}

impl Drop for PostgresRecordStore {
    fn drop(&mut self) {
        self.db_pool.close();
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn aggregate(&self, request: &AggregationRequest) -> Result<Option<AggregateResult>, StoreError> {
        let client = self.db_pool.get().await.map_err(|e| {
            error!("Failed to get Postgres connection: {}", e);
            StoreError::Connection(e.to_string())
        })?;

        let query = request.sql();
        debug!("Running aggregation: {}", query);

        let row = client.query_one(query.as_str(), &request.params()).await.map_err(|e| {
            error!("Aggregation query failed: {}", e);
            StoreError::Query(e.to_string())
        })?;

        Self::process_aggregate_row(&row)
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// The span of one run's aggregation. `end` is the last included second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub label: String,
    pub zone_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    pub total_count: i64,
    #[serde(with = "crate::serializers::decimal")]
    pub success_amount_sum: Decimal,
    pub success_count: i64,
    pub failure_count: i64,
    /// Success records whose amount was not numeric and contributed zero.
    pub amount_anomalies: i64,
}

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio_postgres::types::ToSql;
use tracing::warn;

use crate::models::{AggregateResult, ReportWindow, TransactionRecord};
use crate::report::STORE_TIMESTAMP_FORMAT;

/// Amounts are stored as text. Only values matching this are summed; Postgres
/// evaluates the same pattern with `~` so both backends agree.
const AMOUNT_PATTERN: &str = r"^\s*[+-]?[0-9]+(\.[0-9]+)?\s*$";

static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(AMOUNT_PATTERN).expect("amount pattern compiles"));
static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern compiles"));

#[derive(Debug, Error, PartialEq, Eq)]
#[error("`{0}` is not a valid table or column name")]
pub struct LayoutError(pub String);

/// Where the transaction records live. Names are checked once so they can be
/// quoted into SQL safely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    table: String,
    date_column: String,
    status_column: String,
    amount_column: String,
}

impl RecordLayout {
    pub fn new(table: &str, date_column: &str, status_column: &str, amount_column: &str) -> Result<Self, LayoutError> {
        for name in [table, date_column, status_column, amount_column] {
            if !IDENTIFIER_RE.is_match(name) {
                return Err(LayoutError(name.to_string()));
            }
        }

        Ok(Self {
            table: table.to_string(),
            date_column: date_column.to_string(),
            status_column: status_column.to_string(),
            amount_column: amount_column.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationRequest {
    layout: RecordLayout,
    lower: String,
    upper: String,
    success_status: String,
    amount_pattern: String,
}

impl AggregationRequest {
    /// Both bounds are inclusive and compared as strings against the stored
    /// `YYYY-MM-DD HH:MM:SS` values.
    pub fn for_window(layout: &RecordLayout, window: &ReportWindow, success_status: &str) -> Self {
        Self {
            layout: layout.clone(),
            lower: window.start.format(STORE_TIMESTAMP_FORMAT).to_string(),
            upper: window.end.format(STORE_TIMESTAMP_FORMAT).to_string(),
            success_status: success_status.to_string(),
            amount_pattern: AMOUNT_PATTERN.to_string(),
        }
    }

    pub fn bounds(&self) -> (&str, &str) {
        (&self.lower, &self.upper)
    }

    pub fn sql(&self) -> String {
        let RecordLayout {
            table,
            date_column,
            status_column,
            amount_column,
        } = &self.layout;

        format!(
            "SELECT COUNT(1) AS total_count, \
             COALESCE(SUM(CASE WHEN \"{status_column}\" = $3 AND \"{amount_column}\" ~ $4 \
             THEN \"{amount_column}\"::numeric END), 0)::text AS success_amount_sum, \
             COUNT(1) FILTER (WHERE \"{status_column}\" = $3) AS success_count, \
             COUNT(1) FILTER (WHERE \"{status_column}\" IS DISTINCT FROM $3) AS failure_count, \
             COUNT(1) FILTER (WHERE \"{status_column}\" = $3 AND COALESCE(\"{amount_column}\", '') !~ $4) AS amount_anomalies \
             FROM \"{table}\" \
             WHERE \"{date_column}\" >= $1 AND \"{date_column}\" <= $2"
        )
    }

    pub fn params(&self) -> [&(dyn ToSql + Sync); 4] {
        [&self.lower, &self.upper, &self.success_status, &self.amount_pattern]
    }

    pub fn matches(&self, record: &TransactionRecord) -> bool {
        let date = record.date_created.as_str();
        date >= self.lower.as_str() && date <= self.upper.as_str()
    }

    fn is_success(&self, record: &TransactionRecord) -> bool {
        record.status.as_deref() == Some(self.success_status.as_str())
    }

    /// Evaluates the aggregation over records already in memory.
    pub fn fold<'a>(&self, records: impl IntoIterator<Item = &'a TransactionRecord>) -> Option<AggregateResult> {
        let mut result = AggregateResult {
            total_count: 0,
            success_amount_sum: Decimal::ZERO,
            success_count: 0,
            failure_count: 0,
            amount_anomalies: 0,
        };

        for record in records.into_iter().filter(|r| self.matches(r)) {
            result.total_count += 1;
            if !self.is_success(record) {
                result.failure_count += 1;
                continue;
            }

            result.success_count += 1;
            match record.amount.as_deref().and_then(parse_amount) {
                Some(amount) => match result.success_amount_sum.checked_add(amount) {
                    Some(sum) => result.success_amount_sum = sum,
                    None => {
                        warn!(
                            "Amount {} on record dated {} overflows the running total; total saturated",
                            amount, record.date_created
                        );
                        result.success_amount_sum = result.success_amount_sum.saturating_add(amount);
                        result.amount_anomalies += 1;
                    }
                },
                None => {
                    warn!(
                        "Non-numeric amount {:?} on successful record dated {}; counted as zero",
                        record.amount, record.date_created
                    );
                    result.amount_anomalies += 1;
                }
            }
        }

        (result.total_count > 0).then_some(result)
    }
}

pub fn parse_amount(raw: &str) -> Option<Decimal> {
    if !AMOUNT_RE.is_match(raw) {
        return None;
    }
    let trimmed = raw.trim();
    Decimal::from_str(trimmed.strip_prefix('+').unwrap_or(trimmed)).ok()
}

use serde::{Deserialize, Serialize};

/// A stored transaction as the record store keeps it: every field is text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date_created: String,
    pub status: Option<String>,
    pub amount: Option<String>,
}

#[cfg(test)]
impl TransactionRecord {
    pub fn new(date_created: &str, status: &str, amount: &str) -> Self {
        Self {
            date_created: date_created.to_string(),
            status: Some(status.to_string()),
            amount: Some(amount.to_string()),
        }
    }
}

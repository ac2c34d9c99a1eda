//! Wire shape of one activity log entry

use serde::{Deserialize, Serialize};

/// Row of `user_activity_logs` as served by every backend.
///
/// GraphQL queries select a subset of the fields, so every field defaults
/// when absent. `id` is nullable in the table; `metadata_json` may be `null`
/// on the REST backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub metadata_json: Option<String>,
}

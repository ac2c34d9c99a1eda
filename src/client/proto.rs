//! Bindings for the `activity.ActivityService` gRPC API, generated from
//! `proto/activity.proto`

use crate::models::LogRecord;

include!("generated/activity.rs");

impl From<LogEntry> for LogRecord {
    fn from(entry: LogEntry) -> Self {
        fn non_empty(value: String) -> Option<String> {
            if value.is_empty() { None } else { Some(value) }
        }

        Self {
            id: Some(i64::from(entry.id)),
            user_id: i64::from(entry.user_id),
            action: entry.action,
            timestamp: entry.timestamp,
            ip_address: non_empty(entry.ip_address),
            metadata_json: non_empty(entry.metadata_json),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_get_logs_request_wire_bytes() {
        // field 1, varint
        let bytes = GetLogsRequest { limit: 5 }.encode_to_vec();
        assert_eq!(bytes, vec![0x08, 0x05]);
    }

    #[test]
    fn test_empty_health_request_encodes_to_nothing() {
        assert!(HealthRequest {}.encode_to_vec().is_empty());
    }

    #[test]
    fn test_log_entry_into_record() {
        let entry = LogEntry {
            id: 3,
            user_id: 9,
            action: "login".into(),
            timestamp: "2024-01-01T00:00:00".into(),
            ip_address: String::new(),
            metadata_json: "{}".into(),
        };
        let record: LogRecord = entry.into();
        assert_eq!(record.id, Some(3));
        assert!(record.ip_address.is_none());
        assert_eq!(record.metadata_json.as_deref(), Some("{}"));
    }

    #[test]
    fn test_log_list_decodes() {
        let list = LogList {
            logs: vec![LogEntry { id: 1, ..Default::default() }, LogEntry { id: 2, ..Default::default() }],
        };
        let decoded = LogList::decode(list.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.logs.len(), 2);
    }
}

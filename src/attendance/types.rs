//! Normalized attendance result types.
//!
//! The attendance service does not return uniformly shaped responses: some
//! endpoints wrap records in a `{success, data}` envelope, some return bare
//! arrays, some a single object, and field names vary between snake_case and
//! camelCase. Everything is normalized into [`AttendanceResult`] before the
//! second generation pass sees it.

use serde::{Deserialize, Serialize};

/// One attendance record in normalized form.
///
/// Serialized field names match what the second-pass prompt embeds
/// (camelCase); deserialization also accepts the API's snake_case spellings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Employee name.
    #[serde(default)]
    pub name: String,
    /// Record date (`YYYY-MM-DD`).
    #[serde(default)]
    pub date: String,
    /// Clock-in time, if recorded.
    #[serde(rename = "timeEntry", alias = "time_entry", default)]
    pub time_entry: Option<String>,
    /// Clock-out time, if recorded.
    #[serde(rename = "timeExit", alias = "time_exit", default)]
    pub time_exit: Option<String>,
    /// Work location, if recorded.
    #[serde(default)]
    pub location: Option<String>,
}

/// The single shape handed to the second generation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttendanceResult {
    /// Whether a named employee clocked in today.
    CheckEntry {
        /// The employee the check was made for.
        employee: String,
        /// True if an entry exists for today.
        #[serde(rename = "hasEntered")]
        has_entered: bool,
        /// Clock-in time when present.
        #[serde(rename = "entryTime", skip_serializing_if = "Option::is_none")]
        entry_time: Option<String>,
    },
    /// A list of attendance records.
    Records {
        /// The normalized records.
        data: Vec<AttendanceRecord>,
    },
    /// The lookup failed; the message is safe to show to the model.
    Error {
        /// What went wrong.
        error: String,
    },
}

impl AttendanceResult {
    /// Convenience constructor for the error variant.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}

/// Extract records from whatever shape the service returned.
///
/// Accepts a bare array, a `{data: [...]}` envelope, a `{data: {...}}`
/// single-record envelope, or a single record object. Entries that do not
/// parse as records are skipped.
pub fn extract_records(value: &serde_json::Value) -> Vec<AttendanceRecord> {
    let items: Vec<&serde_json::Value> = match value {
        serde_json::Value::Array(items) => items.iter().collect(),
        serde_json::Value::Object(map) => match map.get("data") {
            Some(serde_json::Value::Array(items)) => items.iter().collect(),
            Some(single @ serde_json::Value::Object(_)) => vec![single],
            _ if map.contains_key("name") => vec![value],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .filter(|record: &AttendanceRecord| !record.name.is_empty())
        .collect()
}

/// Pull an error message out of a `{success: false, error}` style response.
pub fn extract_error(value: &serde_json::Value) -> Option<String> {
    let map = value.as_object()?;
    let failed = matches!(map.get("success"), Some(serde_json::Value::Bool(false)));
    let message = map
        .get("error")
        .or_else(|| map.get("message"))
        .and_then(|v| v.as_str());
    match (failed, message) {
        (_, Some(message)) if failed || map.contains_key("error") => Some(message.to_owned()),
        (true, None) => Some("attendance service reported failure".to_owned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ── Record extraction ─────────────────────────────────────

    #[test]
    fn extracts_from_bare_array() {
        let value = json!([
            {"name": "Ana", "date": "2025-09-05", "time_entry": "08:42:00"},
            {"name": "João", "date": "2025-09-05"}
        ]);
        let records = extract_records(&value);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Ana");
        assert_eq!(records[0].time_entry.as_deref(), Some("08:42:00"));
        assert!(records[1].time_entry.is_none());
    }

    #[test]
    fn extracts_from_data_envelope() {
        let value = json!({
            "success": true,
            "data": [{"name": "Ana", "date": "2025-09-05", "location": "Porto"}]
        });
        let records = extract_records(&value);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].location.as_deref(), Some("Porto"));
    }

    #[test]
    fn extracts_single_object_envelope() {
        let value = json!({"data": {"name": "Rui", "date": "2025-09-04"}});
        let records = extract_records(&value);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Rui");
    }

    #[test]
    fn extracts_bare_record_object() {
        let value = json!({"name": "Rui", "date": "2025-09-04", "timeEntry": "09:00:00"});
        let records = extract_records(&value);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].time_entry.as_deref(), Some("09:00:00"));
    }

    #[test]
    fn camel_case_fields_are_accepted() {
        let value = json!([{"name": "Ana", "date": "d", "timeEntry": "08:00:00", "timeExit": "17:00:00"}]);
        let records = extract_records(&value);
        assert_eq!(records[0].time_entry.as_deref(), Some("08:00:00"));
        assert_eq!(records[0].time_exit.as_deref(), Some("17:00:00"));
    }

    #[test]
    fn nameless_entries_are_skipped() {
        let value = json!([{"date": "2025-09-05"}, {"name": "Ana", "date": "2025-09-05"}]);
        let records = extract_records(&value);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn scalar_response_yields_nothing() {
        assert!(extract_records(&json!("nope")).is_empty());
        assert!(extract_records(&json!(42)).is_empty());
        assert!(extract_records(&json!({"success": true})).is_empty());
    }

    // ── Error extraction ──────────────────────────────────────

    #[test]
    fn error_envelope_is_detected() {
        let value = json!({"success": false, "error": "employee not found"});
        assert_eq!(extract_error(&value).as_deref(), Some("employee not found"));
    }

    #[test]
    fn error_field_without_flag_is_detected() {
        let value = json!({"error": "missing api key"});
        assert_eq!(extract_error(&value).as_deref(), Some("missing api key"));
    }

    #[test]
    fn failure_without_message_gets_generic_text() {
        let value = json!({"success": false});
        assert_eq!(
            extract_error(&value).as_deref(),
            Some("attendance service reported failure")
        );
    }

    #[test]
    fn success_response_is_not_an_error() {
        assert!(extract_error(&json!({"success": true, "data": []})).is_none());
        assert!(extract_error(&json!([])).is_none());
    }

    // ── Serialized shape ──────────────────────────────────────

    #[test]
    fn check_entry_serializes_with_camel_case_tagging() {
        let result = AttendanceResult::CheckEntry {
            employee: "João".into(),
            has_entered: true,
            entry_time: Some("08:42:00".into()),
        };
        let json = serde_json::to_value(&result)
            .unwrap_or_else(|_| unreachable!("result serializes"));
        assert_eq!(json["type"], "check_entry");
        assert_eq!(json["hasEntered"], true);
        assert_eq!(json["entryTime"], "08:42:00");
    }

    #[test]
    fn check_entry_omits_absent_entry_time() {
        let result = AttendanceResult::CheckEntry {
            employee: "Ana".into(),
            has_entered: false,
            entry_time: None,
        };
        let json = serde_json::to_value(&result)
            .unwrap_or_else(|_| unreachable!("result serializes"));
        assert!(json.get("entryTime").is_none());
    }

    #[test]
    fn records_serialize_under_data() {
        let result = AttendanceResult::Records {
            data: vec![AttendanceRecord {
                name: "Ana".into(),
                date: "2025-09-05".into(),
                time_entry: Some("08:00:00".into()),
                time_exit: None,
                location: None,
            }],
        };
        let json = serde_json::to_value(&result)
            .unwrap_or_else(|_| unreachable!("result serializes"));
        assert_eq!(json["type"], "records");
        assert_eq!(json["data"][0]["timeEntry"], "08:00:00");
    }

    #[test]
    fn error_variant_shape() {
        let result = AttendanceResult::error("boom");
        let json = serde_json::to_value(&result)
            .unwrap_or_else(|_| unreachable!("result serializes"));
        assert_eq!(json["type"], "error");
        assert_eq!(json["error"], "boom");
    }
}

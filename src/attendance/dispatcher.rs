//! Directive-to-lookup dispatch and result normalization.
//!
//! Maps a detected [`Directive`](crate::directive::Directive) to exactly one
//! attendance call, normalizes the heterogeneous response into an
//! [`AttendanceResult`], and builds the prompt for the second generation
//! pass. Every failure of the external call becomes the `Error` result
//! variant — dispatch never propagates an error into the conversation
//! machine, so the second pass always has something to explain.

use std::str::FromStr;

use super::client::AttendanceApi;
use super::types::{AttendanceResult, extract_error, extract_records};
use crate::directive::Directive;

/// Number of records fetched for a history query.
const HISTORY_LIMIT: u32 = 10;

/// The closed set of supported attendance queries.
///
/// The query-type token extracted from generated text is untrusted; it is
/// validated against this enum before any external call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Has a named employee clocked in today?
    CheckEntry,
    /// Recent records for a named employee.
    GetHistory,
    /// Records filtered by date or name.
    GetRecords,
    /// All records, unfiltered.
    ListAll,
}

impl FromStr for QueryKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "check_entry" => Ok(Self::CheckEntry),
            "get_history" => Ok(Self::GetHistory),
            "get_records" => Ok(Self::GetRecords),
            "list_all" => Ok(Self::ListAll),
            _ => Err(()),
        }
    }
}

/// Today's date in the local timezone as `YYYY-MM-DD`.
fn today_local() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Filters parsed from a `get_records` parameter string.
#[derive(Debug, Default, PartialEq, Eq)]
struct RecordFilters {
    name: Option<String>,
    date: Option<String>,
}

/// Parse `get_records` parameters.
///
/// Accepts comma-separated `date:<token>` / `name:<value>` pairs or a bare
/// employee name; the `hoje`/`today` date token resolves to the current
/// local date.
fn parse_record_filters(parameters: &str) -> RecordFilters {
    let mut filters = RecordFilters::default();
    for part in parameters.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some(date) = part.strip_prefix("date:") {
            let date = date.trim();
            filters.date = Some(if date.eq_ignore_ascii_case("hoje")
                || date.eq_ignore_ascii_case("today")
            {
                today_local()
            } else {
                date.to_owned()
            });
        } else if let Some(name) = part.strip_prefix("name:") {
            filters.name = Some(name.trim().to_owned());
        } else if !part.contains(':') {
            filters.name = Some(part.to_owned());
        }
    }
    filters
}

/// Execute the lookup a directive asks for and normalize the result.
///
/// Unrecognized query types and external failures come back as the
/// [`AttendanceResult::Error`] variant; this function never fails.
pub async fn dispatch(api: &dyn AttendanceApi, directive: &Directive) -> AttendanceResult {
    let Ok(kind) = QueryKind::from_str(&directive.query_type) else {
        tracing::warn!(query_type = %directive.query_type, "unrecognized attendance query type");
        return AttendanceResult::error(format!(
            "unrecognized attendance query type: {}",
            directive.query_type
        ));
    };

    tracing::debug!(?kind, parameters = %directive.parameters, "dispatching attendance query");

    match kind {
        QueryKind::CheckEntry => check_entry(api, directive.parameters.trim()).await,
        QueryKind::GetHistory => {
            let name = directive.parameters.trim();
            match api.history(name, HISTORY_LIMIT).await {
                Ok(value) => normalize_records(&value),
                Err(e) => AttendanceResult::error(e.message()),
            }
        }
        QueryKind::GetRecords => {
            let filters = parse_record_filters(&directive.parameters);
            match api
                .records(filters.name.as_deref(), filters.date.as_deref())
                .await
            {
                Ok(value) => normalize_records(&value),
                Err(e) => AttendanceResult::error(e.message()),
            }
        }
        QueryKind::ListAll => match api.records(None, None).await {
            Ok(value) => normalize_records(&value),
            Err(e) => AttendanceResult::error(e.message()),
        },
    }
}

/// `check_entry`: look for a record for `name` dated today.
async fn check_entry(api: &dyn AttendanceApi, name: &str) -> AttendanceResult {
    let today = today_local();
    let value = match api.records(Some(name), Some(&today)).await {
        Ok(value) => value,
        Err(e) => return AttendanceResult::error(e.message()),
    };
    if let Some(error) = extract_error(&value) {
        return AttendanceResult::error(error);
    }

    let records = extract_records(&value);
    let entry_time = records.iter().find_map(|r| r.time_entry.clone());
    AttendanceResult::CheckEntry {
        employee: name.to_owned(),
        has_entered: entry_time.is_some(),
        entry_time,
    }
}

/// Normalize a record-list response, honoring an in-band error envelope.
fn normalize_records(value: &serde_json::Value) -> AttendanceResult {
    if let Some(error) = extract_error(value) {
        return AttendanceResult::error(error);
    }
    AttendanceResult::Records {
        data: extract_records(value),
    }
}

/// Build the prompt for the second generation pass.
///
/// Embeds the original user question and the normalized lookup result as
/// JSON. The second pass runs with empty history; everything the model needs
/// is in this prompt.
pub fn second_pass_prompt(user_query: &str, result: &AttendanceResult) -> String {
    let json = serde_json::to_string(result)
        .unwrap_or_else(|_| r#"{"type":"error","error":"serialization failed"}"#.to_owned());
    format!(
        "The user asked: \"{user_query}\"\n\n\
         An attendance lookup was performed for them. Lookup result (JSON):\n\
         {json}\n\n\
         Answer the user's question in natural language using only this data. \
         Do not mention the lookup mechanism or show raw JSON. If the result \
         type is \"error\", apologize briefly and say the attendance data \
         could not be retrieved."
    )
}

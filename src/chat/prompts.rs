//! Prompt text and user-facing strings for the conversation machine.

/// System prompt for the first generation pass.
///
/// Teaches the model the directive grammar it may emit when a question
/// needs live attendance data. The marker text itself is machine-only; the
/// conversation machine strips it before anything reaches the user.
pub const ASSISTANT_SYSTEM_PROMPT: &str = "\
You are a helpful workplace voice assistant. Answer questions directly and \
concisely.

When, and only when, the user asks about employee attendance (who clocked \
in, entry/exit times, attendance history), do not guess: reply with exactly \
one marker of the form

[ATTENDANCE_QUERY: <type> | <parameters>]

and nothing else. Supported types:
- check_entry — has the named employee clocked in today; parameters: the employee name
- get_history — recent records for an employee; parameters: the employee name
- get_records — records filtered by date or name; parameters: date:<YYYY-MM-DD>, date:hoje, or an employee name
- list_all — every record; parameters: none

For any other topic, answer normally and never emit the marker.";

/// System prompt for the second generation pass.
///
/// The second pass formats an already-fetched lookup result; it must not
/// emit another directive.
pub const FORMATTER_SYSTEM_PROMPT: &str = "\
You turn raw attendance lookup data into a short, natural answer for the \
user. Use only the data provided in the prompt. Never output markers, \
JSON, or implementation details.";

/// Shown in place of the directive while the lookup and second pass run.
pub const CONSULTING_TEXT: &str = "Consulting attendance data…";

/// User-facing text when a stream session fails.
pub const APOLOGY_TEXT: &str =
    "Sorry, something went wrong while answering. Please try again.";

/// User-facing text when the data was fetched but the second pass failed.
pub const FORMATTING_FAILED_TEXT: &str =
    "I retrieved the attendance data but could not put the answer together. Please try again.";

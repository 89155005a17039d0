//! Timestamp encoding for the session record file

use chrono::{DateTime, SecondsFormat, Utc};

/// Current UTC time
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Encode a creation time as RFC 3339 with as much sub-second precision as needed
pub fn encode_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Decode the content of a session file.
///
/// Trailing line endings are ignored; anything else that is not a valid
/// RFC 3339 timestamp yields `None`.
pub fn decode_timestamp(bytes: &[u8]) -> Option<DateTime<Utc>> {
    let text = std::str::from_utf8(bytes).ok()?;
    let text = text.trim_end_matches(['\r', '\n']);
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

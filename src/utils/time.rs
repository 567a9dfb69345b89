use chrono::{DateTime, Utc};

/// Chat timestamps are broadcast as `YYYY-MM-DD HH:MM`; clients render the
/// string verbatim.
pub fn chat_timestamp(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

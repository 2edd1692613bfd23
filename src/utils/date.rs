//! Build timestamps.

use chrono::{DateTime, Utc};

/// Environment variable pinning timestamps in deterministic builds.
pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

/// Timestamp format used in build labels.
const LABEL_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Current time, or the pinned epoch when `deterministic` is set.
///
/// The pinned epoch is `SOURCE_DATE_EPOCH` when it parses, otherwise 0.
pub fn build_time(deterministic: bool) -> DateTime<Utc> {
    if !deterministic {
        return Utc::now();
    }
    let secs = std::env::var(SOURCE_DATE_EPOCH)
        .ok()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .unwrap_or(0);
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Format a timestamp as `YYYYMMDDTHHMMSSZ`.
pub fn label_timestamp(time: &DateTime<Utc>) -> String {
    time.format(LABEL_FORMAT).to_string()
}

use std::fmt;
use std::sync::Once;

use time::macros::format_description;
use time::OffsetDateTime;
use tracing::debug;

use crate::error::SessionStoreError;

/// Current wall-clock time in the local offset, or UTC when the local offset
/// cannot be determined (e.g. multi-threaded processes on some Unix targets).
///
/// Stamps carry no offset, so a file written partly under the fallback mixes
/// local and UTC times that cannot be told apart afterwards.
#[must_use]
pub fn now() -> OffsetDateTime {
    local_or_utc(OffsetDateTime::now_local())
}

fn local_or_utc<E: fmt::Display>(local: Result<OffsetDateTime, E>) -> OffsetDateTime {
    static FALLBACK_LOGGED: Once = Once::new();

    local.unwrap_or_else(|error| {
        FALLBACK_LOGGED.call_once(|| {
            debug!(%error, "local UTC offset unavailable; session timestamps use UTC");
        });
        OffsetDateTime::now_utc()
    })
}

/// Formats `at` as `YYYY-MM-DD HH:MM:SS.mmm`, truncating to milliseconds.
pub fn message_timestamp(at: OffsetDateTime) -> Result<String, SessionStoreError> {
    let format =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");
    at.format(format).map_err(SessionStoreError::ClockFormat)
}

/// Formats `at` as an ISO-8601 local timestamp with millisecond precision.
pub fn session_timestamp(at: OffsetDateTime) -> Result<String, SessionStoreError> {
    let format =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]");
    at.format(format).map_err(SessionStoreError::ClockFormat)
}

pub fn message_timestamp_now() -> Result<String, SessionStoreError> {
    message_timestamp(now())
}

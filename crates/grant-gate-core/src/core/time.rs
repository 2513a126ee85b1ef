// crates/grant-gate-core/src/core/time.rs
// ============================================================================
// Module: Grant Gate Time Model
// Description: Calendar date and timezone-qualified timestamp helpers.
// Purpose: Keep date parsing and rendering locale-independent and explicit.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Policy evaluation works on calendar dates (`YYYY-MM-DD`) with no time
//! component. Token claims carry RFC 3339 timestamps, which always include an
//! offset. Wall-clock reads are not performed here; see
//! [`crate::interfaces::Clock`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::Date;
use time::Duration;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

// ============================================================================
// SECTION: Formats
// ============================================================================

/// Calendar date format used by intents and snapshots.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

// ============================================================================
// SECTION: Date Helpers
// ============================================================================

/// Parses a `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns [`time::error::Parse`] when the text is not a valid date.
pub fn parse_date(text: &str) -> Result<Date, time::error::Parse> {
    Date::parse(text, DATE_FORMAT)
}

/// Renders a calendar date as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(date: Date) -> String {
    let (year, month, day) = (date.year(), u8::from(date.month()), date.day());
    format!("{year:04}-{month:02}-{day:02}")
}

/// Returns the whole-day difference `later - earlier` (negative when reversed).
#[must_use]
pub fn days_between(earlier: Date, later: Date) -> i64 {
    (later - earlier).whole_days()
}

// ============================================================================
// SECTION: Timestamp Helpers
// ============================================================================

/// Renders a timestamp in RFC 3339 form.
///
/// # Errors
///
/// Returns [`time::error::Format`] when the instant cannot be represented.
pub fn format_rfc3339(instant: OffsetDateTime) -> Result<String, time::error::Format> {
    instant.format(&Rfc3339)
}

/// Parses an RFC 3339 timestamp; an offset is mandatory.
///
/// # Errors
///
/// Returns [`time::error::Parse`] when the text is not timezone-qualified RFC 3339.
pub fn parse_rfc3339(text: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(text, &Rfc3339)
}

/// Adds whole seconds to an instant, returning `None` on overflow.
#[must_use]
pub fn checked_add_seconds(instant: OffsetDateTime, seconds: i64) -> Option<OffsetDateTime> {
    instant.checked_add(Duration::seconds(seconds))
}

/// Returns unix epoch milliseconds for an instant.
#[must_use]
pub fn unix_millis(instant: OffsetDateTime) -> i128 {
    instant.unix_timestamp_nanos() / 1_000_000
}

// ============================================================================
// SECTION: Serde Adapters
// ============================================================================

/// Serde adapter for `YYYY-MM-DD` calendar dates.
pub mod iso_date {
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;
    use time::Date;

    /// Serializes a date as `YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date(*date))
    }

    /// Deserializes a `YYYY-MM-DD` date.
    ///
    /// # Errors
    ///
    /// Returns a deserializer error when the text is not a valid date.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_date(&text).map_err(serde::de::Error::custom)
    }
}

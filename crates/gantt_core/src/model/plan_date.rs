//! Canonical plan-date text codec.
//!
//! Planned dates live in storage and on the wire as
//! `YYYY-MM-DD HH:MM:SS` text. Keeping one codec here avoids drift between
//! the repository row parsers and the serialized chart payload.

use chrono::NaiveDateTime;

/// Text format shared by storage columns and serialized items.
pub const PLAN_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats one plan date into canonical text form.
pub fn format_plan_date(value: NaiveDateTime) -> String {
    value.format(PLAN_DATE_FORMAT).to_string()
}

/// Parses canonical text form into a plan date.
pub fn parse_plan_date(value: &str) -> Result<NaiveDateTime, chrono::format::ParseError> {
    NaiveDateTime::parse_from_str(value, PLAN_DATE_FORMAT)
}

/// Serde adapter serializing `NaiveDateTime` in canonical text form.
pub mod as_plan_date {
    use super::format_plan_date;
    use chrono::NaiveDateTime;
    use serde::Serializer;

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_plan_date(*value))
    }
}

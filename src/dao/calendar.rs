//! Calendar formats shared by persisted entities and request parsing.
//!
//! Show dates travel as `YYYY-MM-DD` and show times as `HH:MM`, matching what
//! the box office enters.

use time::{Date, OffsetDateTime, Time, format_description::BorrowedFormatItem, macros::format_description};

/// `YYYY-MM-DD`.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
/// `HH:MM`, 24 hours.
pub const TIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");

time::serde::format_description!(pub show_date, Date, "[year]-[month]-[day]");
time::serde::format_description!(pub clock_time, Time, "[hour]:[minute]");

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<Date, time::error::Parse> {
    Date::parse(value.trim(), DATE_FORMAT)
}

/// Parse an `HH:MM` time of day.
pub fn parse_time(value: &str) -> Result<Time, time::error::Parse> {
    Time::parse(value.trim(), TIME_FORMAT)
}

pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| "invalid-date".into())
}

pub fn format_time(time: Time) -> String {
    time.format(TIME_FORMAT)
        .unwrap_or_else(|_| "invalid-time".into())
}

/// Render a timestamp as RFC 3339 for API payloads.
pub fn format_timestamp(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, time};

    #[test]
    fn parses_box_office_formats() {
        assert_eq!(parse_date("2025-03-09").unwrap(), date!(2025 - 03 - 09));
        assert_eq!(parse_time("09:05").unwrap(), time!(09:05));
        assert_eq!(parse_time(" 21:30 ").unwrap(), time!(21:30));
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(parse_date("09/03/2025").is_err());
        assert!(parse_time("9h30").is_err());
        assert!(parse_time("25:00").is_err());
    }

    #[test]
    fn formats_with_zero_padding() {
        assert_eq!(format_date(date!(2025 - 01 - 02)), "2025-01-02");
        assert_eq!(format_time(time!(07:00)), "07:00");
    }
}

// Date expression parsing
//
// Resolution never fails: anything unrecognised yields `None`, which callers
// treat as "no date set".

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Format used for dates in the state file
pub const SAVE_DATE_FORMAT: &str = "%d/%m/%Y";

/// Format used for dates in the table, e.g. `Sat 08 Oct`
pub const DISPLAY_DATE_FORMAT: &str = "%a %d %b";

/// Marker written to the state file for an unset date
pub const UNSET_MARKER: &str = "none";

fn parse_weekday(text: &str) -> Option<Weekday> {
    match text {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Next date falling on `weekday`, strictly after `today` (1 to 7 days ahead)
pub fn next_weekday(weekday: Weekday, today: NaiveDate) -> NaiveDate {
    let ahead = (weekday.num_days_from_monday() + 7 - today.weekday().num_days_from_monday()) % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    today + Duration::days(ahead as i64)
}

fn parse_number(part: &str) -> Option<i32> {
    let part = part.trim();
    if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Resolve a human-friendly date expression relative to `today`
///
/// Accepts (case-insensitive):
/// - `today`/`tod`, `tomorrow`/`tom`, `next week`
/// - weekday names or abbreviations (next occurrence, never today)
/// - `D/M` (year inferred so the date is not in the past)
/// - `D/M/Y`
///
/// Returns `None` for anything else, including impossible dates like `31/2`.
pub fn resolve_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = text.trim().to_lowercase();

    match text.as_str() {
        "today" | "tod" => return Some(today),
        "tomorrow" | "tom" => return Some(today + Duration::days(1)),
        "next week" => return Some(today + Duration::weeks(1)),
        _ => {}
    }

    if let Some(weekday) = parse_weekday(&text) {
        return Some(next_weekday(weekday, today));
    }

    let parts: Vec<&str> = text.split('/').collect();
    match parts.as_slice() {
        [day, month] => {
            let day = parse_number(day)? as u32;
            let month = parse_number(month)? as u32;
            let year = if month < today.month() {
                today.year() + 1
            } else if month > today.month() {
                today.year()
            } else if day < today.day() {
                today.year() + 1
            } else {
                today.year()
            };
            NaiveDate::from_ymd_opt(year, month, day)
        }
        [day, month, year] => {
            let day = parse_number(day)? as u32;
            let month = parse_number(month)? as u32;
            let year = parse_number(year)?;
            NaiveDate::from_ymd_opt(year, month, day)
        }
        _ => None,
    }
}

/// Number of days in the calendar month containing `date`
pub fn days_in_month(date: NaiveDate) -> i64 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let first_of_next = NaiveDate::from_ymd_opt(year, month, 1);
    let first_of_this = NaiveDate::from_ymd_opt(date.year(), date.month(), 1);
    match (first_of_this, first_of_next) {
        (Some(start), Some(end)) => (end - start).num_days(),
        _ => 31,
    }
}

/// Format an optional date for the state file
pub fn format_save_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format(SAVE_DATE_FORMAT).to_string(),
        None => UNSET_MARKER.to_string(),
    }
}

/// Parse a date written by `format_save_date`
pub fn parse_save_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.eq_ignore_ascii_case(UNSET_MARKER) || text.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(text, SAVE_DATE_FORMAT).ok()
}

/// Format a date for the item table
pub fn format_display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

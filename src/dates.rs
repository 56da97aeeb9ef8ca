use time::{
    format_description::FormatItem, macros::format_description, Date, Month, OffsetDateTime,
};

use crate::error::{DiaryError, DiaryResult};

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_date(s: &str) -> DiaryResult<Date> {
    Date::parse(s.trim(), DATE_FORMAT)
        .map_err(|_| DiaryError::bad_request(format!("invalid date '{s}', expected YYYY-MM-DD")))
}

pub fn format_date(date: Date) -> String {
    // The format has no fallible components for in-range dates.
    date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}

pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

/// `[start, end)` covering one UTC day. The last representable date has no end.
pub fn day_range(date: Date) -> DiaryResult<(OffsetDateTime, OffsetDateTime)> {
    let next = date
        .next_day()
        .ok_or_else(|| DiaryError::bad_request(format!("date {} is out of range", format_date(date))))?;
    Ok((date.midnight().assume_utc(), next.midnight().assume_utc()))
}

/// Health data is only trusted for today and yesterday.
pub fn is_recent(date: Date, today: Date) -> bool {
    date == today || today.previous_day() == Some(date)
}

/// Parses `YYYY-MM`.
pub fn parse_month(s: &str) -> DiaryResult<(i32, Month)> {
    let bad = || DiaryError::bad_request(format!("invalid month '{s}', expected YYYY-MM"));
    let (y, m) = s.trim().split_once('-').ok_or_else(bad)?;
    if y.len() != 4 || m.len() != 2 {
        return Err(bad());
    }
    let year: i32 = y.parse().map_err(|_| bad())?;
    let month: u8 = m.parse().map_err(|_| bad())?;
    let month = Month::try_from(month).map_err(|_| bad())?;
    Ok((year, month))
}

/// Days of the month, stopping at `until` (inclusive). Empty for future months.
pub fn month_days(year: i32, month: Month, until: Date) -> DiaryResult<Vec<Date>> {
    let first = Date::from_calendar_date(year, month, 1)
        .map_err(|e| DiaryError::bad_request(e.to_string()))?;
    let mut out = Vec::with_capacity(month.length(year) as usize);
    let mut day = first;
    while day.month() == month && day <= until {
        out.push(day);
        match day.next_day() {
            Some(next) => day = next,
            None => break,
        }
    }
    Ok(out)
}

/// serde adapter for `YYYY-MM-DD` dates.
pub mod iso_date {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_date(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod date_tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_and_formats_dates() {
        let d = parse_date("2024-04-26").expect("valid date");
        assert_eq!(d, date!(2024 - 04 - 26));
        assert_eq!(format_date(d), "2024-04-26");
        assert!(parse_date("26/04/2024").is_err());
    }

    #[test]
    fn recent_means_today_or_yesterday() {
        let today = date!(2024 - 03 - 01);
        assert!(is_recent(today, today));
        assert!(is_recent(date!(2024 - 02 - 29), today));
        assert!(!is_recent(date!(2024 - 02 - 28), today));
        assert!(!is_recent(date!(2024 - 03 - 02), today));
    }

    #[test]
    fn day_range_is_half_open_day() {
        let (start, end) = day_range(date!(2024 - 04 - 26)).unwrap();
        assert_eq!(start.date(), date!(2024 - 04 - 26));
        assert_eq!(end.date(), date!(2024 - 04 - 27));
        assert_eq!(end - start, time::Duration::days(1));
    }

    #[test]
    fn day_range_rejects_last_representable_date() {
        let last = parse_date("9999-12-31").unwrap();
        assert!(matches!(day_range(last), Err(DiaryError::BadRequest(_))));
    }

    #[test]
    fn month_days_stop_at_until() {
        let (y, m) = parse_month("2024-02").expect("valid month");
        assert_eq!(month_days(y, m, date!(2024 - 12 - 31)).unwrap().len(), 29);
        assert_eq!(month_days(y, m, date!(2024 - 02 - 10)).unwrap().len(), 10);
        assert!(month_days(y, m, date!(2024 - 01 - 31)).unwrap().is_empty());
        assert!(parse_month("2024-13").is_err());
        assert!(parse_month("24-1").is_err());
    }
}

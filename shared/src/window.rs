//! Calendar listing windows.

use chrono::{DateTime, Datelike, Duration, Month, NaiveDate, SecondsFormat, TimeZone, Utc};

use crate::{Error, Result};

/// Days covered when no month is requested.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

const MONTH_FORMAT_HINT: &str = "Month format must be like 'October' or '2025-12'";

/// Half-open `[start, end)` UTC interval passed to the calendar API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The next `days` days starting at `now`.
    pub fn upcoming(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: now,
            end: now + Duration::days(days),
        }
    }

    /// Resolve an optional month filter.
    ///
    /// - `None`: the next 30 days
    /// - month name (`October`, `oct`): that month of `now`'s year
    /// - `YYYY-MM`: that month
    pub fn resolve(month: Option<&str>, now: DateTime<Utc>) -> Result<Self> {
        match month.map(str::trim).filter(|m| !m.is_empty()) {
            None => Ok(Self::upcoming(now, DEFAULT_WINDOW_DAYS)),
            Some(month) => {
                let (year, month) = parse_month(month, now.year())?;
                Self::calendar_month(year, month)
            }
        }
    }

    /// From the first instant of a month to the first instant of the next.
    pub fn calendar_month(year: i32, month: u32) -> Result<Self> {
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };

        Ok(Self {
            start: month_start(year, month)?,
            end: month_start(next_year, next_month)?,
        })
    }

    pub fn time_min(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn time_max(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

fn parse_month(input: &str, current_year: i32) -> Result<(i32, u32)> {
    if let Ok(month) = input.parse::<Month>() {
        return Ok((current_year, month.number_from_month()));
    }

    NaiveDate::parse_from_str(&format!("{}-01", input), "%Y-%m-%d")
        .map(|date| (date.year(), date.month()))
        .map_err(|_| Error::Validation(MONTH_FORMAT_HINT.to_string()))
}

fn month_start(year: i32, month: u32) -> Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| Error::Validation(MONTH_FORMAT_HINT.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 4, 10, 30, 15).unwrap()
    }

    #[test]
    fn test_no_month_is_next_thirty_days() {
        let window = TimeWindow::resolve(None, now()).unwrap();

        assert_eq!(window.start, now());
        assert_eq!(window.time_min(), "2025-09-04T10:30:15Z");
        assert_eq!(window.time_max(), "2025-10-04T10:30:15Z");
    }

    #[test]
    fn test_blank_month_is_treated_as_absent() {
        let window = TimeWindow::resolve(Some("  "), now()).unwrap();
        assert_eq!(window, TimeWindow::upcoming(now(), 30));
    }

    #[test]
    fn test_month_name_uses_current_year() {
        let window = TimeWindow::resolve(Some("October"), now()).unwrap();

        assert_eq!(window.time_min(), "2025-10-01T00:00:00Z");
        assert_eq!(window.time_max(), "2025-11-01T00:00:00Z");
    }

    #[test]
    fn test_month_name_is_case_insensitive() {
        let lower = TimeWindow::resolve(Some("march"), now()).unwrap();
        let short = TimeWindow::resolve(Some("Mar"), now()).unwrap();

        assert_eq!(lower.time_min(), "2025-03-01T00:00:00Z");
        assert_eq!(lower, short);
    }

    #[test]
    fn test_year_month() {
        let window = TimeWindow::resolve(Some("2026-02"), now()).unwrap();

        assert_eq!(window.time_min(), "2026-02-01T00:00:00Z");
        assert_eq!(window.time_max(), "2026-03-01T00:00:00Z");
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let by_name = TimeWindow::resolve(Some("December"), now()).unwrap();
        assert_eq!(by_name.time_max(), "2026-01-01T00:00:00Z");

        let by_number = TimeWindow::resolve(Some("2025-12"), now()).unwrap();
        assert_eq!(by_number, by_name);
    }

    #[test]
    fn test_invalid_month_formats() {
        for input in ["Octember", "2025-13", "12/2025", "2025"] {
            let err = TimeWindow::resolve(Some(input), now()).unwrap_err();
            assert!(
                matches!(err, Error::Validation(ref msg) if msg == MONTH_FORMAT_HINT),
                "input {}",
                input
            );
        }
    }
}

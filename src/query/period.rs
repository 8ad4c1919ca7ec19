use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;

use crate::date_util::{iso_weeks_in_year, last_day_of_month, quarter_of};
use crate::error::{Error, Result};
use crate::query::filter::DateRange;

static RE_QUARTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-Q([1-4])$").unwrap());
static RE_WEEK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-W(\d{1,2})$").unwrap());
static RE_MONTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap());

/// A calendar period the CLI can name, resolvable to a [`DateRange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    Year(i32),
    Quarter(i32, u8),
    Month(i32, u8),
    Week(i32, u8),
    Rolling(u32, NaiveDate),
    YearToDate(i32),
    QuarterToDate(i32, u8),
    MonthToDate(i32, u8),
}

impl Period {
    /// Parse a period string.
    ///
    /// Supported formats:
    /// - `2025` — year
    /// - `2025-Q1` — quarter
    /// - `2025-01` — month
    /// - `2025-W05` — ISO week
    /// - `30d` — rolling last N days
    /// - `ytd` / `qtd` / `mtd` — year/quarter/month to date
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let today = chrono::Local::now().date_naive();

        match s.to_lowercase().as_str() {
            "ytd" => return Ok(Period::YearToDate(today.year())),
            "qtd" => return Ok(Period::QuarterToDate(today.year(), quarter_of(today))),
            "mtd" => return Ok(Period::MonthToDate(today.year(), today.month() as u8)),
            _ => {}
        }

        // Rolling: "30d", "7d", etc.
        if s.ends_with('d') || s.ends_with('D') {
            if let Ok(n) = s[..s.len() - 1].parse::<u32>() {
                if n > 0 {
                    return Ok(Period::Rolling(n, today));
                }
            }
        }

        // Year: "2025"
        if s.len() == 4 {
            if let Ok(year) = s.parse::<i32>() {
                return Ok(Period::Year(year));
            }
        }

        if let Some(caps) = RE_QUARTER.captures(s) {
            let year: i32 = caps[1].parse().unwrap();
            let q: u8 = caps[2].parse().unwrap();
            return Ok(Period::Quarter(year, q));
        }

        if let Some(caps) = RE_WEEK.captures(s) {
            let year: i32 = caps[1].parse().unwrap();
            let week: u8 = caps[2].parse().unwrap();
            if week >= 1 && week as u32 <= iso_weeks_in_year(year) {
                return Ok(Period::Week(year, week));
            }
            if (1..=53).contains(&week) {
                return Err(Error::PeriodParse(format!("{year} has no ISO week {week}")));
            }
        }

        if let Some(caps) = RE_MONTH.captures(s) {
            let year: i32 = caps[1].parse().unwrap();
            let month: u8 = caps[2].parse().unwrap();
            if (1..=12).contains(&month) {
                return Ok(Period::Month(year, month));
            }
        }

        Err(Error::PeriodParse(format!("unrecognized period: {s}")))
    }

    /// Canonical key string for display.
    pub fn to_key(&self) -> String {
        match self {
            Period::Year(y) => format!("{y}"),
            Period::Quarter(y, q) => format!("{y}-Q{q}"),
            Period::Month(y, m) => format!("{y}-{m:02}"),
            Period::Week(y, w) => format!("{y}-W{w:02}"),
            Period::Rolling(n, _) => format!("{n}d"),
            Period::YearToDate(y) => format!("{y}-ytd"),
            Period::QuarterToDate(y, q) => format!("{y}-Q{q}-td"),
            Period::MonthToDate(y, m) => format!("{y}-{m:02}-td"),
        }
    }

    /// Resolve to an inclusive date range.
    pub fn date_range(&self) -> DateRange {
        let today = chrono::Local::now().date_naive();
        let (start, end) = match self {
            Period::Year(y) => (
                NaiveDate::from_ymd_opt(*y, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(*y, 12, 31).unwrap(),
            ),
            Period::Quarter(y, q) => {
                let start_month = (*q as u32 - 1) * 3 + 1;
                (
                    NaiveDate::from_ymd_opt(*y, start_month, 1).unwrap(),
                    last_day_of_month(*y, *q as u32 * 3),
                )
            }
            Period::Month(y, m) => (
                NaiveDate::from_ymd_opt(*y, *m as u32, 1).unwrap(),
                last_day_of_month(*y, *m as u32),
            ),
            Period::Week(y, w) => {
                // Clamp to the weeks the ISO year actually has so the
                // lookup is total even for hand-built values.
                let w = (*w as u32).clamp(1, iso_weeks_in_year(*y));
                let start = NaiveDate::from_isoywd_opt(*y, w, Weekday::Mon).unwrap();
                (start, start + Duration::days(6))
            }
            Period::Rolling(n, as_of) => (*as_of - Duration::days(*n as i64 - 1), *as_of),
            Period::YearToDate(y) => (NaiveDate::from_ymd_opt(*y, 1, 1).unwrap(), today),
            Period::QuarterToDate(y, q) => {
                let start_month = (*q as u32 - 1) * 3 + 1;
                (NaiveDate::from_ymd_opt(*y, start_month, 1).unwrap(), today)
            }
            Period::MonthToDate(y, m) => {
                (NaiveDate::from_ymd_opt(*y, *m as u32, 1).unwrap(), today)
            }
        };
        DateRange::new(start, end)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_year() {
        assert_eq!(Period::parse("2025").unwrap(), Period::Year(2025));
    }

    #[test]
    fn test_parse_quarter() {
        assert_eq!(Period::parse("2025-Q1").unwrap(), Period::Quarter(2025, 1));
        assert_eq!(Period::parse("2025-Q4").unwrap(), Period::Quarter(2025, 4));
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(Period::parse("2025-01").unwrap(), Period::Month(2025, 1));
        assert_eq!(Period::parse("2025-12").unwrap(), Period::Month(2025, 12));
    }

    #[test]
    fn test_parse_week() {
        assert_eq!(Period::parse("2025-W05").unwrap(), Period::Week(2025, 5));
        assert_eq!(Period::parse("2025-W1").unwrap(), Period::Week(2025, 1));
    }

    #[test]
    fn test_parse_rolling() {
        match Period::parse("30d").unwrap() {
            Period::Rolling(30, _) => {}
            p => panic!("expected Rolling(30, _), got {p:?}"),
        }
        assert!(Period::parse("0d").is_err());
    }

    #[test]
    fn test_parse_to_date() {
        let today = chrono::Local::now().date_naive();
        match Period::parse("ytd").unwrap() {
            Period::YearToDate(y) => assert_eq!(y, today.year()),
            p => panic!("expected YearToDate, got {p:?}"),
        }
        match Period::parse("mtd").unwrap() {
            Period::MonthToDate(y, m) => {
                assert_eq!(y, today.year());
                assert_eq!(m, today.month() as u8);
            }
            p => panic!("expected MonthToDate, got {p:?}"),
        }
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Period::parse("garbage").is_err());
        assert!(Period::parse("2025-Q5").is_err());
        assert!(Period::parse("2025-13").is_err());
    }

    #[test]
    fn test_date_range_quarter() {
        let r = Period::Quarter(2025, 2).date_range();
        assert_eq!(r.start, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        assert_eq!(r.end, NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
    }

    #[test]
    fn test_date_range_month() {
        let r = Period::Month(2025, 2).date_range();
        assert_eq!(r.start, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(r.end, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }

    #[test]
    fn test_date_range_week() {
        let r = Period::Week(2025, 1).date_range();
        assert_eq!(r.start.weekday(), Weekday::Mon);
        assert_eq!(r.len_days(), 7);
    }

    #[test]
    fn test_week_53_only_in_long_iso_years() {
        // 2025 has 52 ISO weeks, 2020 has 53.
        assert!(Period::parse("2025-W53").is_err());
        assert_eq!(Period::parse("2020-W53").unwrap(), Period::Week(2020, 53));

        // A hand-built out-of-range week still resolves to a valid range.
        let r = Period::Week(2025, 53).date_range();
        assert_eq!(r.start, NaiveDate::from_ymd_opt(2025, 12, 22).unwrap());
        assert_eq!(r.len_days(), 7);
    }

    #[test]
    fn test_to_key() {
        assert_eq!(Period::Year(2025).to_key(), "2025");
        assert_eq!(Period::Quarter(2025, 1).to_key(), "2025-Q1");
        assert_eq!(Period::Month(2025, 1).to_key(), "2025-01");
        assert_eq!(Period::Week(2025, 5).to_key(), "2025-W05");
    }
}

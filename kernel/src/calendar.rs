//! Minimal business-calendar support for bitemporal `as_of` convenience
//! queries: "is this a business day", "roll forward to the next one".
//!
//! Grounded on `examples/original_source/decisiongraph-complete/src/kernel/
//! calendars/` for the `BusinessCalendar` shape, but deliberately stops at a
//! generic weekend-excluding implementation — the jurisdiction-specific
//! holiday tables (`canada_ontario.py`, `us_federal.py`) are data content,
//! not engine logic, and are out of scope here.

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};

pub trait BusinessCalendar {
    fn is_business_day(&self, when: DateTime<Utc>) -> bool;

    /// The next business day strictly after `when`, including `when`
    /// itself only if it is not already one.
    fn next_business_day(&self, when: DateTime<Utc>) -> DateTime<Utc> {
        let mut candidate = when;
        loop {
            candidate += Duration::days(1);
            if self.is_business_day(candidate) {
                return candidate;
            }
        }
    }
}

/// A calendar with no holidays: every weekday is a business day, weekends
/// are not. Suitable as a default when no jurisdiction calendar is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekendExcludingCalendar;

impl BusinessCalendar for WeekendExcludingCalendar {
    fn is_business_day(&self, when: DateTime<Utc>) -> bool {
        !matches!(when.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn weekends_are_not_business_days() {
        let cal = WeekendExcludingCalendar;
        let saturday = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        assert_eq!(saturday.weekday(), Weekday::Sat);
        assert!(!cal.is_business_day(saturday));
    }

    #[test]
    fn next_business_day_skips_the_weekend() {
        let cal = WeekendExcludingCalendar;
        let friday = Utc.with_ymd_and_hms(2026, 7, 31, 0, 0, 0).unwrap();
        assert_eq!(friday.weekday(), Weekday::Fri);
        let next = cal.next_business_day(friday);
        assert_eq!(next.weekday(), Weekday::Mon);
    }
}

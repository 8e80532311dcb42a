use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// `date` shifted by `days` calendar days, or `None` outside chrono's date range.
pub fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::try_days(days)?)
}

/// Returns `false` only when the date falls on a weekday the project skips.
pub fn is_working_day(date: NaiveDate, skip_saturday: bool, skip_sunday: bool) -> bool {
    match date.weekday() {
        Weekday::Sun if skip_sunday => false,
        Weekday::Sat if skip_saturday => false,
        _ => true,
    }
}

/// Per-project working week. Sunday is skipped by default, Saturday is worked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkWeek {
    pub skip_saturday: bool,
    pub skip_sunday: bool,
}

impl Default for WorkWeek {
    fn default() -> Self {
        Self {
            skip_saturday: false,
            skip_sunday: true,
        }
    }
}

impl WorkWeek {
    pub fn new(skip_saturday: bool, skip_sunday: bool) -> Self {
        Self {
            skip_saturday,
            skip_sunday,
        }
    }

    /// Every day of the week is a working day.
    pub fn seven_day() -> Self {
        Self::new(false, false)
    }

    /// Check if a date is available for scheduling
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        is_working_day(date, self.skip_saturday, self.skip_sunday)
    }

    /// Find the next working date strictly after `from`. Saturates at `NaiveDate::MAX`.
    pub fn next_working_day(&self, from: NaiveDate) -> NaiveDate {
        match from.succ_opt() {
            Some(next) => self.first_working_day_on_or_after(next),
            None => from,
        }
    }

    /// `from` itself when it is a working day, otherwise the next one
    pub fn first_working_day_on_or_after(&self, from: NaiveDate) -> NaiveDate {
        // At most Saturday and Sunday are skipped, so this terminates within two steps.
        from.iter_days()
            .find(|date| self.is_working_day(*date))
            .unwrap_or(NaiveDate::MAX)
    }

    fn working_days_per_week(&self) -> i64 {
        7 - i64::from(self.skip_saturday) - i64::from(self.skip_sunday)
    }

    /// Date on which the `duration`-th working day counted from `start` (inclusive) is reached.
    ///
    /// A zero duration is treated as one day. When `start` is itself a skipped day the
    /// count begins at the first working day after it. Saturates at `NaiveDate::MAX`.
    pub fn end_date_for(&self, start: NaiveDate, duration: u32) -> NaiveDate {
        let per_week = self.working_days_per_week();
        let mut current = self.first_working_day_on_or_after(start);
        let mut remaining = i64::from(duration.max(1)) - 1;

        // Seven days on from a working day is the same weekday and holds `per_week` working days.
        let full_weeks = remaining / per_week;
        if full_weeks > 0 {
            let Some(jumped) = add_days(current, full_weeks * 7) else {
                return NaiveDate::MAX;
            };
            current = jumped;
            remaining -= full_weeks * per_week;
        }
        while remaining > 0 {
            let next = self.next_working_day(current);
            if next == current {
                break;
            }
            current = next;
            remaining -= 1;
        }
        current
    }

    /// Count working days in the inclusive range `[start, end]`. Zero when `end < start`.
    pub fn count_working_days(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        start
            .iter_days()
            .take_while(|date| *date <= end)
            .filter(|date| self.is_working_day(*date))
            .count() as i64
    }

    /// Get all working days in a date range
    pub fn working_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        start
            .iter_days()
            .take_while(|date| *date <= end)
            .filter(|date| self.is_working_day(*date))
            .collect()
    }

    pub fn skipped_weekdays(&self) -> Vec<Weekday> {
        let mut days = Vec::with_capacity(2);
        if self.skip_saturday {
            days.push(Weekday::Sat);
        }
        if self.skip_sunday {
            days.push(Weekday::Sun);
        }
        days
    }
}

use chrono::{Datelike, NaiveDate, Weekday};
use worksite_planner::calendar::{WorkWeek, is_working_day};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn weekend_flags_control_working_days() {
    // 2025-08-23 is a Saturday, 2025-08-24 a Sunday
    let sat = d(2025, 8, 23);
    let sun = d(2025, 8, 24);
    assert!(is_working_day(sat, false, true));
    assert!(!is_working_day(sun, false, true));
    assert!(!is_working_day(sat, true, false));
    assert!(is_working_day(sun, true, false));
    assert!(is_working_day(sat, false, false));
    assert!(is_working_day(d(2025, 8, 20), true, true));
}

#[test]
fn default_week_skips_only_sunday() {
    let week = WorkWeek::default();
    assert_eq!(week.skipped_weekdays(), vec![Weekday::Sun]);
    assert!(week.is_working_day(d(2025, 8, 23)));
}

#[test]
fn next_working_day_skips_weekend() {
    let week = WorkWeek::new(true, true);
    let next = week.next_working_day(d(2025, 8, 22));
    assert_eq!(next.weekday(), Weekday::Mon);
    assert_eq!(next, d(2025, 8, 25));
    assert_eq!(week.first_working_day_on_or_after(d(2025, 8, 22)), d(2025, 8, 22));
}

#[test]
fn end_date_counts_only_working_days() {
    let week = WorkWeek::default();
    assert_eq!(week.end_date_for(d(2025, 8, 18), 3), d(2025, 8, 20));
    // Friday + 3 working days with Sunday skipped: Fri, Sat, Mon
    assert_eq!(week.end_date_for(d(2025, 8, 22), 3), d(2025, 8, 25));
    // Zero is treated as a single day
    assert_eq!(week.end_date_for(d(2025, 8, 18), 0), d(2025, 8, 18));
}

#[test]
fn end_date_starting_on_skipped_day_begins_counting_after_it() {
    let week = WorkWeek::default();
    assert_eq!(week.end_date_for(d(2025, 8, 24), 1), d(2025, 8, 25));
}

#[test]
fn count_working_days_is_inclusive() {
    let week = WorkWeek::new(true, true);
    assert_eq!(week.count_working_days(d(2025, 8, 18), d(2025, 8, 24)), 5);
    assert_eq!(week.count_working_days(d(2025, 8, 24), d(2025, 8, 18)), 0);
    assert_eq!(
        week.working_days_in_range(d(2025, 8, 22), d(2025, 8, 25)),
        vec![d(2025, 8, 22), d(2025, 8, 25)]
    );
}

fn walk_end(week: WorkWeek, start: NaiveDate, duration: u32) -> NaiveDate {
    let mut date = week.first_working_day_on_or_after(start);
    for _ in 1..duration {
        date = week.next_working_day(date);
    }
    date
}

#[test]
fn end_date_matches_day_by_day_walk() {
    for (skip_sat, skip_sun) in [(false, false), (false, true), (true, false), (true, true)] {
        let week = WorkWeek::new(skip_sat, skip_sun);
        for start in d(2025, 8, 18).iter_days().take(7) {
            for duration in 1..60 {
                assert_eq!(
                    week.end_date_for(start, duration),
                    walk_end(week, start, duration),
                    "{week:?} from {start} for {duration} days"
                );
            }
        }
    }
}

#[test]
fn huge_durations_saturate_instead_of_panicking() {
    let week = WorkWeek::new(true, true);
    let start = d(2025, 8, 18);
    assert_eq!(week.end_date_for(start, 200_000_000), NaiveDate::MAX);
    assert_eq!(week.end_date_for(start, u32::MAX), NaiveDate::MAX);
    assert_eq!(week.next_working_day(NaiveDate::MAX), NaiveDate::MAX);
    assert_eq!(week.end_date_for(NaiveDate::MAX, 3), NaiveDate::MAX);
}

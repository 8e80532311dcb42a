use chrono::{NaiveDate, NaiveTime};
use worksite_planner::timeline::{DayRange, TaskBar, TimelineConfig, TimelineGeometry, TimelineView};
use worksite_planner::{NewProject, NewTask, Project, TaskCategory, TimelineError, WorkWeek};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn scheduled_project() -> Project {
    let project = Project::new(1, NewProject::new("Flat").starting(d(2025, 8, 18)));
    let (project, _) = project.with_task_added(NewTask::new(TaskCategory::WaterElectric, "Wiring", 3));
    let (project, _) = project.with_task_added(NewTask::new(TaskCategory::Masonry, "Tiles", 2));
    let (project, _) = project.with_task_added(NewTask::new(TaskCategory::WaterElectric, "Test", 1));
    project.scheduled()
}

#[test]
fn pixel_and_offset_are_inverse() {
    for width in [1.0, 24.0, 60.0, 37.5] {
        let geometry = TimelineGeometry::new(width).unwrap();
        for n in -400..=400 {
            assert_eq!(geometry.day_offset_from_pixel(geometry.pixel_from_day_offset(n)), n);
        }
    }
}

#[test]
fn date_offsets_ignore_time_of_day() {
    let geometry = TimelineGeometry::new(60.0).unwrap();
    let start = d(2025, 8, 18);
    assert_eq!(geometry.day_offset_from_date(d(2025, 8, 20), start), 2);
    assert_eq!(geometry.day_offset_from_date(d(2025, 8, 16), start), -2);
    let late_evening = d(2025, 8, 20).and_time(NaiveTime::from_hms_opt(23, 59, 0).unwrap());
    assert_eq!(geometry.day_offset_from_datetime(late_evening, start), 2);
    assert_eq!(geometry.date_from_day_offset(2, start), d(2025, 8, 20));
}

#[test]
fn pixel_deltas_round_to_nearest_day() {
    let geometry = TimelineGeometry::new(60.0).unwrap();
    assert_eq!(geometry.day_offset_from_pixel(89.0), 1);
    assert_eq!(geometry.day_offset_from_pixel(91.0), 2);
    assert_eq!(geometry.day_offset_from_pixel(-90.0), -2);
    assert_eq!(geometry.day_offset_from_pixel(-29.0), 0);
}

#[test]
fn invalid_widths_are_rejected() {
    assert_eq!(
        TimelineGeometry::new(f64::INFINITY),
        Err(TimelineError::InvalidDayWidth(f64::INFINITY))
    );
    let config = TimelineConfig {
        day_width_px: -1.0,
        ..TimelineConfig::default()
    };
    assert!(TimelineView::build(&scheduled_project(), &config).is_err());
}

#[test]
fn day_range_flags_working_days_and_caps_length() {
    let week = WorkWeek::default();
    let range = DayRange::new(d(2025, 8, 18), d(2025, 8, 31), &week, 60);
    assert_eq!(range.len(), 14);
    assert!(!range.days[6].is_working_day);
    assert_eq!(range.days[6].offset, 6);

    let capped = DayRange::new(d(2025, 8, 18), d(2025, 12, 31), &week, 10);
    assert_eq!(capped.len(), 10);
    assert_eq!(capped.last, d(2025, 8, 27));
}

#[test]
fn view_groups_bars_by_first_appearing_category() {
    let view = TimelineView::build(&scheduled_project(), &TimelineConfig::default())
        .unwrap()
        .unwrap();
    assert_eq!(view.day_width_px, 60.0);
    assert_eq!(view.range.first, d(2025, 8, 18));
    assert_eq!(view.range.last, d(2025, 8, 23));
    assert_eq!(view.lanes.len(), 2);
    assert_eq!(view.lanes[0].category, TaskCategory::WaterElectric);
    assert_eq!(view.lanes[0].bars.len(), 2);

    let tiles = view.lanes[1].bars[0];
    assert_eq!(tiles.start_offset, 3);
    assert_eq!(tiles.left_px, 180.0);
    assert_eq!(tiles.width_px, 120.0);
}

#[test]
fn view_requires_a_project_start() {
    let project = Project::new(1, NewProject::new("No start"));
    assert_eq!(
        TimelineView::build(&project, &TimelineConfig::default()).unwrap(),
        None
    );
}

#[test]
fn bars_before_the_range_are_not_drawn() {
    let geometry = TimelineGeometry::new(10.0).unwrap();
    let range = DayRange::new(d(2025, 8, 18), d(2025, 8, 25), &WorkWeek::default(), 60);
    let task = worksite_planner::Task::new(1, "Early", 2).with_dates(d(2025, 8, 16), d(2025, 8, 18));
    assert!(TaskBar::layout(&task, d(2025, 8, 18), &range, &geometry).is_none());
    let unscheduled = worksite_planner::Task::new(2, "Later", 2);
    assert!(TaskBar::layout(&unscheduled, d(2025, 8, 18), &range, &geometry).is_none());
}

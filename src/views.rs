//! Read-only view-models computed from a project: kanban columns, the month calendar
//! and the tabular list.

use crate::calendar::WorkWeek;
use crate::project::Project;
use crate::task::{Task, TaskCategory, TaskId, TaskStatus};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KanbanColumn<K> {
    pub key: K,
    pub tasks: Vec<Task>,
}

/// One column per category, every category present even when empty.
pub fn tasks_by_category(project: &Project) -> Vec<KanbanColumn<TaskCategory>> {
    let ordered = project.ordered_tasks();
    TaskCategory::ALL
        .iter()
        .map(|category| KanbanColumn {
            key: *category,
            tasks: ordered
                .iter()
                .filter(|task| task.category == *category)
                .cloned()
                .collect(),
        })
        .collect()
}

pub fn tasks_by_status(project: &Project) -> Vec<KanbanColumn<TaskStatus>> {
    let ordered = project.ordered_tasks();
    TaskStatus::ALL
        .iter()
        .map(|status| KanbanColumn {
            key: *status,
            tasks: ordered
                .iter()
                .filter(|task| task.status == *status)
                .cloned()
                .collect(),
        })
        .collect()
}

/// Scheduled tasks whose date span covers `date`, in `order`.
pub fn tasks_on_date(project: &Project, date: NaiveDate) -> Vec<Task> {
    project
        .ordered_tasks()
        .into_iter()
        .filter(|task| match (task.start_date, task.end_date) {
            (Some(start), Some(end)) => start <= date && date <= end,
            _ => false,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_working_day: bool,
    pub task_ids: Vec<TaskId>,
}

/// Month grid in whole Sunday-first weeks, padded with days of the neighbouring months.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<Vec<CalendarDay>>,
}

impl MonthGrid {
    /// `None` for an invalid month.
    pub fn build(project: &Project, year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let last = next_month.pred_opt()?;

        let lead = i64::from(first.weekday().num_days_from_sunday());
        let grid_start = first.checked_sub_signed(Duration::days(lead))?;
        let trail = 6 - i64::from(last.weekday().num_days_from_sunday());
        let grid_end = last.checked_add_signed(Duration::days(trail))?;

        let week = project.week();
        let days: Vec<CalendarDay> = grid_start
            .iter_days()
            .take_while(|date| *date <= grid_end)
            .map(|date| calendar_day(project, &week, date, month))
            .collect();

        Some(Self {
            year,
            month,
            weeks: days.chunks(7).map(<[CalendarDay]>::to_vec).collect(),
        })
    }

    pub fn days(&self) -> impl Iterator<Item = &CalendarDay> {
        self.weeks.iter().flatten()
    }
}

fn calendar_day(project: &Project, week: &WorkWeek, date: NaiveDate, month: u32) -> CalendarDay {
    CalendarDay {
        date,
        in_month: date.month() == month,
        is_working_day: week.is_working_day(date),
        task_ids: tasks_on_date(project, date)
            .iter()
            .map(|task| task.id)
            .collect(),
    }
}

/// First day of the week the grid starts on.
pub const GRID_FIRST_WEEKDAY: Weekday = Weekday::Sun;

pub const TASK_TABLE_COLUMNS: [&str; 11] = [
    "order",
    "id",
    "category",
    "name",
    "duration",
    "start_date",
    "end_date",
    "status",
    "cost",
    "price",
    "profit",
];

/// The list view as a DataFrame, one row per task in `order`.
pub fn task_table(project: &Project) -> PolarsResult<DataFrame> {
    let tasks = project.ordered_tasks();
    let mut columns: Vec<Column> = Vec::with_capacity(TASK_TABLE_COLUMNS.len());

    let order: Vec<i64> = tasks.iter().map(|t| i64::from(t.order)).collect();
    columns.push(Series::new(PlSmallStr::from_static("order"), order).into_column());

    let ids: Vec<i32> = tasks.iter().map(|t| t.id).collect();
    columns.push(Series::new(PlSmallStr::from_static("id"), ids).into_column());

    let categories: Vec<&str> = tasks.iter().map(|t| t.category.as_str()).collect();
    columns.push(Series::new(PlSmallStr::from_static("category"), categories).into_column());

    let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
    columns.push(Series::new(PlSmallStr::from_static("name"), names).into_column());

    let durations: Vec<i64> = tasks.iter().map(|t| i64::from(t.duration)).collect();
    columns.push(Series::new(PlSmallStr::from_static("duration"), durations).into_column());

    let starts: Vec<Option<i32>> = tasks.iter().map(|t| t.start_date.map(date_to_i32)).collect();
    columns.push(
        Series::new(PlSmallStr::from_static("start_date"), starts)
            .cast(&DataType::Date)?
            .into_column(),
    );
    let ends: Vec<Option<i32>> = tasks.iter().map(|t| t.end_date.map(date_to_i32)).collect();
    columns.push(
        Series::new(PlSmallStr::from_static("end_date"), ends)
            .cast(&DataType::Date)?
            .into_column(),
    );

    let statuses: Vec<String> = tasks.iter().map(|t| t.status.to_string()).collect();
    columns.push(Series::new(PlSmallStr::from_static("status"), statuses).into_column());

    let costs: Vec<f64> = tasks.iter().map(|t| t.cost).collect();
    columns.push(Series::new(PlSmallStr::from_static("cost"), costs).into_column());
    let prices: Vec<f64> = tasks.iter().map(|t| t.price).collect();
    columns.push(Series::new(PlSmallStr::from_static("price"), prices).into_column());
    let profits: Vec<f64> = tasks.iter().map(|t| t.profit).collect();
    columns.push(Series::new(PlSmallStr::from_static("profit"), profits).into_column());

    DataFrame::new(columns)
}

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn date_to_i32(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

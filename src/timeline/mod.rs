//! Pixel geometry of the Gantt timeline and the view-models drawn on it.
//!
//! Every calendar day occupies the same horizontal width, so a date maps to a pixel
//! through its day offset from the project start. Pixel deltas coming back from the
//! pointer are rounded half away from zero to whole days.

pub mod drag;
pub mod editor;

use crate::calendar::{WorkWeek, add_days};
use crate::project::Project;
use crate::task::{Task, TaskCategory, TaskId};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_DAY_WIDTH_PX: f64 = 60.0;
pub const DEFAULT_MAX_VISIBLE_DAYS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    #[error("day width must be a positive finite number of pixels (got {0})")]
    InvalidDayWidth(f64),
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    #[error("task {0} has not been scheduled")]
    TaskNotScheduled(TaskId),
    #[error("project has no start date")]
    NoProjectStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineConfig {
    #[serde(default = "default_day_width")]
    pub day_width_px: f64,
    #[serde(default = "default_max_visible_days")]
    pub max_visible_days: u32,
}

fn default_day_width() -> f64 {
    DEFAULT_DAY_WIDTH_PX
}

fn default_max_visible_days() -> u32 {
    DEFAULT_MAX_VISIBLE_DAYS
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            day_width_px: DEFAULT_DAY_WIDTH_PX,
            max_visible_days: DEFAULT_MAX_VISIBLE_DAYS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineGeometry {
    day_width: f64,
}

impl TimelineGeometry {
    pub fn new(day_width: f64) -> Result<Self, TimelineError> {
        if !day_width.is_finite() || day_width <= 0.0 {
            return Err(TimelineError::InvalidDayWidth(day_width));
        }
        Ok(Self { day_width })
    }

    pub fn from_config(config: &TimelineConfig) -> Result<Self, TimelineError> {
        Self::new(config.day_width_px)
    }

    pub fn day_width(&self) -> f64 {
        self.day_width
    }

    /// Whole days from `project_start` to `date`; negative before the start.
    pub fn day_offset_from_date(&self, date: NaiveDate, project_start: NaiveDate) -> i64 {
        (date - project_start).num_days()
    }

    /// Drops the time of day before measuring, so sub-day timestamps never skew the offset.
    pub fn day_offset_from_datetime(
        &self,
        timestamp: NaiveDateTime,
        project_start: NaiveDate,
    ) -> i64 {
        self.day_offset_from_date(timestamp.date(), project_start)
    }

    /// Saturates at the ends of the supported date range.
    pub fn date_from_day_offset(&self, offset: i64, project_start: NaiveDate) -> NaiveDate {
        add_days(project_start, offset).unwrap_or(if offset < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        })
    }

    pub fn pixel_from_day_offset(&self, offset: i64) -> f64 {
        offset as f64 * self.day_width
    }

    /// Nearest whole day, halves rounded away from zero.
    pub fn day_offset_from_pixel(&self, px: f64) -> i64 {
        (px / self.day_width).round() as i64
    }
}

/// One column of the day grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub offset: i64,
    pub is_working_day: bool,
}

/// Visible span of the timeline, one cell per calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
    pub days: Vec<DayCell>,
}

impl DayRange {
    /// Days from `first` through `last` inclusive, truncated to `max_days` cells.
    pub fn new(first: NaiveDate, last: NaiveDate, week: &WorkWeek, max_days: u32) -> Self {
        let total = ((last - first).num_days() + 1).max(1);
        let visible = total.min(i64::from(max_days.max(1)));
        let days: Vec<DayCell> = first
            .iter_days()
            .zip(0..visible)
            .map(|(date, offset)| DayCell {
                date,
                offset,
                is_working_day: week.is_working_day(date),
            })
            .collect();
        let last = days.last().map_or(first, |cell| cell.date);
        Self { first, last, days }
    }

    /// From the project start through the last scheduled end date.
    pub fn for_project(project: &Project, config: &TimelineConfig) -> Option<Self> {
        let start = project.start_date?;
        let last = project
            .tasks
            .iter()
            .max_by_key(|task| task.order)
            .and_then(|task| task.end_date)
            .unwrap_or(start);
        Some(Self::new(start, last, &project.week(), config.max_visible_days))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Horizontal placement of one task bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskBar {
    pub task_id: TaskId,
    pub start_offset: i64,
    /// Calendar days covered, inclusive of both ends.
    pub span_days: i64,
    pub left_px: f64,
    pub width_px: f64,
}

impl TaskBar {
    /// `None` for unscheduled tasks and for tasks starting outside `range`. Bars running
    /// past the end of the range are clipped to it.
    pub fn layout(
        task: &Task,
        project_start: NaiveDate,
        range: &DayRange,
        geometry: &TimelineGeometry,
    ) -> Option<Self> {
        let (start, end) = (task.start_date?, task.end_date?);
        let start_offset = geometry.day_offset_from_date(start, project_start);
        let end_offset = geometry.day_offset_from_date(end, project_start);
        let visible = range.len() as i64;
        if start_offset < 0 || start_offset >= visible {
            return None;
        }
        let span_days = end_offset - start_offset + 1;
        let drawn = span_days.min(visible - start_offset);
        Some(Self {
            task_id: task.id,
            start_offset,
            span_days,
            left_px: geometry.pixel_from_day_offset(start_offset),
            width_px: geometry.pixel_from_day_offset(drawn),
        })
    }
}

/// Swim lane of the Gantt chart: every bar of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GanttLane {
    pub category: TaskCategory,
    pub bars: Vec<TaskBar>,
}

/// Everything needed to draw a project's timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineView {
    pub day_width_px: f64,
    pub range: DayRange,
    pub lanes: Vec<GanttLane>,
}

impl TimelineView {
    /// Lanes follow the order in which categories first appear in the schedule.
    /// Expects a scheduled project; `None` without a start date.
    pub fn build(project: &Project, config: &TimelineConfig) -> Result<Option<Self>, TimelineError> {
        let geometry = TimelineGeometry::from_config(config)?;
        let Some(start) = project.start_date else {
            return Ok(None);
        };
        let Some(range) = DayRange::for_project(project, config) else {
            return Ok(None);
        };

        let mut lanes: Vec<GanttLane> = Vec::new();
        for task in project.ordered_tasks() {
            let index = match lanes.iter().position(|lane| lane.category == task.category) {
                Some(index) => index,
                None => {
                    lanes.push(GanttLane {
                        category: task.category,
                        bars: Vec::new(),
                    });
                    lanes.len() - 1
                }
            };
            if let Some(bar) = TaskBar::layout(&task, start, &range, &geometry) {
                lanes[index].bars.push(bar);
            }
        }

        Ok(Some(Self {
            day_width_px: geometry.day_width(),
            range,
            lanes,
        }))
    }
}

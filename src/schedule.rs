use crate::calculations::sequential_pass::{Pin, SequentialPass};
use crate::calendar::WorkWeek;
use crate::project::Project;
use crate::task::{Task, TaskId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Why a project cannot be scheduled yet. A precondition to report, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingScheduleInput {
    #[error("project has no start date")]
    NoStartDate,
    #[error("project has no tasks")]
    NoTasks,
}

/// Result of scheduling a stored project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScheduleOutcome {
    Scheduled(ScheduleSummary),
    Skipped { reason: MissingScheduleInput },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub task_count: usize,
    pub first_start: Option<NaiveDate>,
    pub last_finish: Option<NaiveDate>,
    /// Calendar days from the first start through the last finish, inclusive.
    pub calendar_days: i64,
    pub working_days: i64,
}

impl ScheduleSummary {
    pub fn from_tasks(tasks: &[Task], week: &WorkWeek) -> Self {
        let first_start = tasks.iter().filter_map(|task| task.start_date).min();
        let last_finish = tasks.iter().filter_map(|task| task.end_date).max();
        let (calendar_days, working_days) = match (first_start, last_finish) {
            (Some(start), Some(end)) => (
                (end - start).num_days() + 1,
                week.count_working_days(start, end),
            ),
            _ => (0, 0),
        };
        Self {
            task_count: tasks.len(),
            first_start,
            last_finish,
            calendar_days,
            working_days,
        }
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = vec![format!("tasks={}", self.task_count)];
        if let Some(date) = self.first_start {
            parts.push(format!("start={date}"));
        }
        if let Some(date) = self.last_finish {
            parts.push(format!("finish={date}"));
        }
        parts.push(format!("days={}", self.calendar_days));
        parts.push(format!("workdays={}", self.working_days));
        parts.join(", ")
    }
}

/// Assigns start and end dates to every task, walking them in `order`.
///
/// Empty input or a missing project start returns the tasks unchanged. The result is
/// sorted by `order` and running it again on its own output yields the same dates.
pub fn schedule_tasks(
    tasks: &[Task],
    project_start: Option<NaiveDate>,
    skip_saturday: bool,
    skip_sunday: bool,
) -> Vec<Task> {
    let Some(start) = project_start else {
        return tasks.to_vec();
    };
    if tasks.is_empty() {
        return tasks.to_vec();
    }
    let week = WorkWeek::new(skip_saturday, skip_sunday);
    apply_pass(tasks, SequentialPass::new(tasks, &week).execute(start))
}

/// Same as [`schedule_tasks`] except that the pinned task starts on the pinned date and
/// everything after it flows from there.
pub fn schedule_tasks_pinned(
    tasks: &[Task],
    project_start: NaiveDate,
    week: &WorkWeek,
    pin: Option<Pin>,
) -> Vec<Task> {
    if tasks.is_empty() {
        return Vec::new();
    }
    let dates = SequentialPass::new(tasks, week)
        .with_pin(pin)
        .execute(project_start);
    apply_pass(tasks, dates)
}

fn apply_pass(tasks: &[Task], dates: Vec<(TaskId, NaiveDate, NaiveDate)>) -> Vec<Task> {
    let by_id: HashMap<TaskId, &Task> = tasks.iter().map(|task| (task.id, task)).collect();
    dates
        .into_iter()
        .filter_map(|(id, start, end)| {
            by_id
                .get(&id)
                .map(|task| (*task).clone().with_dates(start, end))
        })
        .collect()
}

pub fn check_schedule_inputs(project: &Project) -> Result<NaiveDate, MissingScheduleInput> {
    let start = project
        .start_date
        .ok_or(MissingScheduleInput::NoStartDate)?;
    if project.tasks.is_empty() {
        return Err(MissingScheduleInput::NoTasks);
    }
    Ok(start)
}

impl Project {
    /// The project with freshly computed task dates; unchanged when it cannot be scheduled.
    pub fn scheduled(&self) -> Project {
        let mut project = self.clone();
        project.tasks = schedule_tasks(
            &self.tasks,
            self.start_date,
            self.skip_saturday,
            self.skip_sunday,
        );
        project
    }

    pub fn schedule_summary(&self) -> ScheduleSummary {
        ScheduleSummary::from_tasks(&self.tasks, &self.week())
    }
}

use crate::calendar::WorkWeek;
use crate::task::{Task, TaskId};
use chrono::NaiveDate;

/// A task whose start is fixed at a given date instead of following its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pin {
    pub task_id: TaskId,
    pub start: NaiveDate,
}

/// Lays tasks end to end in `order`, counting only working days toward each duration.
pub struct SequentialPass<'a> {
    tasks: &'a [Task],
    week: &'a WorkWeek,
    pin: Option<Pin>,
}

impl<'a> SequentialPass<'a> {
    pub fn new(tasks: &'a [Task], week: &'a WorkWeek) -> Self {
        Self {
            tasks,
            week,
            pin: None,
        }
    }

    pub fn with_pin(mut self, pin: Option<Pin>) -> Self {
        self.pin = pin;
        self
    }

    /// Returns `(task_id, start, end)` for every task, in ascending `order`.
    ///
    /// The cursor starts at `project_start` as given; only the hand-off between tasks is
    /// moved onto a working day.
    pub fn execute(&self, project_start: NaiveDate) -> Vec<(TaskId, NaiveDate, NaiveDate)> {
        let mut ordered: Vec<&Task> = self.tasks.iter().collect();
        ordered.sort_by_key(|task| task.order);

        let mut results = Vec::with_capacity(ordered.len());
        let mut cursor = project_start;
        for task in ordered {
            if let Some(pin) = self.pin.filter(|pin| pin.task_id == task.id) {
                cursor = pin.start;
            }
            let start = cursor;
            let end = self.week.end_date_for(start, task.duration);
            results.push((task.id, start, end));

            cursor = self.week.next_working_day(end);
        }
        results
    }
}

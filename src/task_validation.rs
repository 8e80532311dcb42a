use crate::project::Project;
use crate::task::Task;
use std::collections::HashSet;
use thiserror::Error;

const EPSILON: f64 = 1e-6;

/// Longest task the planner accepts, in work days.
pub const MAX_TASK_DURATION: u32 = 36_500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TaskValidationError {
    message: String,
}

impl TaskValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

fn approx_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

fn check_amount(task: &Task, field: &str, value: f64) -> Result<(), TaskValidationError> {
    if !value.is_finite() || value < -EPSILON {
        return Err(TaskValidationError::new(format!(
            "task {} has invalid {field} {value} (must be a non-negative amount)",
            task.id
        )));
    }
    Ok(())
}

pub fn validate_task(task: &Task) -> Result<(), TaskValidationError> {
    if task.duration < 1 {
        return Err(TaskValidationError::new(format!(
            "task {} has duration {} (must be at least one work day)",
            task.id, task.duration
        )));
    }
    if task.duration > MAX_TASK_DURATION {
        return Err(TaskValidationError::new(format!(
            "task {} has duration {} (at most {MAX_TASK_DURATION} work days)",
            task.id, task.duration
        )));
    }

    check_amount(task, "cost", task.cost)?;
    check_amount(task, "price", task.price)?;
    if !approx_equal(task.profit, task.price - task.cost) {
        return Err(TaskValidationError::new(format!(
            "task {} profit {} does not equal price {} minus cost {}",
            task.id, task.profit, task.price, task.cost
        )));
    }

    if let (Some(start), Some(end)) = (task.start_date, task.end_date) {
        if start > end {
            return Err(TaskValidationError::new(format!(
                "task {} starts on {start} after it ends on {end}",
                task.id
            )));
        }
    }

    Ok(())
}

/// Checks every task plus the collection invariants: unique ids and an `order` that is a
/// dense permutation of `0..n`.
pub fn validate_task_collection(tasks: &[Task]) -> Result<(), TaskValidationError> {
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    let mut seen_orders = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(task.id) {
            return Err(TaskValidationError::new(format!(
                "duplicate task id {}",
                task.id
            )));
        }
        if task.order as usize >= tasks.len() || !seen_orders.insert(task.order) {
            return Err(TaskValidationError::new(format!(
                "task {} has order {} outside a dense 0..{} sequence",
                task.id,
                task.order,
                tasks.len()
            )));
        }
        validate_task(task)?;
    }
    Ok(())
}

pub fn validate_project(project: &Project) -> Result<(), TaskValidationError> {
    if project.name.trim().is_empty() {
        return Err(TaskValidationError::new(format!(
            "project {} requires a non-empty name",
            project.id
        )));
    }
    validate_task_collection(&project.tasks)
}

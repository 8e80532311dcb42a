use crate::calculations::sequential_pass::Pin;
use crate::persistence::{PersistenceError, TaskStore};
use crate::project::{Project, ProjectId};
use crate::schedule::schedule_tasks_pinned;
use crate::task::{Task, TaskId, TaskPatch};
use crate::timeline::TimelineError;
use crate::timeline::drag::{ProposedChange, ScheduleSlot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, info, warn};

/// A downstream task whose dates move if the change cascades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedTask {
    pub task_id: TaskId,
    pub name: String,
    pub order: u32,
    pub before: Option<ScheduleSlot>,
    pub after: ScheduleSlot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CascadePlan {
    pub change: ProposedChange,
    /// Tasks ordered after the changed one whose dates would change, in `order`.
    pub affected: Vec<AffectedTask>,
    /// Every task of the project after rerunning the scheduler with the change applied.
    pub rescheduled: Vec<Task>,
}

impl CascadePlan {
    pub fn requires_confirmation(&self) -> bool {
        !self.affected.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeDecision {
    /// Reschedule the whole project.
    Confirmed,
    /// Change only the dragged task; downstream dates may now overlap it.
    Declined,
}

/// Asks the user whether a change may reschedule downstream tasks.
pub trait ConfirmCascade {
    fn confirm(&mut self, plan: &CascadePlan) -> CascadeDecision;
}

impl<F> ConfirmCascade for F
where
    F: FnMut(&CascadePlan) -> CascadeDecision,
{
    fn confirm(&mut self, plan: &CascadePlan) -> CascadeDecision {
        self(plan)
    }
}

/// Works out the downstream impact of a proposed change on a scheduled project.
pub struct CascadeResolver<'a> {
    project: &'a Project,
}

impl<'a> CascadeResolver<'a> {
    pub fn new(project: &'a Project) -> Self {
        Self { project }
    }

    /// Reruns the scheduler with the changed task pinned at its proposed start and new
    /// duration, then compares every later task against its current dates.
    pub fn resolve(&self, change: &ProposedChange) -> Result<CascadePlan, TimelineError> {
        let project_start = self.project.start_date.ok_or(TimelineError::NoProjectStart)?;
        let target = self
            .project
            .find_task(change.task_id)
            .ok_or(TimelineError::TaskNotFound(change.task_id))?;
        let target_order = target.order;

        let tasks: Vec<Task> = self
            .project
            .tasks
            .iter()
            .map(|task| {
                if task.id == change.task_id {
                    let mut changed = task.clone();
                    changed.duration = change.proposed.duration;
                    changed
                } else {
                    task.clone()
                }
            })
            .collect();
        let pin = Pin {
            task_id: change.task_id,
            start: change.proposed.start,
        };
        let rescheduled = schedule_tasks_pinned(&tasks, project_start, &self.project.week(), Some(pin));

        let current: HashMap<TaskId, &Task> =
            self.project.tasks.iter().map(|task| (task.id, task)).collect();
        let affected = rescheduled
            .iter()
            .filter(|task| task.order > target_order)
            .filter_map(|task| {
                let after = ScheduleSlot::of(task)?;
                let before = current.get(&task.id).and_then(|task| ScheduleSlot::of(task));
                (before != Some(after)).then(|| AffectedTask {
                    task_id: task.id,
                    name: task.name.clone(),
                    order: task.order,
                    before,
                    after,
                })
            })
            .collect();

        Ok(CascadePlan {
            change: *change,
            affected,
            rescheduled,
        })
    }
}

#[derive(Debug, Error)]
#[error("failed to persist change to task {task_id}: {source}")]
pub struct CommitError {
    pub task_id: TaskId,
    #[source]
    pub source: PersistenceError,
    /// Whether every write made before the failure was undone.
    pub rolled_back: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReport {
    /// `None` when nothing downstream was affected and no question was asked.
    pub decision: Option<CascadeDecision>,
    pub updated: Vec<TaskId>,
}

/// Writes a resolved change through the store.
///
/// `Confirmed` persists the recomputed dates of every task; anything else writes the
/// proposed slot to the changed task alone. If a write fails, earlier writes of this
/// commit are restored from `project` before the error is returned.
pub fn commit_change<S>(
    store: &mut S,
    project: &Project,
    plan: &CascadePlan,
    decision: Option<CascadeDecision>,
) -> Result<CommitReport, CommitError>
where
    S: TaskStore + ?Sized,
{
    let change = &plan.change;
    let writes: Vec<(TaskId, TaskPatch)> = match decision {
        Some(CascadeDecision::Confirmed) => plan
            .rescheduled
            .iter()
            .filter_map(|task| {
                let mut patch = TaskPatch::schedule(task.start_date?, task.end_date?);
                if task.id == change.task_id {
                    patch.duration = Some(change.proposed.duration);
                }
                Some((task.id, patch))
            })
            .collect(),
        _ => vec![(change.task_id, change.patch())],
    };

    let mut written = Vec::with_capacity(writes.len());
    for (task_id, patch) in &writes {
        if let Err(source) = store.update_task(project.id, *task_id, patch) {
            error!(
                project_id = project.id,
                task_id,
                error = %source,
                "persisting drag change failed"
            );
            let rolled_back = roll_back(store, project, &written);
            return Err(CommitError {
                task_id: *task_id,
                source,
                rolled_back,
            });
        }
        written.push(*task_id);
    }

    info!(
        project_id = project.id,
        task_id = change.task_id,
        kind = %change.kind,
        delta_days = change.delta_days,
        updated = written.len(),
        "drag change committed"
    );
    Ok(CommitReport {
        decision,
        updated: written,
    })
}

fn roll_back<S>(store: &mut S, project: &Project, written: &[TaskId]) -> bool
where
    S: TaskStore + ?Sized,
{
    let mut clean = true;
    for task_id in written.iter().rev() {
        let Some(task) = project.find_task(*task_id) else {
            continue;
        };
        let patch = TaskPatch {
            duration: Some(task.duration),
            start_date: Some(task.start_date),
            end_date: Some(task.end_date),
            ..TaskPatch::default()
        };
        if let Err(err) = store.update_task(project.id, *task_id, &patch) {
            warn!(project_id = project.id, task_id, error = %err, "rollback write failed");
            clean = false;
        }
    }
    clean
}

/// One-line description of a plan, used for prompts and logs.
pub fn describe_plan(project_id: ProjectId, plan: &CascadePlan) -> String {
    let names = plan
        .affected
        .iter()
        .map(|task| format!("#{} {}", task.task_id, task.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "project {project_id}: moving task {} affects {} later task(s): {names}",
        plan.change.task_id,
        plan.affected.len()
    )
}

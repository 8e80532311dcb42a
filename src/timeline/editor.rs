use super::drag::{DragContext, DragController, DragKind, DragPreview, ProposedChange};
use super::{TimelineError, TimelineGeometry};
use crate::calculations::cascade::{
    CascadeDecision, CascadeResolver, ConfirmCascade, commit_change, describe_plan,
};
use crate::persistence::{PersistenceError, TaskStore};
use crate::project::ProjectId;
use crate::task::TaskId;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

/// What happened when a gesture ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EditOutcome {
    /// Nothing was dragged or the bar landed where it started.
    NoChange,
    Committed {
        change: ProposedChange,
        /// `None` when no later task was affected and nobody was asked.
        decision: Option<CascadeDecision>,
        updated: Vec<TaskId>,
    },
    /// Persisting failed; the bar goes back to `restore`.
    Reverted {
        change: ProposedChange,
        restore: DragPreview,
        error: String,
    },
}

/// Gantt editing session over one stored project.
///
/// Wraps a [`DragController`] and, when a gesture ends, decides with the user whether the
/// change cascades and writes it through the store.
#[derive(Debug, Clone)]
pub struct TimelineEditor {
    project_id: ProjectId,
    controller: DragController,
    project_start: Option<NaiveDate>,
}

impl TimelineEditor {
    pub fn new(project_id: ProjectId, geometry: TimelineGeometry) -> Self {
        Self {
            project_id,
            controller: DragController::new(geometry),
            project_start: None,
        }
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn controller(&self) -> &DragController {
        &self.controller
    }

    pub fn preview(&self) -> Option<DragPreview> {
        self.controller.preview()
    }

    pub fn pointer_down<S>(
        &mut self,
        store: &S,
        task_id: TaskId,
        kind: DragKind,
        pointer_x: f64,
    ) -> Result<bool, EditorError>
    where
        S: TaskStore + ?Sized,
    {
        if self.controller.is_dragging() {
            return Ok(false);
        }
        let project = store.get_project(self.project_id)?;
        let project_start = project.start_date.ok_or(TimelineError::NoProjectStart)?;
        let task = project
            .find_task(task_id)
            .ok_or(TimelineError::TaskNotFound(task_id))?;
        let context = DragContext {
            project_start,
            week: project.week(),
        };
        let started = self.controller.pointer_down(task, kind, pointer_x, context)?;
        if started {
            self.project_start = Some(project_start);
        }
        Ok(started)
    }

    pub fn pointer_move(&mut self, pointer_x: f64) -> Option<DragPreview> {
        self.controller.pointer_move(pointer_x)
    }

    pub fn pointer_up<S, C>(&mut self, store: &mut S, pointer_x: f64, confirm: &mut C) -> EditOutcome
    where
        S: TaskStore + ?Sized,
        C: ConfirmCascade + ?Sized,
    {
        match self.controller.pointer_up(pointer_x) {
            Some(change) => self.commit(store, change, confirm),
            None => EditOutcome::NoChange,
        }
    }

    /// Leaving the surface commits like a release.
    pub fn pointer_leave<S, C>(
        &mut self,
        store: &mut S,
        pointer_x: f64,
        confirm: &mut C,
    ) -> EditOutcome
    where
        S: TaskStore + ?Sized,
        C: ConfirmCascade + ?Sized,
    {
        match self.controller.pointer_leave(pointer_x) {
            Some(change) => self.commit(store, change, confirm),
            None => EditOutcome::NoChange,
        }
    }

    pub fn cancel(&mut self) -> Option<DragPreview> {
        self.controller.cancel()
    }

    fn commit<S, C>(&mut self, store: &mut S, change: ProposedChange, confirm: &mut C) -> EditOutcome
    where
        S: TaskStore + ?Sized,
        C: ConfirmCascade + ?Sized,
    {
        let project = match store.get_project(self.project_id) {
            Ok(project) => project,
            Err(err) => return self.revert(change, err.to_string()),
        };
        let plan = match CascadeResolver::new(&project).resolve(&change) {
            Ok(plan) => plan,
            Err(err) => return self.revert(change, err.to_string()),
        };

        let decision = if plan.requires_confirmation() {
            info!("{}", describe_plan(self.project_id, &plan));
            Some(confirm.confirm(&plan))
        } else {
            None
        };

        match commit_change(store, &project, &plan, decision) {
            Ok(report) => EditOutcome::Committed {
                change,
                decision: report.decision,
                updated: report.updated,
            },
            Err(err) => {
                if !err.rolled_back {
                    error!(
                        project_id = self.project_id,
                        task_id = change.task_id,
                        "store may hold a partially applied change"
                    );
                }
                self.revert(change, err.to_string())
            }
        }
    }

    fn revert(&self, change: ProposedChange, reason: String) -> EditOutcome {
        error!(
            project_id = self.project_id,
            task_id = change.task_id,
            error = %reason,
            "drag change reverted"
        );
        let preview_offset_days = self.project_start.map_or(0, |start| {
            self.controller
                .geometry()
                .day_offset_from_date(change.original.start, start)
        });
        EditOutcome::Reverted {
            change,
            restore: DragPreview {
                task_id: change.task_id,
                preview_offset_days,
                preview_duration: i64::from(change.original.duration),
            },
            error: reason,
        }
    }
}

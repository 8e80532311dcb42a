use crate::project::{NewProject, Project, ProjectId, ProjectPatch};
use crate::schedule::{ScheduleOutcome, check_schedule_inputs};
use crate::task::{NewTask, Task, TaskId, TaskPatch};
use crate::task_validation::{self, TaskValidationError};
use chrono::Utc;
use std::collections::BTreeMap;
use std::io;
use thiserror::Error;
use tracing::{debug, info};

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    JsonFileStore, export_tasks_to_csv, load_projects_from_json, save_projects_to_json,
};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),
    #[error("task {task_id} not found in project {project_id}")]
    TaskNotFound {
        project_id: ProjectId,
        task_id: TaskId,
    },
    #[error("store format version '{found}' is not supported (expected '{expected}')")]
    IncompatibleVersion {
        found: String,
        expected: &'static str,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<TaskValidationError> for PersistenceError {
    fn from(value: TaskValidationError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Owner of projects and their tasks.
///
/// Implementors provide the primitive operations; task-level edits are derived from them
/// through the pure `Project` operations, so every store keeps the same `order` rules.
pub trait TaskStore {
    /// Projects with their tasks sorted by `order`.
    fn list_projects(&self) -> PersistenceResult<Vec<Project>>;

    fn get_project(&self, project_id: ProjectId) -> PersistenceResult<Project>;

    /// Inserts or replaces a whole project, stamping `updated_at`.
    fn save_project(&mut self, project: Project) -> PersistenceResult<Project>;

    /// Removes a project and every task it owns.
    fn delete_project(&mut self, project_id: ProjectId) -> PersistenceResult<bool>;

    /// Partial update of one task. Called once per task when a whole project is
    /// rescheduled, so it must tolerate tight sequences of calls. A failed update leaves
    /// the task as it was.
    fn update_task(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
        patch: &TaskPatch,
    ) -> PersistenceResult<()>;

    fn next_project_id(&self) -> PersistenceResult<ProjectId>;

    fn create_project(&mut self, draft: NewProject) -> PersistenceResult<Project> {
        let id = self.next_project_id()?;
        let project = self.save_project(Project::new(id, draft))?;
        info!(project_id = id, name = %project.name, "project created");
        Ok(project)
    }

    fn update_project(
        &mut self,
        project_id: ProjectId,
        patch: &ProjectPatch,
    ) -> PersistenceResult<Project> {
        let project = self.get_project(project_id)?;
        self.save_project(project.patched(patch))
    }

    /// Appends a task with `order` equal to the current task count and no dates.
    fn add_task(&mut self, project_id: ProjectId, draft: NewTask) -> PersistenceResult<Task> {
        let project = self.get_project(project_id)?;
        let (project, task) = project.with_task_added(draft);
        self.save_project(project)?;
        debug!(project_id, task_id = task.id, order = task.order, "task added");
        Ok(task)
    }

    /// Deletes a task and closes the gap it leaves in `order`.
    fn delete_task(&mut self, project_id: ProjectId, task_id: TaskId) -> PersistenceResult<bool> {
        let project = self.get_project(project_id)?;
        match project.without_task(task_id) {
            Some(project) => {
                self.save_project(project)?;
                debug!(project_id, task_id, "task deleted");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn reorder_tasks(
        &mut self,
        project_id: ProjectId,
        dragged: TaskId,
        target: TaskId,
    ) -> PersistenceResult<bool> {
        let project = self.get_project(project_id)?;
        match project.reordered(dragged, target) {
            Some(project) => {
                self.save_project(project)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Runs the sequential scheduler and writes every task's dates back one by one.
    fn apply_schedule(&mut self, project_id: ProjectId) -> PersistenceResult<ScheduleOutcome> {
        let project = self.get_project(project_id)?;
        if let Err(reason) = check_schedule_inputs(&project) {
            debug!(project_id, %reason, "schedule skipped");
            return Ok(ScheduleOutcome::Skipped { reason });
        }
        let scheduled = project.scheduled();
        for task in &scheduled.tasks {
            if let (Some(start), Some(end)) = (task.start_date, task.end_date) {
                self.update_task(project_id, task.id, &TaskPatch::schedule(start, end))?;
            }
        }
        let summary = scheduled.schedule_summary();
        info!(project_id, summary = %summary.to_cli_summary(), "schedule applied");
        Ok(ScheduleOutcome::Scheduled(summary))
    }
}

/// In-memory store; also the working set behind [`JsonFileStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskStore {
    projects: BTreeMap<ProjectId, Project>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_projects(projects: Vec<Project>) -> PersistenceResult<Self> {
        let mut store = Self::new();
        for mut project in projects {
            task_validation::validate_project(&project)?;
            project.tasks.sort_by_key(|task| task.order);
            store.projects.insert(project.id, project);
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

impl TaskStore for MemoryTaskStore {
    fn list_projects(&self) -> PersistenceResult<Vec<Project>> {
        Ok(self.projects.values().cloned().collect())
    }

    fn get_project(&self, project_id: ProjectId) -> PersistenceResult<Project> {
        self.projects
            .get(&project_id)
            .cloned()
            .ok_or(PersistenceError::ProjectNotFound(project_id))
    }

    fn save_project(&mut self, mut project: Project) -> PersistenceResult<Project> {
        task_validation::validate_project(&project)?;
        project.tasks.sort_by_key(|task| task.order);
        project.updated_at = Utc::now();
        self.projects.insert(project.id, project.clone());
        Ok(project)
    }

    fn delete_project(&mut self, project_id: ProjectId) -> PersistenceResult<bool> {
        Ok(self.projects.remove(&project_id).is_some())
    }

    fn update_task(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
        patch: &TaskPatch,
    ) -> PersistenceResult<()> {
        let project = self
            .projects
            .get_mut(&project_id)
            .ok_or(PersistenceError::ProjectNotFound(project_id))?;
        let task = project
            .tasks
            .iter_mut()
            .find(|task| task.id == task_id)
            .ok_or(PersistenceError::TaskNotFound {
                project_id,
                task_id,
            })?;
        let updated = task.patched(patch);
        task_validation::validate_task(&updated)?;
        *task = updated;
        project.updated_at = Utc::now();
        Ok(())
    }

    fn next_project_id(&self) -> PersistenceResult<ProjectId> {
        Ok(self.projects.keys().max().map_or(1, |max| max + 1))
    }
}

use super::{MemoryTaskStore, PersistenceError, PersistenceResult, TaskStore};
use crate::project::{Project, ProjectId};
use crate::task::{Task, TaskId, TaskPatch};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const STORE_FORMAT_VERSION: &str = "1.0.0";

#[derive(Serialize, Deserialize)]
struct ProjectsSnapshot {
    version: String,
    saved_at: DateTime<Utc>,
    projects: Vec<Project>,
}

pub fn save_projects_to_json<P: AsRef<Path>>(
    projects: &[Project],
    path: P,
) -> PersistenceResult<()> {
    let snapshot = ProjectsSnapshot {
        version: STORE_FORMAT_VERSION.to_string(),
        saved_at: Utc::now(),
        projects: projects.to_vec(),
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_projects_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Project>> {
    let file = File::open(path)?;
    let snapshot: ProjectsSnapshot = serde_json::from_reader(file)?;
    if snapshot.version != STORE_FORMAT_VERSION {
        return Err(PersistenceError::IncompatibleVersion {
            found: snapshot.version,
            expected: STORE_FORMAT_VERSION,
        });
    }
    let store = MemoryTaskStore::from_projects(snapshot.projects)?;
    store.list_projects()
}

/// Store that keeps everything in memory and rewrites a JSON snapshot after every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryTaskStore,
}

impl JsonFileStore {
    /// Opens the snapshot at `path`. A missing file starts empty; a snapshot written by an
    /// incompatible version is discarded with a warning and overwritten on the next save.
    pub fn open<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let path = path.as_ref().to_path_buf();
        let inner = if path.exists() {
            match load_projects_from_json(&path) {
                Ok(projects) => MemoryTaskStore::from_projects(projects)?,
                Err(PersistenceError::IncompatibleVersion { found, expected }) => {
                    warn!(
                        path = %path.display(),
                        %found,
                        expected,
                        "discarding snapshot written by an incompatible version"
                    );
                    MemoryTaskStore::new()
                }
                Err(err) => return Err(err),
            }
        } else {
            MemoryTaskStore::new()
        };
        debug!(path = %path.display(), projects = inner.len(), "json store opened");
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn flush(&self) -> PersistenceResult<()> {
        save_projects_to_json(&self.inner.list_projects()?, &self.path)
    }

    /// Flushes after a change to `project_id`; on failure puts `previous` back so memory
    /// never runs ahead of the file.
    fn flush_or_restore(
        &mut self,
        project_id: ProjectId,
        previous: Option<Project>,
    ) -> PersistenceResult<()> {
        let Err(err) = self.flush() else {
            return Ok(());
        };
        warn!(
            path = %self.path.display(),
            project_id,
            error = %err,
            "snapshot write failed; change rolled back"
        );
        match previous {
            Some(project) => self.inner.projects.insert(project_id, project),
            None => self.inner.projects.remove(&project_id),
        };
        Err(err)
    }
}

impl TaskStore for JsonFileStore {
    fn list_projects(&self) -> PersistenceResult<Vec<Project>> {
        self.inner.list_projects()
    }

    fn get_project(&self, project_id: ProjectId) -> PersistenceResult<Project> {
        self.inner.get_project(project_id)
    }

    fn save_project(&mut self, project: Project) -> PersistenceResult<Project> {
        let project_id = project.id;
        let previous = self.inner.projects.get(&project_id).cloned();
        let saved = self.inner.save_project(project)?;
        self.flush_or_restore(project_id, previous)?;
        Ok(saved)
    }

    fn delete_project(&mut self, project_id: ProjectId) -> PersistenceResult<bool> {
        let Some(previous) = self.inner.projects.get(&project_id).cloned() else {
            return Ok(false);
        };
        self.inner.delete_project(project_id)?;
        self.flush_or_restore(project_id, Some(previous))?;
        Ok(true)
    }

    fn update_task(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
        patch: &TaskPatch,
    ) -> PersistenceResult<()> {
        let previous = self.inner.projects.get(&project_id).cloned();
        self.inner.update_task(project_id, task_id, patch)?;
        self.flush_or_restore(project_id, previous)
    }

    fn next_project_id(&self) -> PersistenceResult<ProjectId> {
        self.inner.next_project_id()
    }
}

#[derive(Default, Serialize, Deserialize)]
struct TaskCsvRecord {
    id: i32,
    order: u32,
    category: String,
    name: String,
    duration: u32,
    cost: f64,
    price: f64,
    profit: f64,
    status: String,
    start_date: String,
    end_date: String,
}

impl From<&Task> for TaskCsvRecord {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            order: task.order,
            category: task.category.to_string(),
            name: task.name.clone(),
            duration: task.duration,
            cost: task.cost,
            price: task.price,
            profit: task.profit,
            status: task.status.to_string(),
            start_date: format_date(task.start_date),
            end_date: format_date(task.end_date),
        }
    }
}

/// Writes the project's tasks, in `order`, as CSV.
pub fn export_tasks_to_csv<P: AsRef<Path>>(project: &Project, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for task in project.ordered_tasks() {
        writer.serialize(TaskCsvRecord::from(&task))?;
    }
    writer.flush()?;
    Ok(())
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

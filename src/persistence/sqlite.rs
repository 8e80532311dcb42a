use super::{PersistenceError, PersistenceResult, TaskStore};
use crate::project::{Project, ProjectId};
use crate::task::{Task, TaskId, TaskPatch};
use crate::task_validation;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::sync::{Mutex, MutexGuard};

/// One row per project (without its tasks) and one row per task.
pub struct SqliteTaskStore {
    connection: Mutex<Connection>,
}

impl SqliteTaskStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY,
                project_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS tasks (
                project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                task_json TEXT NOT NULL,
                PRIMARY KEY (project_id, id)
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::Unavailable("sqlite mutex poisoned".into()))
    }

    fn load_project(connection: &Connection, project_id: ProjectId) -> PersistenceResult<Project> {
        let project_json: Option<String> = connection
            .query_row(
                "SELECT project_json FROM projects WHERE id = ?1",
                params![project_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(project_json) = project_json else {
            return Err(PersistenceError::ProjectNotFound(project_id));
        };
        let mut project: Project = serde_json::from_str(&project_json)?;

        let mut stmt = connection
            .prepare("SELECT task_json FROM tasks WHERE project_id = ?1 ORDER BY position ASC")?;
        let rows = stmt.query_map(params![project_id], |row| row.get::<_, String>(0))?;
        let mut tasks = Vec::new();
        for json in rows {
            let task: Task = serde_json::from_str(&json?)?;
            tasks.push(task);
        }
        project.tasks = tasks;
        Ok(project)
    }

    fn write_project(tx: &Transaction, project: &Project) -> PersistenceResult<()> {
        let mut header = project.clone();
        header.tasks = Vec::new();
        let json = serde_json::to_string(&header)?;
        tx.execute(
            "INSERT INTO projects (id, project_json) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET project_json = excluded.project_json",
            params![project.id, json],
        )?;
        Ok(())
    }

    fn write_tasks(tx: &Transaction, project: &Project) -> PersistenceResult<()> {
        tx.execute(
            "DELETE FROM tasks WHERE project_id = ?1",
            params![project.id],
        )?;
        let mut stmt = tx.prepare(
            "INSERT INTO tasks (project_id, id, position, task_json) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for task in &project.tasks {
            let json = serde_json::to_string(task)?;
            stmt.execute(params![project.id, task.id, task.order, json])?;
        }
        Ok(())
    }
}

impl TaskStore for SqliteTaskStore {
    fn list_projects(&self) -> PersistenceResult<Vec<Project>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id FROM projects ORDER BY id ASC")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, ProjectId>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        ids.into_iter()
            .map(|id| Self::load_project(&conn, id))
            .collect()
    }

    fn get_project(&self, project_id: ProjectId) -> PersistenceResult<Project> {
        let conn = self.lock()?;
        Self::load_project(&conn, project_id)
    }

    fn save_project(&mut self, mut project: Project) -> PersistenceResult<Project> {
        task_validation::validate_project(&project)?;
        project.tasks.sort_by_key(|task| task.order);
        project.updated_at = Utc::now();

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::write_project(&tx, &project)?;
        Self::write_tasks(&tx, &project)?;
        tx.commit()?;
        Ok(project)
    }

    fn delete_project(&mut self, project_id: ProjectId) -> PersistenceResult<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM tasks WHERE project_id = ?1",
            params![project_id],
        )?;
        let removed = tx.execute("DELETE FROM projects WHERE id = ?1", params![project_id])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn update_task(
        &mut self,
        project_id: ProjectId,
        task_id: TaskId,
        patch: &TaskPatch,
    ) -> PersistenceResult<()> {
        let conn = self.lock()?;
        let task_json: Option<String> = conn
            .query_row(
                "SELECT task_json FROM tasks WHERE project_id = ?1 AND id = ?2",
                params![project_id, task_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(task_json) = task_json else {
            let project_exists: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM projects WHERE id = ?1",
                    params![project_id],
                    |row| row.get(0),
                )
                .optional()?;
            return Err(match project_exists {
                Some(_) => PersistenceError::TaskNotFound {
                    project_id,
                    task_id,
                },
                None => PersistenceError::ProjectNotFound(project_id),
            });
        };

        let task: Task = serde_json::from_str(&task_json)?;
        let updated = task.patched(patch);
        task_validation::validate_task(&updated)?;
        conn.execute(
            "UPDATE tasks SET task_json = ?3 WHERE project_id = ?1 AND id = ?2",
            params![project_id, task_id, serde_json::to_string(&updated)?],
        )?;
        Ok(())
    }

    fn next_project_id(&self) -> PersistenceResult<ProjectId> {
        let conn = self.lock()?;
        let next = conn.query_row(
            "SELECT COALESCE(MAX(id), 0) + 1 FROM projects",
            [],
            |row| row.get::<_, ProjectId>(0),
        )?;
        Ok(next)
    }
}

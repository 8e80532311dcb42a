use crate::calendar::WorkWeek;
use crate::task::{NewTask, Task, TaskId, TaskPatch};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type ProjectId = i32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Earliest date the schedule may begin. Nothing is scheduled while unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub skip_saturday: bool,
    #[serde(default = "default_skip_sunday")]
    pub skip_sunday: bool,
    /// Kept sorted by `order`.
    #[serde(default)]
    pub tasks: Vec<Task>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_skip_sunday() -> bool {
    true
}

/// Fields accepted when creating a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub skip_saturday: bool,
    #[serde(default = "default_skip_sunday")]
    pub skip_sunday: bool,
}

impl NewProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            start_date: None,
            skip_saturday: false,
            skip_sunday: true,
        }
    }

    pub fn starting(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn with_week(mut self, week: WorkWeek) -> Self {
        self.skip_saturday = week.skip_saturday;
        self.skip_sunday = week.skip_sunday;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_saturday: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_sunday: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectStats {
    pub total_tasks: usize,
    pub total_cost: f64,
    pub total_price: f64,
    pub total_profit: f64,
    /// Calendar days from the project start through the last task's end, inclusive.
    pub total_days: i64,
    pub end_date: Option<NaiveDate>,
}

impl Project {
    pub fn new(id: ProjectId, draft: NewProject) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: draft.name,
            description: draft.description,
            start_date: draft.start_date,
            skip_saturday: draft.skip_saturday,
            skip_sunday: draft.skip_sunday,
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn week(&self) -> WorkWeek {
        WorkWeek::new(self.skip_saturday, self.skip_sunday)
    }

    pub fn find_task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn next_task_id(&self) -> TaskId {
        self.tasks.iter().map(|task| task.id).max().map_or(1, |max| max + 1)
    }

    /// Tasks sorted by `order`.
    pub fn ordered_tasks(&self) -> Vec<Task> {
        let mut tasks = self.tasks.clone();
        tasks.sort_by_key(|task| task.order);
        tasks
    }

    /// Appends a task at the end of the sequence.
    pub fn with_task_added(&self, draft: NewTask) -> (Self, Task) {
        let mut project = self.clone();
        let task = draft.into_task(project.next_task_id(), project.tasks.len() as u32);
        project.tasks.push(task.clone());
        (project, task)
    }

    /// Removes a task and closes the gap in `order`. `None` when the task does not exist.
    pub fn without_task(&self, task_id: TaskId) -> Option<Self> {
        let removed = self.find_task(task_id)?;
        let removed_order = removed.order;
        let mut project = self.clone();
        project.tasks.retain(|task| task.id != task_id);
        for task in &mut project.tasks {
            if task.order > removed_order {
                task.order -= 1;
            }
        }
        Some(project)
    }

    /// Moves `dragged` to the position of `target`, shifting the tasks in between by one.
    pub fn reordered(&self, dragged: TaskId, target: TaskId) -> Option<Self> {
        let dragged_order = self.find_task(dragged)?.order;
        let target_order = self.find_task(target)?.order;
        let mut project = self.clone();
        for task in &mut project.tasks {
            if task.id == dragged {
                task.order = target_order;
            } else if dragged_order < target_order {
                if task.order > dragged_order && task.order <= target_order {
                    task.order -= 1;
                }
            } else if task.order >= target_order && task.order < dragged_order {
                task.order += 1;
            }
        }
        project.tasks.sort_by_key(|task| task.order);
        Some(project)
    }

    pub fn with_task_patched(&self, task_id: TaskId, patch: &TaskPatch) -> Option<Self> {
        self.find_task(task_id)?;
        let mut project = self.clone();
        for task in &mut project.tasks {
            if task.id == task_id {
                *task = task.patched(patch);
            }
        }
        Some(project)
    }

    pub fn patched(&self, patch: &ProjectPatch) -> Self {
        let mut project = self.clone();
        if let Some(name) = &patch.name {
            project.name = name.clone();
        }
        if let Some(description) = &patch.description {
            project.description = description.clone();
        }
        if let Some(start) = patch.start_date {
            project.start_date = Some(start);
        }
        if let Some(skip) = patch.skip_saturday {
            project.skip_saturday = skip;
        }
        if let Some(skip) = patch.skip_sunday {
            project.skip_sunday = skip;
        }
        project
    }

    pub fn stats(&self) -> ProjectStats {
        let total_cost: f64 = self.tasks.iter().map(|task| task.cost).sum();
        let total_price: f64 = self.tasks.iter().map(|task| task.price).sum();

        let last = self.tasks.iter().max_by_key(|task| task.order);
        let end_date = match (self.start_date, last) {
            (Some(_), Some(task)) => task.end_date,
            _ => None,
        };
        let total_days = match (self.start_date, end_date) {
            (Some(start), Some(end)) => (end - start).num_days() + 1,
            _ => 0,
        };

        ProjectStats {
            total_tasks: self.tasks.len(),
            total_cost,
            total_price,
            total_profit: total_price - total_cost,
            total_days,
            end_date,
        }
    }
}

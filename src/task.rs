use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type TaskId = i32;

/// Trade a task belongs to. Also the lane a task is drawn in on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskCategory {
    WaterElectric,
    Masonry,
    Carpentry,
    Painting,
    Flooring,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 5] = [
        TaskCategory::WaterElectric,
        TaskCategory::Masonry,
        TaskCategory::Carpentry,
        TaskCategory::Painting,
        TaskCategory::Flooring,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::WaterElectric => "water-electric",
            TaskCategory::Masonry => "masonry",
            TaskCategory::Carpentry => "carpentry",
            TaskCategory::Painting => "painting",
            TaskCategory::Flooring => "flooring",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskCategory::WaterElectric => "Plumbing & Electrical",
            TaskCategory::Masonry => "Masonry",
            TaskCategory::Carpentry => "Carpentry",
            TaskCategory::Painting => "Painting",
            TaskCategory::Flooring => "Flooring",
        }
    }
}

impl Default for TaskCategory {
    fn default() -> Self {
        TaskCategory::WaterElectric
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        TaskCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

/// Progress state of a task. Statuses cycle; there is no ordering constraint between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Planned,
    InProgress,
    Completed,
    Blocked,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Planned,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Blocked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Planned => "planned",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Blocked => "blocked",
        }
    }

    /// Status shown after clicking a kanban card: planned → in-progress → completed → blocked → planned.
    pub fn next(self) -> Self {
        match self {
            TaskStatus::Planned => TaskStatus::InProgress,
            TaskStatus::InProgress => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Blocked,
            TaskStatus::Blocked => TaskStatus::Planned,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Planned
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("unknown status '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub category: TaskCategory,
    pub name: String,
    /// Work days; never below one.
    pub duration: u32,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub price: f64,
    /// Always `price - cost`; use [`Task::with_cost`]/[`Task::with_price`] to keep it in step.
    #[serde(default)]
    pub profit: f64,
    #[serde(default)]
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: TaskStatus,
}

impl Task {
    pub fn new(id: TaskId, name: impl Into<String>, duration: u32) -> Self {
        Self {
            id,
            category: TaskCategory::default(),
            name: name.into(),
            duration: duration.max(1),
            cost: 0.0,
            price: 0.0,
            profit: 0.0,
            order: 0,
            start_date: None,
            end_date: None,
            status: TaskStatus::default(),
        }
    }

    pub fn with_category(mut self, category: TaskCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self.recompute_profit();
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self.recompute_profit();
        self
    }

    pub fn with_dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn is_scheduled(&self) -> bool {
        self.start_date.is_some() && self.end_date.is_some()
    }

    /// Returns a copy with `patch` applied. Duration is clamped to at least one day and
    /// profit follows cost and price.
    pub fn patched(&self, patch: &TaskPatch) -> Self {
        let mut task = self.clone();
        if let Some(name) = &patch.name {
            task.name = name.clone();
        }
        if let Some(category) = patch.category {
            task.category = category;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(duration) = patch.duration {
            task.duration = duration.max(1);
        }
        if let Some(cost) = patch.cost {
            task.cost = cost;
        }
        if let Some(price) = patch.price {
            task.price = price;
        }
        if let Some(start) = patch.start_date {
            task.start_date = start;
        }
        if let Some(end) = patch.end_date {
            task.end_date = end;
        }
        task.recompute_profit();
        task
    }

    fn recompute_profit(&mut self) {
        self.profit = self.price - self.cost;
    }
}

/// Partial update for a task. `None` leaves the field untouched; for the date fields
/// `Some(None)` clears the date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<TaskCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "double_option"
    )]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "double_option"
    )]
    pub end_date: Option<Option<NaiveDate>>,
}

impl TaskPatch {
    pub fn schedule(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_date: Some(Some(start)),
            end_date: Some(Some(end)),
            ..Self::default()
        }
    }

    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, duration: u32) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Distinguishes an absent field from an explicit `null` in JSON patches.
mod double_option {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<Option<NaiveDate>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<NaiveDate>::deserialize(deserializer).map(Some)
    }
}

/// Fields accepted when creating a task; id and order are assigned by the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    #[serde(default)]
    pub category: TaskCategory,
    pub name: String,
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub status: TaskStatus,
}

fn default_duration() -> u32 {
    1
}

impl NewTask {
    pub fn new(category: TaskCategory, name: impl Into<String>, duration: u32) -> Self {
        Self {
            category,
            name: name.into(),
            duration,
            cost: 0.0,
            price: 0.0,
            status: TaskStatus::default(),
        }
    }

    pub fn with_money(mut self, cost: f64, price: f64) -> Self {
        self.cost = cost;
        self.price = price;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub(crate) fn into_task(self, id: TaskId, order: u32) -> Task {
        Task::new(id, self.name, self.duration)
            .with_category(self.category)
            .with_status(self.status)
            .with_order(order)
            .with_cost(self.cost)
            .with_price(self.price)
    }
}

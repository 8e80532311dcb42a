pub mod calculations;
pub mod calendar;
pub mod config;
pub mod demo;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod logging;
pub mod persistence;
pub mod project;
pub mod schedule;
pub mod task;
pub mod task_validation;
pub mod timeline;
pub mod views;

pub use calculations::cascade::{
    CascadeDecision, CascadePlan, CascadeResolver, CommitError, CommitReport, ConfirmCascade,
};
pub use calendar::{WorkWeek, is_working_day};
pub use config::{AppConfig, ConfigError};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteTaskStore;
pub use persistence::{
    JsonFileStore, MemoryTaskStore, PersistenceError, PersistenceResult, TaskStore,
    export_tasks_to_csv, load_projects_from_json, save_projects_to_json,
};
pub use project::{NewProject, Project, ProjectId, ProjectPatch, ProjectStats};
pub use schedule::{
    MissingScheduleInput, ScheduleOutcome, ScheduleSummary, check_schedule_inputs,
    schedule_tasks,
};
pub use task::{NewTask, Task, TaskCategory, TaskId, TaskPatch, TaskStatus};
pub use timeline::drag::{DragController, DragKind, DragPreview, DragState, ProposedChange};
pub use timeline::editor::{EditOutcome, TimelineEditor};
pub use timeline::{TimelineConfig, TimelineError, TimelineGeometry, TimelineView};

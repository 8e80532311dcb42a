//! Sample renovation project used by the CLI `demo` command and in tests.

use crate::project::{NewProject, Project, ProjectId};
use crate::task::{NewTask, TaskCategory, TaskStatus};
use chrono::NaiveDate;

use TaskCategory::{Carpentry, Flooring, Masonry, Painting, WaterElectric};
use TaskStatus::{Completed, InProgress, Planned};

const DEMO_TASKS: [(TaskCategory, &str, u32, f64, f64, TaskStatus); 24] = [
    (WaterElectric, "Install distribution board", 2, 15000.0, 22000.0, Completed),
    (WaterElectric, "Run electrical wiring", 3, 25000.0, 35000.0, Completed),
    (WaterElectric, "Lay water supply pipes", 2, 18000.0, 28000.0, InProgress),
    (WaterElectric, "Install drainage pipes", 2, 16000.0, 24000.0, Planned),
    (WaterElectric, "Electrical inspection", 1, 8000.0, 12000.0, Planned),
    (Masonry, "Roughen wall surfaces", 1, 12000.0, 18000.0, Planned),
    (Masonry, "Cement plastering", 4, 32000.0, 48000.0, Planned),
    (Masonry, "Lay floor tiles", 5, 45000.0, 68000.0, Planned),
    (Masonry, "Fix wall tiles", 3, 28000.0, 42000.0, Planned),
    (Masonry, "Grouting and finishing", 2, 15000.0, 22000.0, Planned),
    (Carpentry, "Ceiling framework", 3, 22000.0, 35000.0, Planned),
    (Carpentry, "Build and fit cabinets", 6, 85000.0, 125000.0, Planned),
    (Carpentry, "Install wooden floor", 4, 55000.0, 78000.0, Planned),
    (Carpentry, "Door and window frames", 3, 38000.0, 55000.0, Planned),
    (Carpentry, "Fit edge trims", 2, 18000.0, 26000.0, Planned),
    (Painting, "Wall skim coat", 2, 16000.0, 24000.0, Planned),
    (Painting, "Primer coat", 2, 14000.0, 21000.0, Planned),
    (Painting, "Top coat", 3, 22000.0, 32000.0, Planned),
    (Painting, "Special coatings", 2, 18000.0, 28000.0, Planned),
    (Flooring, "Level the floor", 2, 20000.0, 30000.0, Planned),
    (Flooring, "Damp-proof layer", 1, 12000.0, 18000.0, Planned),
    (Flooring, "Laminate flooring", 4, 65000.0, 95000.0, Planned),
    (Flooring, "Fit skirting boards", 2, 15000.0, 22000.0, Planned),
    (Flooring, "Final cleaning", 1, 8000.0, 12000.0, Planned),
];

pub fn demo_tasks() -> Vec<NewTask> {
    DEMO_TASKS
        .iter()
        .map(|(category, name, duration, cost, price, status)| {
            NewTask::new(*category, *name, *duration)
                .with_money(*cost, *price)
                .with_status(*status)
        })
        .collect()
}

/// The sample project starting on `start`, with its 24 tasks in order but unscheduled.
pub fn demo_project(id: ProjectId, start: NaiveDate) -> Project {
    let draft = NewProject::new("Sample renovation")
        .with_description("Test project covering every trade")
        .starting(start);
    demo_tasks()
        .into_iter()
        .fold(Project::new(id, draft), |project, task| {
            project.with_task_added(task).0
        })
}

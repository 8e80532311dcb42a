use chrono::{Datelike, Local, NaiveDate};
use polars::prelude::{AnyValue, DataFrame};
use std::io::{self, Stdin, Write};
use std::str::FromStr;
use worksite_planner::calculations::cascade::{CascadeDecision, CascadePlan};
use worksite_planner::{
    AppConfig, DragKind, EditOutcome, JsonFileStore, MemoryTaskStore, NewProject, NewTask,
    Project, ProjectId, ProjectPatch, ScheduleOutcome, TaskCategory, TaskId, TaskPatch,
    TaskStore, TimelineConfig, TimelineEditor, TimelineView, demo, export_tasks_to_csv,
    load_projects_from_json, logging, save_projects_to_json, views,
};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| col.get(row_idx).map(|av| cell_text(&av)).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.chars().count()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names, &widths));
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row, &widths));
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_row(values: &[String], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (value, width) in values.iter().zip(widths) {
        let pad = width.saturating_sub(value.chars().count());
        line.push(' ');
        line.push_str(value);
        line.push_str(&" ".repeat(pad));
        line.push_str(" |");
    }
    line.push('\n');
    line
}

fn cell_text(av: &AnyValue) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::Float64(v) => format!("{v:.0}"),
        AnyValue::String(s) => s.to_string(),
        AnyValue::Date(days) => NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
            .map(|d| d.to_string())
            .unwrap_or_default(),
        _ => av.to_string(),
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  projects                           List projects\n  project new <YYYY-MM-DD|-> <name...>\n                                     Create a project and select it\n  project use <id>                   Select a project\n  project delete <id>                Delete a project and its tasks\n  project start <YYYY-MM-DD>         Set the project start date\n  project week <sat> <sun>           Skip Saturday/Sunday (true|false each)\n  demo [YYYY-MM-DD]                  Create the sample project\n  show                               Show tasks as a table\n  add <category> <days> <name...>    Append a task\n  money <task> <cost> <price>        Set cost and price\n  dur <task> <days>                  Set duration in work days\n  rename <task> <name...>            Rename a task\n  status <task>                      Cycle the task status\n  delete <task>                      Delete a task\n  reorder <dragged> <target>         Move a task to the target's position\n  schedule                           Compute start/end dates\n  stats                              Project totals\n  kanban [status|category]           Group tasks into columns\n  calendar <year> <month>            Month grid with task counts\n  gantt                              Timeline chart\n  drag <task> <body|left|right> <from_px> <to_px>\n                                     Replay a drag on the timeline\n  save json <path>                   Save all projects\n  load json <path>                   Load projects\n  export csv <path>                  Export the current project's tasks\n  quit|exit                          Exit"
    );
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| "Invalid date (YYYY-MM-DD)".to_string())
}

fn parse_id(s: Option<&str>) -> Result<i32, String> {
    s.ok_or_else(|| "Missing id".to_string())?
        .parse()
        .map_err(|_| "Invalid id".to_string())
}

fn parse_bool(s: Option<&str>) -> Result<bool, String> {
    match s.map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        _ => Err("Invalid bool (true|false)".to_string()),
    }
}

fn read_line(stdin: &Stdin) -> Option<String> {
    let mut line = String::new();
    match stdin.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}

struct Session {
    store: Box<dyn TaskStore>,
    current: Option<ProjectId>,
    timeline: TimelineConfig,
}

impl Session {
    fn project_id(&self) -> Result<ProjectId, String> {
        self.current
            .ok_or_else(|| "No project selected (use 'project new' or 'demo')".to_string())
    }

    fn project(&self) -> Result<Project, Box<dyn std::error::Error>> {
        Ok(self.store.get_project(self.project_id()?)?)
    }

    fn show(&self) -> CmdResult {
        let project = self.project()?;
        println!(
            "Project {} '{}' (start: {})",
            project.id,
            project.name,
            project
                .start_date
                .map_or_else(|| "unset".to_string(), |d| d.to_string())
        );
        println!("{}", render_df_as_text_table(&views::task_table(&project)?));
        Ok(())
    }

    fn update_task(&mut self, task_id: TaskId, patch: TaskPatch) -> CmdResult {
        let project_id = self.project_id()?;
        self.store.update_task(project_id, task_id, &patch)?;
        println!("Task {task_id} updated.");
        Ok(())
    }

    fn project_command<'a>(&mut self, mut args: impl Iterator<Item = &'a str>) -> CmdResult {
        match args.next() {
            Some("new") => {
                let start = match args.next() {
                    Some("-") | None => None,
                    Some(s) => Some(parse_date(s)?),
                };
                let name = args.collect::<Vec<_>>().join(" ");
                if name.is_empty() {
                    return Err("Usage: project new <YYYY-MM-DD|-> <name...>".into());
                }
                let mut draft = NewProject::new(name);
                draft.start_date = start;
                let project = self.store.create_project(draft)?;
                self.current = Some(project.id);
                println!("Created project {} '{}'.", project.id, project.name);
            }
            Some("use") => {
                let id = parse_id(args.next())?;
                let project = self.store.get_project(id)?;
                self.current = Some(project.id);
                println!("Selected project {} '{}'.", project.id, project.name);
            }
            Some("delete") => {
                let id = parse_id(args.next())?;
                if self.store.delete_project(id)? {
                    if self.current == Some(id) {
                        self.current = None;
                    }
                    println!("Deleted project {id}.");
                } else {
                    println!("Project {id} not found.");
                }
            }
            Some("start") => {
                let date = parse_date(args.next().ok_or("Usage: project start <YYYY-MM-DD>")?)?;
                let patch = ProjectPatch {
                    start_date: Some(date),
                    ..ProjectPatch::default()
                };
                self.store.update_project(self.project_id()?, &patch)?;
                println!("Project start set to {date}.");
            }
            Some("week") => {
                let patch = ProjectPatch {
                    skip_saturday: Some(parse_bool(args.next())?),
                    skip_sunday: Some(parse_bool(args.next())?),
                    ..ProjectPatch::default()
                };
                let project = self.store.update_project(self.project_id()?, &patch)?;
                println!(
                    "Skipping Saturday: {}, Sunday: {}.",
                    project.skip_saturday, project.skip_sunday
                );
            }
            _ => return Err("Usage: project <new|use|delete|start|week> ...".into()),
        }
        Ok(())
    }

    fn list_projects(&self) -> CmdResult {
        let projects = self.store.list_projects()?;
        if projects.is_empty() {
            println!("No projects.");
        }
        for project in projects {
            let marker = if self.current == Some(project.id) { '*' } else { ' ' };
            println!(
                "{marker} {:>3}  {:<32} {} tasks",
                project.id,
                project.name,
                project.tasks.len()
            );
        }
        Ok(())
    }

    fn demo(&mut self, start: Option<&str>) -> CmdResult {
        let start = match start {
            Some(s) => parse_date(s)?,
            None => Local::now().date_naive(),
        };
        let id = self.store.next_project_id()?;
        let project = self.store.save_project(demo::demo_project(id, start))?;
        self.current = Some(project.id);
        println!(
            "Created demo project {} with {} tasks.",
            project.id,
            project.tasks.len()
        );
        Ok(())
    }

    fn add_task<'a>(&mut self, mut args: impl Iterator<Item = &'a str>) -> CmdResult {
        let usage = "Usage: add <category> <days> <name...>";
        let category = TaskCategory::from_str(args.next().ok_or(usage)?)?;
        let duration: u32 = args
            .next()
            .ok_or(usage)?
            .parse()
            .map_err(|_| "Invalid duration")?;
        let name = args.collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            return Err(usage.into());
        }
        let task = self
            .store
            .add_task(self.project_id()?, NewTask::new(category, name, duration))?;
        println!("Added task {} '{}' at position {}.", task.id, task.name, task.order);
        Ok(())
    }

    fn cycle_status(&mut self, task_id: TaskId) -> CmdResult {
        let project = self.project()?;
        let task = project
            .find_task(task_id)
            .ok_or_else(|| format!("Task {task_id} not found."))?;
        let next = task.status.next();
        self.store
            .update_task(project.id, task_id, &TaskPatch::status(next))?;
        println!("Task {task_id} is now {next}.");
        Ok(())
    }

    fn schedule(&mut self) -> CmdResult {
        match self.store.apply_schedule(self.project_id()?)? {
            ScheduleOutcome::Scheduled(summary) => {
                println!("Scheduled ({})", summary.to_cli_summary());
            }
            ScheduleOutcome::Skipped { reason } => println!("Not scheduled: {reason}."),
        }
        Ok(())
    }

    fn stats(&self) -> CmdResult {
        let stats = self.project()?.stats();
        println!("Tasks        : {}", stats.total_tasks);
        println!("Total cost   : {:.0}", stats.total_cost);
        println!("Total price  : {:.0}", stats.total_price);
        println!("Total profit : {:.0}", stats.total_profit);
        println!("Total days   : {}", stats.total_days);
        match stats.end_date {
            Some(date) => println!("End date     : {date}"),
            None => println!("End date     : -"),
        }
        Ok(())
    }

    fn kanban(&self, by: Option<&str>) -> CmdResult {
        let project = self.project()?;
        let columns: Vec<(String, Vec<String>)> = match by.unwrap_or("status") {
            "status" => views::tasks_by_status(&project)
                .into_iter()
                .map(|col| (col.key.to_string(), names(&col.tasks)))
                .collect(),
            "category" => views::tasks_by_category(&project)
                .into_iter()
                .map(|col| (col.key.label().to_string(), names(&col.tasks)))
                .collect(),
            other => return Err(format!("Unknown grouping '{other}'").into()),
        };
        for (title, tasks) in columns {
            println!("[{title}] ({})", tasks.len());
            for name in tasks {
                println!("  - {name}");
            }
        }
        Ok(())
    }

    fn calendar<'a>(&self, mut args: impl Iterator<Item = &'a str>) -> CmdResult {
        let usage = "Usage: calendar <year> <month>";
        let year: i32 = args.next().ok_or(usage)?.parse().map_err(|_| usage)?;
        let month: u32 = args.next().ok_or(usage)?.parse().map_err(|_| usage)?;
        let project = self.project()?;
        let grid = views::MonthGrid::build(&project, year, month).ok_or("Invalid month")?;
        println!("{year}-{month:02}");
        println!("  Sun   Mon   Tue   Wed   Thu   Fri   Sat");
        for week in &grid.weeks {
            let line: Vec<String> = week
                .iter()
                .map(|day| {
                    let marker = if day.in_month { ' ' } else { '~' };
                    if day.task_ids.is_empty() {
                        format!("{marker}{:>2}   ", day.date.day())
                    } else {
                        format!("{marker}{:>2}({})", day.date.day(), day.task_ids.len())
                    }
                })
                .collect();
            println!("{}", line.join(" "));
        }
        Ok(())
    }

    fn gantt(&self) -> CmdResult {
        let project = self.project()?;
        let Some(view) = TimelineView::build(&project, &self.timeline)? else {
            println!("Project has no start date.");
            return Ok(());
        };
        let header: String = view
            .range
            .days
            .iter()
            .map(|cell| char::from(b'0' + (cell.date.day() % 10) as u8))
            .collect();
        println!("{:<32} {header}", format!("{} .. {}", view.range.first, view.range.last));
        for lane in &view.lanes {
            println!("{}", lane.category.label());
            for bar in &lane.bars {
                let name = project
                    .find_task(bar.task_id)
                    .map(|task| task.name.clone())
                    .unwrap_or_default();
                let row: String = view
                    .range
                    .days
                    .iter()
                    .map(|cell| {
                        let covered = cell.offset >= bar.start_offset
                            && cell.offset < bar.start_offset + bar.span_days;
                        match (covered, cell.is_working_day) {
                            (true, true) => '#',
                            (true, false) => '=',
                            (false, false) => '.',
                            (false, true) => ' ',
                        }
                    })
                    .collect();
                println!("  {:<30} {row}", format!("{} {}", bar.task_id, name));
            }
        }
        Ok(())
    }

    fn drag<'a>(&mut self, mut args: impl Iterator<Item = &'a str>, stdin: &Stdin) -> CmdResult {
        let usage = "Usage: drag <task> <body|left|right> <from_px> <to_px>";
        let task_id = parse_id(args.next())?;
        let kind = DragKind::from_str(args.next().ok_or(usage)?)?;
        let from_px: f64 = args.next().ok_or(usage)?.parse().map_err(|_| usage)?;
        let to_px: f64 = args.next().ok_or(usage)?.parse().map_err(|_| usage)?;

        let geometry = worksite_planner::TimelineGeometry::from_config(&self.timeline)?;
        let mut editor = TimelineEditor::new(self.project_id()?, geometry);
        if !editor.pointer_down(&*self.store, task_id, kind, from_px)? {
            println!("A drag is already in progress.");
            return Ok(());
        }
        if let Some(preview) = editor.pointer_move(to_px) {
            println!(
                "Preview: offset {} days, duration {} days",
                preview.preview_offset_days, preview.preview_duration
            );
        }

        let mut confirm = |plan: &CascadePlan| {
            println!(
                "This change moves {} later task(s):",
                plan.affected.len()
            );
            for task in &plan.affected {
                println!("  {} {} -> {} .. {}", task.task_id, task.name, task.after.start, task.after.end);
            }
            print!("Reschedule them? [y/n] ");
            let _ = io::stdout().flush();
            match read_line(stdin).as_deref().map(str::trim) {
                Some("y") | Some("Y") | Some("yes") => CascadeDecision::Confirmed,
                _ => CascadeDecision::Declined,
            }
        };
        match editor.pointer_up(&mut *self.store, to_px, &mut confirm) {
            EditOutcome::NoChange => println!("No change."),
            EditOutcome::Committed {
                change,
                decision,
                updated,
            } => {
                let how = match decision {
                    Some(CascadeDecision::Confirmed) => "rescheduled",
                    Some(CascadeDecision::Declined) => "declined cascade",
                    None => "no cascade needed",
                };
                println!(
                    "Task {} now {} .. {} ({} days); {how}, {} task(s) updated.",
                    change.task_id,
                    change.proposed.start,
                    change.proposed.end,
                    change.proposed.duration,
                    updated.len()
                );
            }
            EditOutcome::Reverted { error, .. } => println!("Change reverted: {error}"),
        }
        Ok(())
    }

    fn save_load<'a>(&mut self, cmd: &str, mut args: impl Iterator<Item = &'a str>) -> CmdResult {
        let (format, path) = match (args.next(), args.next()) {
            (Some(format), Some(path)) => (format, path),
            _ => return Err(format!("Usage: {cmd} <json|csv> <path>").into()),
        };
        match (cmd, format) {
            ("save", "json") => {
                save_projects_to_json(&self.store.list_projects()?, path)?;
                println!("Projects saved to {path}");
            }
            ("load", "json") => {
                let projects = load_projects_from_json(path)?;
                self.current = projects.first().map(|project| project.id);
                self.store = Box::new(MemoryTaskStore::from_projects(projects)?);
                println!("Projects loaded from {path}");
            }
            ("export", "csv") => {
                export_tasks_to_csv(&self.project()?, path)?;
                println!("Tasks exported to {path}");
            }
            _ => return Err(format!("Unsupported format '{format}' for {cmd}").into()),
        }
        Ok(())
    }
}

fn names(tasks: &[worksite_planner::Task]) -> Vec<String> {
    tasks
        .iter()
        .map(|task| format!("{} {} ({})", task.id, task.name, task.duration))
        .collect()
}

fn open_store(config: &AppConfig) -> Box<dyn TaskStore> {
    if let Some(path) = &config.data_path {
        match JsonFileStore::open(path) {
            Ok(store) => return Box::new(store),
            Err(e) => println!("Could not open {}: {e}; using memory store.", path.display()),
        }
    }
    Box::new(MemoryTaskStore::new())
}

fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("Config error: {e}; using defaults.");
            AppConfig::default()
        }
    };
    logging::init_logging(&config.log_level);

    let store = open_store(&config);
    let current = store
        .list_projects()
        .ok()
        .and_then(|projects| projects.first().map(|project| project.id));
    let mut session = Session {
        store,
        current,
        timeline: config.timeline_config(),
    };

    println!("Worksite Planner (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let Some(line) = read_line(&stdin) else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        let result: CmdResult = match cmd {
            "help" => {
                print_help();
                Ok(())
            }
            "quit" | "exit" => break,
            "projects" => session.list_projects(),
            "project" => session.project_command(parts),
            "demo" => session.demo(parts.next()),
            "show" => session.show(),
            "add" => session.add_task(parts),
            "money" => (|| -> CmdResult {
                let task_id = parse_id(parts.next())?;
                let cost: f64 = parts.next().ok_or("Missing cost")?.parse()?;
                let price: f64 = parts.next().ok_or("Missing price")?.parse()?;
                session.update_task(
                    task_id,
                    TaskPatch {
                        cost: Some(cost),
                        price: Some(price),
                        ..TaskPatch::default()
                    },
                )
            })(),
            "dur" => (|| -> CmdResult {
                let task_id = parse_id(parts.next())?;
                let days: u32 = parts.next().ok_or("Missing days")?.parse()?;
                session.update_task(task_id, TaskPatch::default().with_duration(days))
            })(),
            "rename" => (|| -> CmdResult {
                let task_id = parse_id(parts.next())?;
                let name = parts.by_ref().collect::<Vec<_>>().join(" ");
                session.update_task(
                    task_id,
                    TaskPatch {
                        name: Some(name),
                        ..TaskPatch::default()
                    },
                )
            })(),
            "status" => parse_id(parts.next())
                .map_err(Into::into)
                .and_then(|id| session.cycle_status(id)),
            "delete" => (|| -> CmdResult {
                let task_id = parse_id(parts.next())?;
                if session.store.delete_task(session.project_id()?, task_id)? {
                    println!("Deleted task {task_id}.");
                } else {
                    println!("Task {task_id} not found.");
                }
                Ok(())
            })(),
            "reorder" => (|| -> CmdResult {
                let dragged = parse_id(parts.next())?;
                let target = parse_id(parts.next())?;
                if session
                    .store
                    .reorder_tasks(session.project_id()?, dragged, target)?
                {
                    println!("Moved task {dragged} to the position of task {target}.");
                } else {
                    println!("Task not found.");
                }
                Ok(())
            })(),
            "schedule" => session.schedule(),
            "stats" => session.stats(),
            "kanban" => session.kanban(parts.next()),
            "calendar" => session.calendar(parts),
            "gantt" => session.gantt(),
            "drag" => session.drag(parts, &stdin),
            "save" | "load" | "export" => session.save_load(cmd, parts),
            _ => {
                println!("Unknown command. Type 'help'.");
                Ok(())
            }
        };
        if let Err(e) = result {
            println!("Error: {e}");
        }
    }
}

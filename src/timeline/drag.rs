use super::{TimelineError, TimelineGeometry};
use crate::calendar::{WorkWeek, add_days};
use crate::task::{Task, TaskId, TaskPatch};
use crate::task_validation::MAX_TASK_DURATION;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Which part of a bar the pointer grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DragKind {
    /// The bar body: shifts the whole task.
    Move,
    /// The left handle: moves the start, keeps the end.
    ResizeLeft,
    /// The right handle: changes the duration, keeps the start.
    ResizeRight,
}

impl fmt::Display for DragKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DragKind::Move => "move",
            DragKind::ResizeLeft => "resize-left",
            DragKind::ResizeRight => "resize-right",
        };
        f.write_str(name)
    }
}

impl FromStr for DragKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "move" | "body" => Ok(DragKind::Move),
            "left" | "resize-left" => Ok(DragKind::ResizeLeft),
            "right" | "resize-right" => Ok(DragKind::ResizeRight),
            other => Err(format!("unknown drag kind '{other}'")),
        }
    }
}

/// Project facts the controller needs to turn day deltas into dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragContext {
    pub project_start: NaiveDate,
    pub week: WorkWeek,
}

/// Dates and duration of a task at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub duration: u32,
}

impl ScheduleSlot {
    pub fn of(task: &Task) -> Option<Self> {
        Some(Self {
            start: task.start_date?,
            end: task.end_date?,
            duration: task.duration,
        })
    }
}

/// Transient placement of the bar being dragged. Read by the renderer, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragPreview {
    pub task_id: TaskId,
    pub preview_offset_days: i64,
    pub preview_duration: i64,
}

/// Outcome of a finished gesture that changes the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedChange {
    pub task_id: TaskId,
    pub kind: DragKind,
    pub delta_days: i64,
    pub original: ScheduleSlot,
    pub proposed: ScheduleSlot,
}

impl ProposedChange {
    /// Patch writing the proposed slot to the task.
    pub fn patch(&self) -> TaskPatch {
        TaskPatch::schedule(self.proposed.start, self.proposed.end)
            .with_duration(self.proposed.duration)
    }
}

/// Public view of the controller's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging { task_id: TaskId, kind: DragKind },
}

#[derive(Debug, Clone, Copy)]
struct ActiveDrag {
    task_id: TaskId,
    kind: DragKind,
    start_pointer_x: f64,
    original_offset: i64,
    original: ScheduleSlot,
    context: DragContext,
    preview: DragPreview,
}

impl ActiveDrag {
    fn original_preview(&self) -> DragPreview {
        DragPreview {
            task_id: self.task_id,
            preview_offset_days: self.original_offset,
            preview_duration: i64::from(self.original.duration),
        }
    }

    fn preview_for(&self, delta_days: i64) -> DragPreview {
        let offset = self.original_offset;
        let duration = i64::from(self.original.duration);
        let (preview_offset_days, preview_duration) = match self.kind {
            DragKind::Move => (offset.saturating_add(delta_days), duration),
            DragKind::ResizeRight => (offset, duration.saturating_add(delta_days)),
            DragKind::ResizeLeft => (
                offset.saturating_add(delta_days),
                duration.saturating_sub(delta_days),
            ),
        };
        DragPreview {
            task_id: self.task_id,
            preview_offset_days,
            preview_duration,
        }
    }

    /// Committed slot for a delta, or `None` when it falls outside the supported range.
    fn proposed_for(&self, delta_days: i64) -> Option<ScheduleSlot> {
        let original = self.original;
        let duration = i64::from(original.duration);
        let slot = match self.kind {
            DragKind::Move => {
                let new_offset = self.original_offset.saturating_add(delta_days).max(0);
                let shift = new_offset.saturating_sub(self.original_offset);
                ScheduleSlot {
                    start: add_days(self.context.project_start, new_offset)?,
                    end: add_days(original.end, shift)?,
                    duration: original.duration,
                }
            }
            DragKind::ResizeRight => {
                let new_duration = clamp_duration(duration.saturating_add(delta_days))?;
                ScheduleSlot {
                    start: original.start,
                    end: self.context.week.end_date_for(original.start, new_duration),
                    duration: new_duration,
                }
            }
            DragKind::ResizeLeft => {
                let new_duration = clamp_duration(duration.saturating_sub(delta_days))?;
                let shift = duration - i64::from(new_duration);
                ScheduleSlot {
                    start: add_days(original.start, shift)?,
                    end: original.end,
                    duration: new_duration,
                }
            }
        };
        Some(slot)
    }
}

fn clamp_duration(days: i64) -> Option<u32> {
    u32::try_from(days.max(1))
        .ok()
        .filter(|days| *days <= MAX_TASK_DURATION)
}

/// Drives one move/resize gesture at a time.
///
/// Pointer-up always commits, wherever the pointer is, and so does leaving the
/// interactive surface. Only [`DragController::cancel`] discards a gesture.
#[derive(Debug, Clone)]
pub struct DragController {
    geometry: TimelineGeometry,
    active: Option<ActiveDrag>,
}

impl DragController {
    pub fn new(geometry: TimelineGeometry) -> Self {
        Self {
            geometry,
            active: None,
        }
    }

    pub fn geometry(&self) -> &TimelineGeometry {
        &self.geometry
    }

    pub fn state(&self) -> DragState {
        match &self.active {
            None => DragState::Idle,
            Some(drag) => DragState::Dragging {
                task_id: drag.task_id,
                kind: drag.kind,
            },
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn preview(&self) -> Option<DragPreview> {
        self.active.map(|drag| drag.preview)
    }

    /// Starts a gesture. Returns `Ok(false)` when another gesture is already running;
    /// that pointer-down is ignored.
    pub fn pointer_down(
        &mut self,
        task: &Task,
        kind: DragKind,
        pointer_x: f64,
        context: DragContext,
    ) -> Result<bool, TimelineError> {
        if let Some(active) = &self.active {
            debug!(
                task_id = task.id,
                active_task = active.task_id,
                "ignoring pointer-down while a drag is in progress"
            );
            return Ok(false);
        }
        let original = ScheduleSlot::of(task).ok_or(TimelineError::TaskNotScheduled(task.id))?;
        let original_offset = self
            .geometry
            .day_offset_from_date(original.start, context.project_start);

        let drag = ActiveDrag {
            task_id: task.id,
            kind,
            start_pointer_x: pointer_x,
            original_offset,
            original,
            context,
            preview: DragPreview {
                task_id: task.id,
                preview_offset_days: original_offset,
                preview_duration: i64::from(original.duration),
            },
        };
        debug!(task_id = task.id, %kind, pointer_x, "drag started");
        self.active = Some(drag);
        Ok(true)
    }

    /// Updates the transient preview. `None` while idle.
    pub fn pointer_move(&mut self, pointer_x: f64) -> Option<DragPreview> {
        let geometry = self.geometry;
        let drag = self.active.as_mut()?;
        let delta_days = geometry.day_offset_from_pixel(pointer_x - drag.start_pointer_x);
        drag.preview = drag.preview_for(delta_days);
        Some(drag.preview)
    }

    /// Ends the gesture. Returns the change to commit, or `None` when idle, when the
    /// pointer moved less than half a day, or when the clamped result equals the original.
    pub fn pointer_up(&mut self, pointer_x: f64) -> Option<ProposedChange> {
        let drag = self.active.take()?;
        let delta_days = self
            .geometry
            .day_offset_from_pixel(pointer_x - drag.start_pointer_x);
        if delta_days == 0 {
            debug!(task_id = drag.task_id, "drag released where it started");
            return None;
        }
        let Some(proposed) = drag.proposed_for(delta_days) else {
            warn!(
                task_id = drag.task_id,
                delta_days, "drag lands outside the supported date range"
            );
            return None;
        };
        if proposed == drag.original {
            debug!(task_id = drag.task_id, "drag ended without a change");
            return None;
        }
        debug!(
            task_id = drag.task_id,
            kind = %drag.kind,
            delta_days,
            "drag ended with a proposed change"
        );
        Some(ProposedChange {
            task_id: drag.task_id,
            kind: drag.kind,
            delta_days,
            original: drag.original,
            proposed,
        })
    }

    /// The pointer left the interactive surface; treated exactly like a release.
    pub fn pointer_leave(&mut self, pointer_x: f64) -> Option<ProposedChange> {
        self.pointer_up(pointer_x)
    }

    /// Aborts the gesture without committing. Returns the pre-gesture placement for the
    /// renderer to restore.
    pub fn cancel(&mut self) -> Option<DragPreview> {
        let drag = self.active.take()?;
        debug!(task_id = drag.task_id, "drag cancelled");
        Some(drag.original_preview())
    }
}

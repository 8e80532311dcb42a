use chrono::NaiveDate;
use worksite_planner::timeline::drag::{DragContext, DragKind, DragPreview, DragState, ScheduleSlot};
use worksite_planner::{DragController, Task, TimelineError, TimelineGeometry, WorkWeek};

const W: f64 = 60.0;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn context() -> DragContext {
    DragContext {
        project_start: d(2025, 8, 18),
        week: WorkWeek::default(),
    }
}

fn controller() -> DragController {
    DragController::new(TimelineGeometry::new(W).unwrap())
}

/// A(3) on Mon 2025-08-18 .. Wed 2025-08-20.
fn task_a() -> Task {
    Task::new(1, "A", 3).with_dates(d(2025, 8, 18), d(2025, 8, 20))
}

#[test]
fn move_right_two_days_shifts_both_dates() {
    let mut drag = controller();
    assert!(drag.pointer_down(&task_a(), DragKind::Move, 100.0, context()).unwrap());
    assert_eq!(drag.state(), DragState::Dragging { task_id: 1, kind: DragKind::Move });

    let preview = drag.pointer_move(100.0 + 2.0 * W).unwrap();
    assert_eq!(preview.preview_offset_days, 2);
    assert_eq!(preview.preview_duration, 3);

    let change = drag.pointer_up(100.0 + 2.0 * W).unwrap();
    assert_eq!(change.delta_days, 2);
    assert_eq!(
        change.proposed,
        ScheduleSlot { start: d(2025, 8, 20), end: d(2025, 8, 22), duration: 3 }
    );
    assert_eq!(drag.state(), DragState::Idle);
    assert!(drag.preview().is_none());
}

#[test]
fn resize_right_shrinks_by_one_working_day() {
    let mut drag = controller();
    drag.pointer_down(&task_a(), DragKind::ResizeRight, 180.0, context()).unwrap();
    let change = drag.pointer_up(180.0 - W).unwrap();
    assert_eq!(change.proposed.start, d(2025, 8, 18));
    assert_eq!(change.proposed.duration, 2);
    assert_eq!(change.proposed.end, d(2025, 8, 19));
}

#[test]
fn resize_right_recomputes_end_over_weekends() {
    let mut drag = controller();
    drag.pointer_down(&task_a(), DragKind::ResizeRight, 180.0, context()).unwrap();
    // 3 + 4 = 7 working days from Monday with Sunday skipped ends next Monday
    let change = drag.pointer_up(180.0 + 4.0 * W).unwrap();
    assert_eq!(change.proposed.duration, 7);
    assert_eq!(change.proposed.end, d(2025, 8, 25));
}

#[test]
fn resize_left_moves_start_and_keeps_end() {
    let mut drag = controller();
    drag.pointer_down(&task_a(), DragKind::ResizeLeft, 0.0, context()).unwrap();
    let change = drag.pointer_up(W).unwrap();
    assert_eq!(
        change.proposed,
        ScheduleSlot { start: d(2025, 8, 19), end: d(2025, 8, 20), duration: 2 }
    );
}

#[test]
fn commit_clamps_duration_and_offset() {
    let mut drag = controller();
    drag.pointer_down(&task_a(), DragKind::ResizeLeft, 0.0, context()).unwrap();
    let preview = drag.pointer_move(5.0 * W).unwrap();
    assert_eq!(preview.preview_duration, -2);
    let change = drag.pointer_up(5.0 * W).unwrap();
    assert_eq!(change.proposed.duration, 1);
    assert_eq!(change.proposed.start, d(2025, 8, 20));
    assert_eq!(change.proposed.end, d(2025, 8, 20));

    let mut drag = controller();
    drag.pointer_down(&task_a(), DragKind::ResizeRight, 0.0, context()).unwrap();
    let change = drag.pointer_up(-10.0 * W).unwrap();
    assert_eq!(change.proposed.duration, 1);
    assert_eq!(change.proposed.end, d(2025, 8, 18));

    // A move before the project start clamps to offset zero, which is no change at all
    let mut drag = controller();
    drag.pointer_down(&task_a(), DragKind::Move, 0.0, context()).unwrap();
    assert!(drag.pointer_up(-3.0 * W).is_none());
}

#[test]
fn sub_half_day_release_is_no_change() {
    let mut drag = controller();
    drag.pointer_down(&task_a(), DragKind::Move, 0.0, context()).unwrap();
    assert!(drag.pointer_up(W * 0.49).is_none());
    assert!(!drag.is_dragging());
}

#[test]
fn second_pointer_down_is_ignored() {
    let mut drag = controller();
    let other = Task::new(2, "B", 2).with_dates(d(2025, 8, 21), d(2025, 8, 22));
    assert!(drag.pointer_down(&task_a(), DragKind::Move, 0.0, context()).unwrap());
    assert!(!drag.pointer_down(&other, DragKind::ResizeRight, 0.0, context()).unwrap());
    assert_eq!(drag.state(), DragState::Dragging { task_id: 1, kind: DragKind::Move });
}

#[test]
fn leaving_the_surface_commits() {
    let mut drag = controller();
    drag.pointer_down(&task_a(), DragKind::Move, 0.0, context()).unwrap();
    let change = drag.pointer_leave(W).unwrap();
    assert_eq!(change.proposed.start, d(2025, 8, 19));
}

#[test]
fn cancel_restores_original_preview() {
    let mut drag = controller();
    drag.pointer_down(&task_a(), DragKind::ResizeRight, 0.0, context()).unwrap();
    drag.pointer_move(3.0 * W);
    assert_eq!(
        drag.cancel(),
        Some(DragPreview { task_id: 1, preview_offset_days: 0, preview_duration: 3 })
    );
    assert!(!drag.is_dragging());
    assert!(drag.pointer_up(3.0 * W).is_none());
}

#[test]
fn idle_controller_ignores_moves() {
    let mut drag = controller();
    assert!(drag.pointer_move(120.0).is_none());
    assert!(drag.pointer_up(120.0).is_none());
    assert!(drag.cancel().is_none());
}

#[test]
fn unscheduled_task_cannot_be_dragged() {
    let mut drag = controller();
    let err = drag
        .pointer_down(&Task::new(9, "Unscheduled", 2), DragKind::Move, 0.0, context())
        .unwrap_err();
    assert_eq!(err, TimelineError::TaskNotScheduled(9));
}

#[test]
fn drag_kinds_parse_from_handle_names() {
    assert_eq!("body".parse::<DragKind>().unwrap(), DragKind::Move);
    assert_eq!("left".parse::<DragKind>().unwrap(), DragKind::ResizeLeft);
    assert_eq!("resize-right".parse::<DragKind>().unwrap(), DragKind::ResizeRight);
    assert!("top".parse::<DragKind>().is_err());
}

#[test]
fn release_in_place_before_project_start_is_no_change() {
    // Sat 08-16 .. Tue 08-19 starts two days before the project
    let early = Task::new(4, "Early", 3).with_dates(d(2025, 8, 16), d(2025, 8, 19));
    let mut drag = controller();
    drag.pointer_down(&early, DragKind::Move, 50.0, context()).unwrap();
    assert_eq!(drag.preview().unwrap().preview_offset_days, -2);
    assert!(drag.pointer_up(50.0).is_none());

    drag.pointer_down(&early, DragKind::Move, 50.0, context()).unwrap();
    assert!(drag.pointer_up(50.0 + W * 0.3).is_none());
}

#[test]
fn pointer_far_off_the_grid_does_not_panic() {
    let mut drag = controller();
    drag.pointer_down(&task_a(), DragKind::Move, 0.0, context()).unwrap();
    assert!(drag.pointer_move(1e12).unwrap().preview_offset_days > 0);
    assert!(drag.pointer_up(1e12).is_none());
    assert!(!drag.is_dragging());

    drag.pointer_down(&task_a(), DragKind::ResizeRight, 0.0, context()).unwrap();
    assert!(drag.pointer_up(1e12).is_none());

    drag.pointer_down(&task_a(), DragKind::ResizeLeft, 0.0, context()).unwrap();
    assert!(drag.pointer_up(-1e12).is_none());

    // Shrinking clamps to a single day and is still a valid change
    drag.pointer_down(&task_a(), DragKind::ResizeLeft, 0.0, context()).unwrap();
    let change = drag.pointer_up(1e12).unwrap();
    assert_eq!(
        change.proposed,
        ScheduleSlot { start: d(2025, 8, 20), end: d(2025, 8, 20), duration: 1 }
    );
}

#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;
use worksite_planner::http_api;
use worksite_planner::{MemoryTaskStore, Project, Task, TimelineConfig};

fn new_router() -> axum::Router {
    let state = http_api::AppState::new(MemoryTaskStore::new(), TimelineConfig::default());
    http_api::router(state)
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Project starting Monday 2025-08-18 with A(3) and B(2), already scheduled.
async fn seeded(app: &axum::Router) -> i32 {
    let (status, project) = send(
        app,
        "POST",
        "/projects",
        Some(json!({ "name": "Flat", "start_date": "2025-08-18" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let project: Project = serde_json::from_value(project).unwrap();

    for (category, name, duration) in [("masonry", "A", 3), ("painting", "B", 2)] {
        let (status, _) = send(
            app,
            "POST",
            &format!("/projects/{}/tasks", project.id),
            Some(json!({ "category": category, "name": name, "duration": duration })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, outcome) = send(app, "POST", &format!("/projects/{}/schedule", project.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "scheduled");
    project.id
}

async fn tasks(app: &axum::Router, project_id: i32) -> Vec<Task> {
    let (status, body) = send(app, "GET", &format!("/projects/{project_id}/tasks"), None).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_value(body).unwrap()
}

#[tokio::test]
async fn project_and_task_lifecycle_via_http_api() {
    let app = new_router();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let project_id = seeded(&app).await;
    let listed = tasks(&app, project_id).await;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[1].start_date.unwrap().to_string(), "2025-08-21");

    let (status, task) = send(
        &app,
        "PATCH",
        &format!("/projects/{project_id}/tasks/1"),
        Some(json!({ "cost": 120.0, "price": 200.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["profit"], 80.0);

    let (status, task) = send(&app, "POST", &format!("/projects/{project_id}/tasks/1/status"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["status"], "in-progress");

    let (status, project) = send(
        &app,
        "POST",
        &format!("/projects/{project_id}/reorder"),
        Some(json!({ "dragged": 2, "target": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(project["tasks"][0]["name"], "B");

    let (status, stats) = send(&app, "GET", &format!("/projects/{project_id}/stats"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_tasks"], 2);

    let (status, _) = send(&app, "DELETE", &format!("/projects/{project_id}/tasks/2"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let remaining = tasks(&app, project_id).await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].order, 0);

    let (status, _) = send(&app, "DELETE", &format!("/projects/{project_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, "GET", &format!("/projects/{project_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn drag_with_cascade_reschedules_later_tasks() {
    let app = new_router();
    let project_id = seeded(&app).await;

    let (status, outcome) = send(
        &app,
        "POST",
        &format!("/projects/{project_id}/tasks/1/drag"),
        Some(json!({ "kind": "move", "from_px": 0.0, "to_px": 120.0, "cascade": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "committed");
    assert_eq!(outcome["decision"], "confirmed");
    assert_eq!(outcome["updated"], json!([1, 2]));

    let listed = tasks(&app, project_id).await;
    assert_eq!(listed[0].start_date.unwrap().to_string(), "2025-08-20");
    assert_eq!(listed[1].start_date.unwrap().to_string(), "2025-08-23");
    assert_eq!(listed[1].end_date.unwrap().to_string(), "2025-08-25");
}

#[tokio::test]
async fn drag_without_cascade_moves_only_the_task() {
    let app = new_router();
    let project_id = seeded(&app).await;

    let (status, outcome) = send(
        &app,
        "POST",
        &format!("/projects/{project_id}/tasks/1/drag"),
        Some(json!({ "kind": "move", "from_px": 0.0, "to_px": 120.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["decision"], "declined");

    let listed = tasks(&app, project_id).await;
    assert_eq!(listed[0].end_date.unwrap().to_string(), "2025-08-22");
    assert_eq!(listed[1].start_date.unwrap().to_string(), "2025-08-21");

    let (status, outcome) = send(
        &app,
        "POST",
        &format!("/projects/{project_id}/tasks/2/drag"),
        Some(json!({ "kind": "resize-right", "from_px": 0.0, "to_px": 10.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "no_change");
}

#[tokio::test]
async fn timeline_and_views_follow_project_state() {
    let app = new_router();
    let (_, project) = send(&app, "POST", "/projects", Some(json!({ "name": "Unplanned" }))).await;
    let unplanned = project["id"].as_i64().unwrap();
    let (status, body) = send(&app, "GET", &format!("/projects/{unplanned}/timeline"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let project_id = seeded(&app).await;
    let (status, view) = send(&app, "GET", &format!("/projects/{project_id}/timeline"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["lanes"].as_array().unwrap().len(), 2);

    let (status, columns) = send(&app, "GET", &format!("/projects/{project_id}/kanban?by=category"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(columns.as_array().unwrap().len(), 5);
    let (status, _) = send(&app, "GET", &format!("/projects/{project_id}/kanban?by=colour"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, grid) = send(
        &app,
        "GET",
        &format!("/projects/{project_id}/calendar?year=2025&month=8"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(grid["month"], 8);
    let (status, _) = send(
        &app,
        "GET",
        &format!("/projects/{project_id}/calendar?year=2025&month=13"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, table) = send(&app, "GET", &format!("/projects/{project_id}/table"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(table["rows"], 2);
}

#[tokio::test]
async fn unknown_rows_and_bad_payloads_are_rejected() {
    let app = new_router();
    let project_id = seeded(&app).await;

    let (status, _) = send(&app, "GET", &format!("/projects/{project_id}/tasks/9"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/projects/{project_id}/tasks/9"),
        Some(json!({ "name": "Ghost" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/projects/{project_id}/tasks/1"),
        Some(json!({ "cost": -1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, "POST", "/projects", Some(json!({ "name": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, "DELETE", "/projects/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        "POST",
        &format!("/projects/{project_id}/tasks/9/drag"),
        Some(json!({ "kind": "move", "from_px": 0.0, "to_px": 60.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn out_of_range_drags_and_durations_are_refused() {
    let app = new_router();
    let project_id = seeded(&app).await;

    let (status, outcome) = send(
        &app,
        "POST",
        &format!("/projects/{project_id}/tasks/2/drag"),
        Some(json!({ "kind": "move", "from_px": 0.0, "to_px": 1e12, "cascade": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "no_change");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/projects/{project_id}/tasks"),
        Some(json!({ "category": "masonry", "name": "Forever", "duration": 200_000_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let listed = tasks(&app, project_id).await;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[1].start_date.unwrap().to_string(), "2025-08-21");
}

mod common;

use axum::http::StatusCode;
use common::{app, request, send, ADMIN_TOKEN, USER_TOKEN};
use protolab_core::domain::{RequestStatus, RequestType};
use protolab_core::triage::DEFAULT_SOLVED_MESSAGE;
use serde_json::json;

#[tokio::test]
async fn admin_routes_require_an_admin_session() {
    let app = app(vec![]).await;

    let res = send(&app.router, "GET", "/admin/requests", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = send(&app.router, "GET", "/admin/requests", Some(USER_TOKEN), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = send(&app.router, "GET", "/admin/requests", Some(ADMIN_TOKEN), None).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn list_filters_by_status_tab() {
    let app = app(vec![
        request(RequestType::Consulting, RequestStatus::Pending),
        request(RequestType::Firmware, RequestStatus::Pending),
        request(RequestType::OnDemand, RequestStatus::UnderReview),
        request(RequestType::Prototyping, RequestStatus::Solved),
    ])
    .await;

    let body = send(&app.router, "GET", "/admin/requests?status=pending", Some(ADMIN_TOKEN), None)
        .await
        .json();
    let requests = body["requests"].as_array().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r["status"] == "pending"));
    assert_eq!(body["counts"], json!({"all": 4, "pending": 2, "under_review": 1, "solved": 1}));

    let body = send(&app.router, "GET", "/admin/requests", Some(ADMIN_TOKEN), None)
        .await
        .json();
    assert_eq!(body["requests"].as_array().unwrap().len(), 4);

    let res = send(&app.router, "GET", "/admin/requests?status=archived", Some(ADMIN_TOKEN), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn solve_is_reflected_from_a_fresh_fetch() {
    let pending = request(RequestType::Prototyping, RequestStatus::Pending);
    let id = pending.id;
    let app = app(vec![pending]).await;
    let fetches_before = *app.requests.fetches.lock().unwrap();

    let res = send(
        &app.router,
        "POST",
        &format!("/admin/requests/prototyping/{}/solve", id),
        Some(ADMIN_TOKEN),
        Some(json!({})),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text());

    assert_eq!(*app.requests.fetches.lock().unwrap(), fetches_before + 1);
    let body = res.json();
    assert_eq!(body["requests"][0]["status"], "solved");
    assert_eq!(body["requests"][0]["admin_notes"], DEFAULT_SOLVED_MESSAGE);
    assert_eq!(app.state.triage.find(id).await.unwrap().status, RequestStatus::Solved);
}

#[tokio::test]
async fn reply_reopens_solved_request() {
    let solved = request(RequestType::Firmware, RequestStatus::Solved);
    let id = solved.id;
    let app = app(vec![solved]).await;

    let res = send(
        &app.router,
        "POST",
        &format!("/admin/requests/firmware/{}/reply", id),
        Some(ADMIN_TOKEN),
        Some(json!({"message": "Could you share the schematic?"})),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["requests"][0]["status"], "under_review");

    let replies = app.requests.replies.lock().unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].previous_status, RequestStatus::Solved);
    assert_eq!(replies[0].new_status, RequestStatus::UnderReview);
}

#[tokio::test]
async fn empty_reply_and_type_mismatch_are_rejected() {
    let pending = request(RequestType::Consulting, RequestStatus::Pending);
    let id = pending.id;
    let app = app(vec![pending]).await;

    let res = send(
        &app.router,
        "POST",
        &format!("/admin/requests/consulting/{}/reply", id),
        Some(ADMIN_TOKEN),
        Some(json!({"message": "  "})),
    )
    .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

    let res = send(
        &app.router,
        "POST",
        &format!("/admin/requests/firmware/{}/reply", id),
        Some(ADMIN_TOKEN),
        Some(json!({"message": "hello"})),
    )
    .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = send(
        &app.router,
        "POST",
        &format!("/admin/requests/hardware/{}/reply", id),
        Some(ADMIN_TOKEN),
        Some(json!({"message": "hello"})),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(app.requests.replies.lock().unwrap().is_empty());
}

#[tokio::test]
async fn remote_failure_keeps_local_list_for_retry() {
    let pending = request(RequestType::OnDemand, RequestStatus::Pending);
    let id = pending.id;
    let app = app(vec![pending]).await;
    let uri = format!("/admin/requests/ondemand/{}/solve", id);

    app.requests.fail_next_submits(true);
    let res = send(&app.router, "POST", &uri, Some(ADMIN_TOKEN), Some(json!({"message": "done"}))).await;
    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
    assert_eq!(app.state.triage.find(id).await.unwrap().status, RequestStatus::Pending);

    app.requests.fail_next_submits(false);
    let res = send(&app.router, "POST", &uri, Some(ADMIN_TOKEN), Some(json!({"message": "done"}))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["requests"][0]["admin_notes"], "done");
}

#[tokio::test]
async fn details_include_type_specific_fields() {
    let pending = request(RequestType::Consulting, RequestStatus::Pending);
    let id = pending.id;
    let app = app(vec![pending]).await;

    let res = send(
        &app.router,
        "GET",
        &format!("/admin/requests/consulting/{}", id),
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["request"]["id"], id.to_string());
    assert_eq!(body["fields"]["budget"], "5000");

    let res = send(
        &app.router,
        "GET",
        &format!("/admin/requests/consulting/{}", uuid::Uuid::new_v4()),
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn refresh_picks_up_new_requests() {
    let app = app(vec![]).await;
    app.requests
        .rows
        .lock()
        .unwrap()
        .push(request(RequestType::Firmware, RequestStatus::Pending));

    let before = send(&app.router, "GET", "/admin/requests", Some(ADMIN_TOKEN), None).await.json();
    assert_eq!(before["counts"]["all"], 0);

    let after = send(&app.router, "POST", "/admin/requests/refresh", Some(ADMIN_TOKEN), None)
        .await
        .json();
    assert_eq!(after["counts"]["all"], 1);
}

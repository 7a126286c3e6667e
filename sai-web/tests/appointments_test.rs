//! Appointment endpoints and their authorization

mod helpers;

use axum::http::StatusCode;
use helpers::{error_fields, json_body, TestApp};
use serde_json::{json, Value};

fn appointment_body(name: &str, cpf: &str) -> Value {
    json!({
        "requester_name": name,
        "cpf": cpf,
        "rg": "12.345.678-9",
        "service_type": "Segunda via de documento"
    })
}

#[tokio::test]
async fn test_user_creates_and_lists_appointments() {
    let app = TestApp::spawn().await;
    let token = app.user_token("alice").await;

    let response = app
        .send(
            "POST",
            "/api/v1/appointments",
            Some(appointment_body("Maria da Silva", "529.982.247-25")),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = json_body(response).await;
    assert_eq!(created["status"], "WAITING");
    assert_eq!(created["cpf"], "52998224725");
    assert!(created["id"].is_string());
    assert!(created["arrived_at"].is_string());

    app.send(
        "POST",
        "/api/v1/appointments",
        Some(appointment_body("João Souza", "111.444.777-35")),
        Some(&token),
    )
    .await;

    let response = app
        .send("GET", "/api/v1/appointments", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let list = json_body(response).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["id"], created["id"]);
}

#[tokio::test]
async fn test_anonymous_requests_are_unauthorized() {
    let app = TestApp::spawn().await;

    let response = app.send("GET", "/api/v1/appointments", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send(
            "POST",
            "/api/v1/appointments",
            Some(appointment_body("Maria da Silva", "529.982.247-25")),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_cannot_change_status() {
    let app = TestApp::spawn().await;
    let token = app.user_token("alice").await;

    let created = json_body(
        app.send(
            "POST",
            "/api/v1/appointments",
            Some(appointment_body("Maria da Silva", "529.982.247-25")),
            Some(&token),
        )
        .await,
    )
    .await;
    let uri = format!("/api/v1/appointments/{}/status", created["id"].as_str().unwrap());

    let response = app
        .send("POST", &uri, Some(json!({ "status": "IN_SERVICE" })), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["error"], "permission_denied");
}

#[tokio::test]
async fn test_admin_changes_status() {
    let app = TestApp::spawn().await;
    let user = app.user_token("alice").await;
    let admin = app.admin_token().await;

    let created = json_body(
        app.send(
            "POST",
            "/api/v1/appointments",
            Some(appointment_body("Maria da Silva", "529.982.247-25")),
            Some(&user),
        )
        .await,
    )
    .await;
    let uri = format!("/api/v1/appointments/{}/status", created["id"].as_str().unwrap());

    let response = app
        .send("POST", &uri, Some(json!({ "status": "IN_SERVICE" })), Some(&admin))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "IN_SERVICE");

    let list = json_body(
        app.send("GET", "/api/v1/appointments", None, Some(&user))
            .await,
    )
    .await;
    assert_eq!(list[0]["status"], "IN_SERVICE");
}

#[tokio::test]
async fn test_unknown_appointment_is_not_found() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let response = app
        .send(
            "POST",
            &format!("/api/v1/appointments/{}/status", uuid::Uuid::new_v4()),
            Some(json!({ "status": "COMPLETED" })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "not_found");
}

#[tokio::test]
async fn test_invalid_appointment_is_rejected_with_fields() {
    let app = TestApp::spawn().await;
    let token = app.user_token("alice").await;

    let response = app
        .send(
            "POST",
            "/api/v1/appointments",
            Some(appointment_body("Al", "123.456.789-00")),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    let fields: Vec<&str> = body["validation_errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["requester_name", "cpf"]);
}

#[tokio::test]
async fn test_appointment_body_missing_field() {
    let app = TestApp::spawn().await;
    let token = app.user_token("alice").await;

    let response = app
        .send(
            "POST",
            "/api/v1/appointments",
            Some(json!({
                "requester_name": "Maria da Silva",
                "service_type": "Segunda via de documento"
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], "validation_failed");
    assert_eq!(error_fields(&body), vec!["cpf"]);
}

#[tokio::test]
async fn test_malformed_appointment_id() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let response = app
        .send(
            "POST",
            "/api/v1/appointments/not-a-uuid/status",
            Some(json!({ "status": "COMPLETED" })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(error_fields(&body), vec!["id"]);
    assert!(!body.to_string().contains("Cannot parse"));
}

#[tokio::test]
async fn test_unknown_status_value_is_rejected() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let response = app
        .send(
            "POST",
            &format!("/api/v1/appointments/{}/status", uuid::Uuid::new_v4()),
            Some(json!({ "status": "TELEPORTED" })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "validation_failed");
}

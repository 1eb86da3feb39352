//! End-to-end scenarios through the public routers, in-memory store behind
//! them, driven with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use qualtrack::accounts::{account_router, AccountService, NewUser};
use qualtrack::memory::InMemoryStore;
use qualtrack::notify::ConsoleMailTransport;
use qualtrack::qualifications::{
    qualification_router, QualificationApi, QualificationService, StatusPolicy,
};

fn app() -> Router {
    let store = InMemoryStore::new();

    let accounts = Arc::new(AccountService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    ));
    accounts
        .register(NewUser {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password: "correct horse".to_string(),
            is_admin: true,
        })
        .expect("admin seeded");

    let service = Arc::new(QualificationService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        StatusPolicy::default(),
    ));
    let api = Arc::new(QualificationApi {
        service,
        mailer: Arc::new(ConsoleMailTransport),
        settings: Arc::new(store),
    });

    qualification_router(api).merge(account_router(accounts))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("request handled");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body read");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request built")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request built")
}

#[tokio::test]
async fn acme_scenario_end_to_end() {
    let app = app();

    let (status, company) = send(&app, post_json("/api/v1/companies", json!({ "name": "Acme Corp" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let company_id = company["id"].as_u64().expect("company id");

    // Validity ended yesterday relative to the pinned reference date.
    let (status, _) = send(
        &app,
        post_json(
            &format!("/api/v1/companies/{company_id}/qualifications"),
            json!({
                "actor": "admin",
                "registration_number": "REG-EXPIRED",
                "valid_from": "2024-04-01",
                "valid_until": "2026-08-24",
                "next_application_on": "2026-08-28"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Validity a year out, deadline in ten days.
    let (status, _) = send(
        &app,
        post_json(
            &format!("/api/v1/companies/{company_id}/qualifications"),
            json!({
                "actor": "admin",
                "registration_number": "REG-DUE",
                "valid_from": "2025-04-01",
                "valid_until": "2027-08-25",
                "next_application_on": "2026-09-04"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, views) = send(
        &app,
        get(&format!(
            "/api/v1/companies/{company_id}/qualifications?today=2026-08-25"
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let views = views.as_array().expect("array").clone();
    assert_eq!(views.len(), 2);

    let by_reg = |reg: &str| {
        views
            .iter()
            .find(|v| v["qualification"]["registration_number"] == reg)
            .expect("present")
            .clone()
    };
    assert_eq!(by_reg("REG-EXPIRED")["status"]["label"], "expired");
    assert_eq!(by_reg("REG-EXPIRED")["status"]["color"], "danger");
    assert_eq!(by_reg("REG-DUE")["status"]["label"], "renewal due soon");
    assert_eq!(by_reg("REG-DUE")["status"]["color"], "warning");

    // Deleting the company is refused while it owns qualifications.
    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/companies/{company_id}"))
        .body(Body::empty())
        .expect("request built");
    let (status, body) = send(&app, delete).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().expect("message").contains("owns"));
}

#[tokio::test]
async fn export_sets_charset_and_filename_headers() {
    let app = app();
    let (_, company) = send(&app, post_json("/api/v1/companies", json!({ "name": "Acme Corp" }))).await;
    let company_id = company["id"].as_u64().expect("company id");
    send(
        &app,
        post_json(
            &format!("/api/v1/companies/{company_id}/qualifications"),
            json!({
                "actor": "admin",
                "registration_number": "REG-1",
                "valid_from": "2025-04-01",
                "valid_until": "2027-03-31",
                "next_application_on": "2027-01-15"
            }),
        ),
    )
    .await;

    let response = app
        .clone()
        .oneshot(get(&format!(
            "/api/v1/companies/{company_id}/qualifications/export?today=2026-08-25"
        )))
        .await
        .expect("request handled");
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .expect("content type");
    assert_eq!(content_type, "text/csv; charset=Shift_JIS");

    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .expect("disposition");
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains("filename*=UTF-8''"));

    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body read");
    let text = String::from_utf8(bytes.to_vec()).expect("ascii csv");
    assert_eq!(text.lines().count(), 2);
}

#[tokio::test]
async fn import_reports_partial_success_and_missing_notify_address() {
    let app = app();
    let (_, company) = send(&app, post_json("/api/v1/companies", json!({ "name": "Acme Corp" }))).await;
    let company_id = company["id"].as_u64().expect("company id");

    let csv = "\"Company Name\",\"Issuing Agency\",\"Registration Number\",\"Valid From\",\"Valid Until\",\"Next Application Deadline\",\"Application Status\",\"Notes\",\"Notification URL\"\n\
\"\",\"\",\"REG-1\",\"\",\"\",\"\",\"\",\"\",\"\"\n\
\"\",\"\",\"\",\"\",\"\",\"\",\"\",\"\",\"\"\n";

    let request = Request::builder()
        .method("POST")
        .uri(format!(
            "/api/v1/companies/{company_id}/qualifications/import?actor=importer"
        ))
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(csv))
        .expect("request built");

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imported"], 1);
    assert_eq!(body["errors"].as_array().expect("errors").len(), 1);
    // No admin address configured yet, so the response says so.
    assert!(body["notice"]
        .as_str()
        .expect("notice")
        .contains("no admin notification address"));
}

#[tokio::test]
async fn login_and_settings_flow() {
    let app = app();

    let (status, user) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({ "username": "admin", "password": "correct horse" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["is_admin"], true);

    // Wrong password and unknown user are indistinguishable.
    let (wrong_pw, body_a) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({ "username": "admin", "password": "nope nope" }),
        ),
    )
    .await;
    let (unknown, body_b) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({ "username": "ghost", "password": "nope nope" }),
        ),
    )
    .await;
    assert_eq!(wrong_pw, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, StatusCode::UNAUTHORIZED);
    assert_eq!(body_a["error"], body_b["error"]);

    // Non-admins may not change the notification address.
    let (status, _) = send(
        &app,
        post_json(
            "/api/v1/users",
            json!({
                "actor": "admin",
                "username": "clerk",
                "email": "clerk@example.com",
                "password": "longenough",
                "is_admin": false
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let put = |actor: &str| {
        Request::builder()
            .method("PUT")
            .uri("/api/v1/settings/notification-email")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "actor": actor, "email": "alerts@example.com" }).to_string(),
            ))
            .expect("request built")
    };

    let (forbidden, _) = send(&app, put("clerk")).await;
    assert_eq!(forbidden, StatusCode::FORBIDDEN);

    let (ok, _) = send(&app, put("admin")).await;
    assert_eq!(ok, StatusCode::NO_CONTENT);

    let (status, setting) = send(&app, get("/api/v1/settings/notification-email")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(setting["email"], "alerts@example.com");
}

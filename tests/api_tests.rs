use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use trialgate::config::Config;

const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "integration-admin-pw";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A pooled in-memory SQLite gives each connection its own database;
    // pin the pool to a single connection so state survives across requests.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.server.secure_cookies = false;
    config.auth.admin_username = ADMIN_USERNAME.to_string();
    config.auth.admin_password = ADMIN_PASSWORD.to_string();
    config.model.path = "models/eligibility.json".to_string();
    config.validate().expect("test config should validate");

    let state = trialgate::api::create_app_state(config)
        .await
        .expect("Failed to create app state");
    trialgate::api::router(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    cookie: Option<&str>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn session_cookie(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("expected a session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn register(app: &Router, username: &str, password: &str, role: &str) {
    let response = send(
        app,
        "POST",
        "/register",
        Some(json!({"username": username, "password": password, "role": role})),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = send(
        app,
        "POST",
        "/login",
        Some(json!({"username": username, "password": password})),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response)
}

fn sample_form() -> Value {
    json!({
        "Age": 34,
        "Sex": 1,
        "Weight_kg": 70.5,
        "Height_cm": 172.0,
        "BMI": 23.8,
        "Cohort": 2,
        "ALT": 28.5,
        "Creatinine": 0.9,
        "SBP": 118,
        "DBP": 76,
        "HR": 72,
        "Temp_C": 36.6,
        "AdverseEvent": 0
    })
}

#[tokio::test]
async fn test_home_banner() {
    let app = spawn_app().await;

    let response = send(&app, "GET", "/", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "running");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_testdb_diagnostic() {
    let app = spawn_app().await;

    let response = send(&app, "GET", "/testdb", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = spawn_app().await;

    register(&app, "alice", "pw1", "patient").await;

    let response = send(
        &app,
        "POST",
        "/register",
        Some(json!({"username": "alice", "password": "pw2", "role": "patient"})),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Username already exists");
}

#[tokio::test]
async fn test_register_rejects_missing_fields_and_bad_roles() {
    let app = spawn_app().await;

    let response = send(
        &app,
        "POST",
        "/register",
        Some(json!({"username": "bob", "password": ""})),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Missing required fields");

    let response = send(
        &app,
        "POST",
        "/register",
        Some(json!({"username": "bob", "password": "pw", "role": "superuser"})),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_establishes_session_visible_via_check_session() {
    let app = spawn_app().await;

    register(&app, "alice", "pw1", "patient").await;

    let response = send(
        &app,
        "POST",
        "/login",
        Some(json!({"username": "alice", "password": "pw1"})),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["role"], "patient");
    assert!(body["user"]["id"].is_i64());
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());

    let response = send(&app, "GET", "/check_session", None, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let session = body_json(response).await;
    assert_eq!(session["authenticated"], true);
    assert_eq!(session["user"]["username"], "alice");
    assert_eq!(session["user"]["role"], "patient");
    assert_eq!(session["user"]["id"], body["user"]["id"]);
}

#[tokio::test]
async fn test_login_with_wrong_password_fails_without_session() {
    let app = spawn_app().await;

    register(&app, "alice", "pw1", "patient").await;

    let response = send(
        &app,
        "POST",
        "/login",
        Some(json!({"username": "alice", "password": "nope"})),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid credentials");

    let response = send(&app, "GET", "/check_session", None, None).await;
    let session = body_json(response).await;
    assert_eq!(session["authenticated"], false);
}

#[tokio::test]
async fn test_login_missing_fields_is_a_validation_error() {
    let app = spawn_app().await;

    let response = send(
        &app,
        "POST",
        "/login",
        Some(json!({"username": "alice"})),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_destroys_the_session_and_is_idempotent() {
    let app = spawn_app().await;

    register(&app, "alice", "pw1", "patient").await;
    let cookie = login(&app, "alice", "pw1").await;

    let response = send(&app, "POST", "/logout", None, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/check_session", None, Some(&cookie)).await;
    let session = body_json(response).await;
    assert_eq!(session["authenticated"], false);

    // No active session at all: still succeeds
    let response = send(&app, "POST", "/logout", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_patient_form_requires_the_patient_role() {
    let app = spawn_app().await;

    // Unauthenticated
    let response = send(&app, "POST", "/patient_form", Some(sample_form()), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Authenticated, wrong role
    let admin_cookie = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let response = send(
        &app,
        "POST",
        "/patient_form",
        Some(sample_form()),
        Some(&admin_cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_patient_form_submission_creates_one_unevaluated_record() {
    let app = spawn_app().await;

    register(&app, "alice", "pw1", "patient").await;
    let cookie = login(&app, "alice", "pw1").await;

    let response = send(
        &app,
        "POST",
        "/patient_form",
        Some(sample_form()),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    let admin_cookie = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let response = send(&app, "GET", "/admin_dashboard", None, Some(&admin_cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let dashboard = body_json(response).await;
    let patients = dashboard["patients"].as_array().unwrap();
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0]["Age"], 34.0);
    assert_eq!(patients[0]["SBP"], 118);
    assert!(patients[0]["eligibility"].is_null());
}

#[tokio::test]
async fn test_patient_form_reports_the_first_missing_field() {
    let app = spawn_app().await;

    register(&app, "alice", "pw1", "patient").await;
    let cookie = login(&app, "alice", "pw1").await;

    let mut form = sample_form();
    form.as_object_mut().unwrap().remove("Temp_C");

    let response = send(&app, "POST", "/patient_form", Some(form), Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Missing field: Temp_C");
}

#[tokio::test]
async fn test_patient_form_rejects_non_coercible_values() {
    let app = spawn_app().await;

    register(&app, "alice", "pw1", "patient").await;
    let cookie = login(&app, "alice", "pw1").await;

    let mut form = sample_form();
    form["Age"] = json!("thirty-four");

    let response = send(&app, "POST", "/patient_form", Some(form), Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_patient_form_accepts_form_encoded_bodies_with_string_values() {
    let app = spawn_app().await;

    register(&app, "alice", "pw1", "patient").await;
    let cookie = login(&app, "alice", "pw1").await;

    let body = "Age=34&Sex=1&Weight_kg=70.5&Height_cm=172&BMI=23.8&Cohort=2&ALT=28.5\
                &Creatinine=0.9&SBP=118&DBP=76&HR=72&Temp_C=36.6&AdverseEvent=0";

    let request = Request::builder()
        .method("POST")
        .uri("/patient_form")
        .header(header::COOKIE, &cookie)
        .header(
            header::CONTENT_TYPE,
            mime::APPLICATION_WWW_FORM_URLENCODED.as_ref(),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_dashboard_rejects_patients_and_lists_newest_first() {
    let app = spawn_app().await;

    register(&app, "alice", "pw1", "patient").await;
    let cookie = login(&app, "alice", "pw1").await;

    let response = send(&app, "GET", "/admin_dashboard", None, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    for _ in 0..3 {
        let response = send(
            &app,
            "POST",
            "/patient_form",
            Some(sample_form()),
            Some(&cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let admin_cookie = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let response = send(&app, "GET", "/admin_dashboard", None, Some(&admin_cookie)).await;
    let dashboard = body_json(response).await;

    let ids: Vec<i64> = dashboard["patients"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();

    let mut sorted = ids.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(ids, sorted);
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn test_eligibility_check_requires_admin_and_a_real_patient() {
    let app = spawn_app().await;

    register(&app, "alice", "pw1", "patient").await;
    let patient_cookie = login(&app, "alice", "pw1").await;

    let response = send(&app, "GET", "/check/1", None, Some(&patient_cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let admin_cookie = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let response = send(&app, "GET", "/check/999", None, Some(&admin_cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Patient not found");
}

#[tokio::test]
async fn test_end_to_end_intake_and_eligibility_flow() {
    let app = spawn_app().await;

    register(&app, "alice", "pw1", "patient").await;
    let patient_cookie = login(&app, "alice", "pw1").await;

    let response = send(
        &app,
        "POST",
        "/patient_form",
        Some(sample_form()),
        Some(&patient_cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let admin_cookie = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let response = send(&app, "GET", "/admin_dashboard", None, Some(&admin_cookie)).await;
    let dashboard = body_json(response).await;
    let patients = dashboard["patients"].as_array().unwrap();
    assert_eq!(patients.len(), 1);
    assert!(patients[0]["eligibility"].is_null());
    let patient_id = patients[0]["id"].as_i64().unwrap();

    let response = send(
        &app,
        "GET",
        &format!("/check/{patient_id}"),
        None,
        Some(&admin_cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let check = body_json(response).await;
    assert_eq!(check["success"], true);
    let label = check["result"].as_str().unwrap().to_string();
    assert!(label == "Accepted" || label == "Rejected");
    assert_eq!(check["patient"]["eligibility"], label.as_str());

    // Dashboard reflects the persisted label
    let response = send(&app, "GET", "/admin_dashboard", None, Some(&admin_cookie)).await;
    let dashboard = body_json(response).await;
    assert_eq!(dashboard["patients"][0]["eligibility"], label.as_str());

    // Re-evaluation returns the same label for unchanged inputs
    let response = send(
        &app,
        "GET",
        &format!("/check/{patient_id}"),
        None,
        Some(&admin_cookie),
    )
    .await;
    let recheck = body_json(response).await;
    assert_eq!(recheck["result"], label.as_str());
}

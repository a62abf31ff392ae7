mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{TestApp, ADMIN_KEY, GATEWAY_KEY};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn generate_token(app: &TestApp, token_type: &str) -> (String, String) {
    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri("/api/v1/admin/tokens/generate")
            .header("X-Admin-Key", ADMIN_KEY)
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"token_type": token_type, "count": 1}).to_string())).unwrap()
    ).await.unwrap();
    let body = parse_body(res).await;
    (
        body["tokens"][0]["id"].as_str().unwrap().to_string(),
        body["tokens"][0]["code"].as_str().unwrap().to_string(),
    )
}

async fn start_session(app: &TestApp, code: &str) -> Value {
    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri("/api/v1/booking/start")
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"code": code}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    parse_body(res).await
}

async fn put_step(app: &TestApp, session_id: &str, step: &str, payload: Value) -> axum::response::Response {
    app.router.clone().oneshot(
        Request::builder().method("PUT")
            .uri(format!("/api/v1/booking/{}/{}", session_id, step))
            .header("Content-Type", "application/json")
            .body(Body::from(payload.to_string())).unwrap()
    ).await.unwrap()
}

async fn checkout(app: &TestApp, session_id: &str) -> axum::response::Response {
    app.router.clone().oneshot(
        Request::builder().method("POST")
            .uri(format!("/api/v1/booking/{}/checkout", session_id))
            .body(Body::empty()).unwrap()
    ).await.unwrap()
}

#[tokio::test]
async fn test_free_ticket_skips_ticket_step() {
    let app = TestApp::new().await;
    let (_, code) = generate_token(&app, "free_ticket").await;

    let session = start_session(&app, &code).await;
    assert_eq!(session["skip_ticket"], true);
    let sid = session["session_id"].as_str().unwrap();

    let body = parse_body(put_step(&app, sid, "attendee", json!({
        "name": "Nimal", "email": "nimal@example.com", "phone": "0712345678"
    })).await).await;
    // Attendee completion jumps straight to addons.
    assert_eq!(body["step"], "addons");

    let res = put_step(&app, sid, "ticket", json!({"ticket_key": "general_early"})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(res).await["error"], "Ticket selection is not required for this key");

    put_step(&app, sid, "addons", json!({"keys": ["afterparty_package_1"]})).await;
    let body = parse_body(checkout(&app, sid).await).await;
    assert_eq!(body["ticket_key"], Value::Null);
    assert_eq!(body["ticket_price"], 0);
    assert_eq!(body["addon_total"], 1500);
    assert_eq!(body["total_amount"], 1500);
    assert_eq!(body["payment_status"], "pending");
}

#[tokio::test]
async fn test_zero_total_checkout_settles_immediately() {
    let app = TestApp::new().await;
    let (token_id, code) = generate_token(&app, "free_ticket").await;

    let session = start_session(&app, &code).await;
    let sid = session["session_id"].as_str().unwrap();

    put_step(&app, sid, "attendee", json!({
        "name": "Nimal", "email": "nimal@example.com", "phone": "0712345678"
    })).await;
    put_step(&app, sid, "addons", json!({"keys": []})).await;

    let body = parse_body(checkout(&app, sid).await).await;
    assert_eq!(body["total_amount"], 0);
    // Nothing to collect; no gateway round-trip.
    assert_eq!(body["payment_status"], "completed");

    let res = app.router.clone().oneshot(
        Request::builder().method("GET")
            .uri(format!("/api/v1/admin/tokens/{}", token_id))
            .header("X-Admin-Key", ADMIN_KEY)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(parse_body(res).await["status"], "used");

    let res = app.router.clone().oneshot(
        Request::builder().method("GET")
            .uri(format!("/api/v1/admin/tokens/{}/invitations", token_id))
            .header("X-Admin-Key", ADMIN_KEY)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(parse_body(res).await.as_array().unwrap().len(), 5);

    let events = app.notifications.lock().unwrap();
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn test_polo_pairs_free_package_with_paid() {
    let app = TestApp::new().await;
    let (_, code) = generate_token(&app, "polo_ordered").await;

    let session = start_session(&app, &code).await;
    // Polo holders start with their free package preselected, at no cost.
    assert_eq!(session["addon_keys"], json!(["afterpart_package_0"]));
    assert_eq!(session["addon_total"], 0);
    assert_eq!(session["skip_ticket"], false);
    let sid = session["session_id"].as_str().unwrap();

    put_step(&app, sid, "attendee", json!({
        "name": "Kamala", "email": "kamala@example.com", "phone": "0723456789"
    })).await;
    put_step(&app, sid, "ticket", json!({"ticket_key": "general_early"})).await;
    let res = put_step(&app, sid, "addons", json!({
        "keys": ["afterpart_package_0", "afterparty_package_2"]
    })).await;
    assert_eq!(res.status(), StatusCode::OK);
    let stored = parse_body(res).await;
    assert_eq!(stored["addon_total"], 2500);

    let body = parse_body(checkout(&app, sid).await).await;
    assert_eq!(body["addon_total"], 2500);
    assert_eq!(body["total_amount"], 6000);
    // The free package line is hidden next to a paid one.
    let addons = body["addons"].as_array().unwrap();
    assert_eq!(addons.len(), 1);
    assert_eq!(addons[0]["key"], "afterparty_package_2");

    let purchase_id = body["purchase_id"].as_str().unwrap().to_string();
    let reference = body["payment_reference"].as_str().unwrap().to_string();

    app.router.clone().oneshot(
        Request::builder().method("POST")
            .uri(format!("/api/v1/payments/{}/complete", reference))
            .header("X-Gateway-Key", GATEWAY_KEY)
            .body(Body::empty()).unwrap()
    ).await.unwrap();

    // Both rows persist; the newest paid row decides the drink count.
    let res = app.router.clone().oneshot(
        Request::builder().method("GET")
            .uri(format!("/api/v1/admin/purchases/{}", purchase_id))
            .header("X-Admin-Key", ADMIN_KEY)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    let detail = parse_body(res).await;
    let rows = detail["addons"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.iter().filter(|r| r["is_free"] == true).count(), 1);
    assert_eq!(detail["purchase"]["total_drink_count"], 3);
}

#[tokio::test]
async fn test_polo_free_package_alone_checks_out_at_ticket_price() {
    let app = TestApp::new().await;
    let (_, code) = generate_token(&app, "polo_ordered").await;

    let session = start_session(&app, &code).await;
    let sid = session["session_id"].as_str().unwrap();

    put_step(&app, sid, "attendee", json!({
        "name": "Kamala", "email": "kamala@example.com", "phone": "0723456789"
    })).await;
    put_step(&app, sid, "ticket", json!({"ticket_key": "general_early"})).await;

    // Default selection untouched: just the free package.
    let body = parse_body(checkout(&app, sid).await).await;
    assert_eq!(body["addon_total"], 0);
    assert_eq!(body["total_amount"], 3500);
    let addons = body["addons"].as_array().unwrap();
    assert_eq!(addons.len(), 1);
    assert_eq!(addons[0]["is_free"], true);
}

#[tokio::test]
async fn test_failed_payment_keeps_token_active() {
    let app = TestApp::new().await;
    let (_, code) = generate_token(&app, "normal").await;

    let session = start_session(&app, &code).await;
    let sid = session["session_id"].as_str().unwrap();

    put_step(&app, sid, "attendee", json!({
        "name": "Amal", "email": "amal@example.com", "phone": "0771234567"
    })).await;
    put_step(&app, sid, "ticket", json!({"ticket_key": "general_early"})).await;
    let body = parse_body(checkout(&app, sid).await).await;
    let reference = body["payment_reference"].as_str().unwrap().to_string();

    let res = app.router.clone().oneshot(
        Request::builder().method("POST")
            .uri(format!("/api/v1/payments/{}/fail", reference))
            .header("X-Gateway-Key", GATEWAY_KEY)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"], "failed");

    // A failed purchase cannot be completed afterwards.
    let res = app.router.clone().oneshot(
        Request::builder().method("POST")
            .uri(format!("/api/v1/payments/{}/complete", reference))
            .header("X-Gateway-Key", GATEWAY_KEY)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // The key was never consumed; the holder can try again.
    let res = app.router.clone().oneshot(
        Request::builder().method("GET")
            .uri(format!("/api/v1/tokens/{}/validate", code))
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(parse_body(res).await["valid"], true);

    // And no invitations or confirmations went out.
    assert!(app.notifications.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_used_token_cannot_start_again() {
    let app = TestApp::new().await;
    let (_, code) = generate_token(&app, "free_ticket").await;

    let session = start_session(&app, &code).await;
    let sid = session["session_id"].as_str().unwrap();
    put_step(&app, sid, "attendee", json!({
        "name": "Nimal", "email": "nimal@example.com", "phone": "0712345678"
    })).await;
    put_step(&app, sid, "addons", json!({"keys": []})).await;
    checkout(&app, sid).await;

    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri("/api/v1/booking/start")
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"code": code}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(parse_body(res).await["error"], "This key has already been used");
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    let app = TestApp::new().await;
    let (_, code) = generate_token(&app, "normal").await;

    let session = start_session(&app, &code).await;
    let sid = session["session_id"].as_str().unwrap().to_string();

    sqlx::query("UPDATE wizard_sessions SET expires_at = '2020-01-01T00:00:00Z' WHERE id = ?")
        .bind(&sid)
        .execute(&app.pool)
        .await
        .unwrap();

    let res = app.router.clone().oneshot(
        Request::builder().method("GET")
            .uri(format!("/api/v1/booking/{}", sid))
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(parse_body(res).await["error"], "Booking session has expired");

    let res = app.router.clone().oneshot(
        Request::builder().method("GET")
            .uri("/api/v1/booking/does-not-exist")
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_activity_extends_session_deadline() {
    let app = TestApp::new().await;
    let (_, code) = generate_token(&app, "normal").await;

    let session = start_session(&app, &code).await;
    let sid = session["session_id"].as_str().unwrap();
    let initial_deadline: chrono::DateTime<chrono::Utc> =
        session["expires_at"].as_str().unwrap().parse().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let body = parse_body(put_step(&app, sid, "attendee", json!({
        "name": "Amal", "email": "amal@example.com", "phone": "0771234567"
    })).await).await;
    let new_deadline: chrono::DateTime<chrono::Utc> =
        body["expires_at"].as_str().unwrap().parse().unwrap();
    assert!(new_deadline > initial_deadline);
}

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{TestApp, ADMIN_KEY};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn generate(app: &TestApp, token_type: &str, count: u32) -> Value {
    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri("/api/v1/admin/tokens/generate")
            .header("X-Admin-Key", ADMIN_KEY)
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"token_type": token_type, "count": count}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    parse_body(res).await
}

#[tokio::test]
async fn test_generate_tokens_batch() {
    let app = TestApp::new().await;

    let body = generate(&app, "normal", 5).await;
    assert_eq!(body["requested"], 5);
    assert_eq!(body["generated"], 5);

    let tokens = body["tokens"].as_array().unwrap();
    assert_eq!(tokens.len(), 5);
    for token in tokens {
        let code = token["code"].as_str().unwrap();
        assert!(code.starts_with("NOR"), "unexpected prefix: {}", code);
        assert_eq!(code.len(), 6);
        assert_eq!(token["status"], "active");
        assert_eq!(token["is_used"], false);
        assert_eq!(token["created_by"], "admin");
    }
}

#[tokio::test]
async fn test_generate_prefixes_per_type() {
    let app = TestApp::new().await;

    for (token_type, prefix, len) in [
        ("normal", "NOR", 6),
        ("free_ticket", "FTK", 6),
        ("polo_ordered", "PLO", 6),
        ("sponsor", "SPO", 6),
        ("invitation", "INV", 8),
    ] {
        let body = generate(&app, token_type, 1).await;
        let code = body["tokens"][0]["code"].as_str().unwrap();
        assert!(code.starts_with(prefix), "{} got {}", token_type, code);
        assert_eq!(code.len(), len, "{} got {}", token_type, code);
    }
}

#[tokio::test]
async fn test_generated_codes_are_unique() {
    let app = TestApp::new().await;

    let body = generate(&app, "normal", 50).await;
    let codes: std::collections::HashSet<&str> = body["tokens"]
        .as_array().unwrap()
        .iter()
        .map(|t| t["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes.len(), 50);
}

#[tokio::test]
async fn test_generate_rejects_bad_count() {
    let app = TestApp::new().await;

    for count in [0, 501] {
        let res = app.router.clone().oneshot(
            Request::builder().method("POST").uri("/api/v1/admin/tokens/generate")
                .header("X-Admin-Key", ADMIN_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(json!({"token_type": "normal", "count": count}).to_string())).unwrap()
        ).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "count {}", count);
    }
}

#[tokio::test]
async fn test_admin_routes_require_key() {
    let app = TestApp::new().await;

    let missing = app.router.clone().oneshot(
        Request::builder().method("GET").uri("/api/v1/admin/tokens")
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = app.router.clone().oneshot(
        Request::builder().method("GET").uri("/api/v1/admin/tokens")
            .header("X-Admin-Key", "not-the-key")
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(wrong.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_tokens_with_filters() {
    let app = TestApp::new().await;

    generate(&app, "normal", 2).await;
    let sponsor = generate(&app, "sponsor", 1).await;
    let sponsor_id = sponsor["tokens"][0]["id"].as_str().unwrap().to_string();

    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri("/api/v1/admin/tokens")
            .header("X-Admin-Key", ADMIN_KEY)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await.as_array().unwrap().len(), 3);

    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri("/api/v1/admin/tokens?token_type=sponsor")
            .header("X-Admin-Key", ADMIN_KEY)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    let sponsors = parse_body(res).await;
    assert_eq!(sponsors.as_array().unwrap().len(), 1);
    assert_eq!(sponsors[0]["id"], sponsor_id.as_str());

    // Cancel the sponsor token, then filter by status.
    app.router.clone().oneshot(
        Request::builder().method("POST")
            .uri(format!("/api/v1/admin/tokens/{}/cancel", sponsor_id))
            .header("X-Admin-Key", ADMIN_KEY)
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"reason": "Sponsor withdrew"}).to_string())).unwrap()
    ).await.unwrap();

    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri("/api/v1/admin/tokens?status=active")
            .header("X-Admin-Key", ADMIN_KEY)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(parse_body(res).await.as_array().unwrap().len(), 2);

    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri("/api/v1/admin/tokens?status=cancelled")
            .header("X-Admin-Key", ADMIN_KEY)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    let cancelled = parse_body(res).await;
    assert_eq!(cancelled.as_array().unwrap().len(), 1);
    assert_eq!(cancelled[0]["cancellation_reason"], "Sponsor withdrew");
    assert_eq!(cancelled[0]["cancelled_by"], "admin");
}

#[tokio::test]
async fn test_cancel_is_terminal() {
    let app = TestApp::new().await;

    let body = generate(&app, "normal", 1).await;
    let token_id = body["tokens"][0]["id"].as_str().unwrap().to_string();

    let first = app.router.clone().oneshot(
        Request::builder().method("POST")
            .uri(format!("/api/v1/admin/tokens/{}/cancel", token_id))
            .header("X-Admin-Key", ADMIN_KEY)
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"reason": "Duplicate order"}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(parse_body(first).await["status"], "cancelled");

    let second = app.router.clone().oneshot(
        Request::builder().method("POST")
            .uri(format!("/api/v1/admin/tokens/{}/cancel", token_id))
            .header("X-Admin-Key", ADMIN_KEY)
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"reason": "again"}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let missing = app.router.clone().oneshot(
        Request::builder().method("POST")
            .uri("/api/v1/admin/tokens/no-such-id/cancel")
            .header("X-Admin-Key", ADMIN_KEY)
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"reason": "x"}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_notifies_recipient() {
    let app = TestApp::new().await;

    let body = generate(&app, "normal", 1).await;
    let token_id = body["tokens"][0]["id"].as_str().unwrap().to_string();
    let code = body["tokens"][0]["code"].as_str().unwrap().to_string();

    let res = app.router.clone().oneshot(
        Request::builder().method("PUT")
            .uri(format!("/api/v1/admin/tokens/{}/recipient", token_id))
            .header("X-Admin-Key", ADMIN_KEY)
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"name": "Nadia", "email": "nadia@example.com"}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated = parse_body(res).await;
    assert_eq!(updated["sent_to_name"], "Nadia");
    assert_eq!(updated["sent_to_email"], "nadia@example.com");

    app.router.clone().oneshot(
        Request::builder().method("POST")
            .uri(format!("/api/v1/admin/tokens/{}/cancel", token_id))
            .header("X-Admin-Key", ADMIN_KEY)
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"reason": "Event policy change"}).to_string())).unwrap()
    ).await.unwrap();

    let events = app.notifications.lock().unwrap();
    assert_eq!(events.len(), 1);
    match &events[0] {
        common::NotifyEvent::TokenCancelled { code: c, recipient, reason } => {
            assert_eq!(c, &code);
            assert_eq!(recipient, "nadia@example.com");
            assert_eq!(reason, "Event policy change");
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_cancel_without_recipient_skips_notification() {
    let app = TestApp::new().await;

    let body = generate(&app, "normal", 1).await;
    let token_id = body["tokens"][0]["id"].as_str().unwrap().to_string();

    let res = app.router.clone().oneshot(
        Request::builder().method("POST")
            .uri(format!("/api/v1/admin/tokens/{}/cancel", token_id))
            .header("X-Admin-Key", ADMIN_KEY)
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"reason": "No show"}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    assert!(app.notifications.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_public_validate_endpoint() {
    let app = TestApp::new().await;

    let body = generate(&app, "normal", 1).await;
    let token_id = body["tokens"][0]["id"].as_str().unwrap().to_string();
    let code = body["tokens"][0]["code"].as_str().unwrap().to_string();

    let res = app.router.clone().oneshot(
        Request::builder().method("GET")
            .uri(format!("/api/v1/tokens/{}/validate", code))
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let valid = parse_body(res).await;
    assert_eq!(valid["valid"], true);
    assert!(valid["reason"].is_null());

    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri("/api/v1/tokens/NOPE99/validate")
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    let unknown = parse_body(res).await;
    assert_eq!(unknown["valid"], false);
    assert_eq!(unknown["reason"], "Invalid access key");

    app.router.clone().oneshot(
        Request::builder().method("POST")
            .uri(format!("/api/v1/admin/tokens/{}/cancel", token_id))
            .header("X-Admin-Key", ADMIN_KEY)
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"reason": "Refunded"}).to_string())).unwrap()
    ).await.unwrap();

    let res = app.router.clone().oneshot(
        Request::builder().method("GET")
            .uri(format!("/api/v1/tokens/{}/validate", code))
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    let cancelled = parse_body(res).await;
    assert_eq!(cancelled["valid"], false);
    assert_eq!(cancelled["cancelled"], true);
    assert_eq!(cancelled["reason"], "Refunded");
}

#[tokio::test]
async fn test_expired_token_reported_and_persisted() {
    let app = TestApp::new().await;

    let body = generate(&app, "normal", 1).await;
    let token_id = body["tokens"][0]["id"].as_str().unwrap().to_string();
    let code = body["tokens"][0]["code"].as_str().unwrap().to_string();

    // Push the deadline into the past behind the API's back.
    sqlx::query("UPDATE tokens SET expires_at = ? WHERE id = ?")
        .bind(chrono::Utc::now() - chrono::Duration::hours(1))
        .bind(&token_id)
        .execute(&app.pool)
        .await
        .unwrap();

    let res = app.router.clone().oneshot(
        Request::builder().method("GET")
            .uri(format!("/api/v1/tokens/{}/validate", code))
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    let expired = parse_body(res).await;
    assert_eq!(expired["valid"], false);
    assert_eq!(expired["expired"], true);
    assert_eq!(expired["reason"], "This key has expired");

    // Lazy expiry wrote the terminal status back.
    let res = app.router.clone().oneshot(
        Request::builder().method("GET")
            .uri(format!("/api/v1/admin/tokens/{}", token_id))
            .header("X-Admin-Key", ADMIN_KEY)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(parse_body(res).await["status"], "expired");
}

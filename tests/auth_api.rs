mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use chrono::Duration;
use serde_json::{json, Value};

use common::{bearer, register, TestContext, SECRET};
use task_hub::auth::TokenIssuer;
use task_hub::models::AuthResponse;

#[actix_web::test]
async fn registration_token_names_a_stored_user() {
    let ctx = TestContext::new();
    let app = ctx.app().await;

    let auth = register(&app, "A", "a@x.com", "secret1").await;
    assert_eq!(auth.user.email, "a@x.com");

    let claims = common::tokens().verify(&auth.token).unwrap();
    assert_eq!(claims.sub, auth.user.id);
    let stored = ctx.state.users.find_by_id(&claims.sub).await.unwrap().unwrap();
    assert_eq!(stored.name, "A");
    assert_ne!(stored.password, "secret1");
}

#[actix_web::test]
async fn duplicate_email_conflicts() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    register(&app, "A", "a@x.com", "secret1").await;

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "name": "B", "email": "A@X.com", "password": "secret2" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User already exists");
}

#[actix_web::test]
async fn invalid_registration_is_rejected() {
    let ctx = TestContext::new();
    let app = ctx.app().await;

    for payload in [
        json!({ "name": "A", "email": "not-an-email", "password": "secret1" }),
        json!({ "name": "  ", "email": "a@x.com", "password": "secret1" }),
        json!({ "name": "A", "email": "a@x.com", "password": "123" }),
        json!({ "name": "A", "email": "a@x.com" }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["message"].is_string());
    }
}

#[actix_web::test]
async fn login_issues_a_token() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    let registered = register(&app, "A", "a@x.com", "secret1").await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "a@x.com", "password": "secret1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let auth: AuthResponse = test::read_body_json(resp).await;
    assert_eq!(auth.user.id, registered.user.id);
    assert!(common::tokens().verify(&auth.token).is_ok());
}

#[actix_web::test]
async fn login_failures_are_indistinguishable() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    register(&app, "A", "a@x.com", "secret1").await;

    let wrong_password = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "a@x.com", "password": "wrong-password" }))
        .to_request();
    let wrong_password = test::call_service(&app, wrong_password).await;
    let unknown_email = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "nobody@x.com", "password": "secret1" }))
        .to_request();
    let unknown_email = test::call_service(&app, unknown_email).await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), wrong_password.status());
    let a = test::read_body(wrong_password).await;
    let b = test::read_body(unknown_email).await;
    assert_eq!(a, b);
}

#[actix_web::test]
async fn protected_routes_require_a_valid_bearer() {
    let ctx = TestContext::new();
    let app = ctx.app().await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/tasks").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].is_string());

    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let forged = TokenIssuer::new("some-other-secret", Duration::hours(1))
        .issue("user-1")
        .unwrap();
    let req = test::TestRequest::get()
        .uri("/api/images")
        .insert_header(bearer(&forged))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let expired = TokenIssuer::new(SECRET, Duration::hours(-2)).issue("user-1").unwrap();
    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header(bearer(&expired))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Not authorized, token expired");
}

#[actix_web::test]
async fn health_and_fallback_are_json() {
    let ctx = TestContext::new();
    let app = ctx.app().await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["environment"], "test");
    assert!(body["timestamp"].is_string());

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(test::read_body(resp).await, "API is running...");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/nope").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Route not found");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].is_string());
}

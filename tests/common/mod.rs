#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, Error};
use chrono::Duration;
use serde_json::json;

use task_hub::auth::TokenIssuer;
use task_hub::models::AuthResponse;
use task_hub::routes;
use task_hub::state::AppState;
use task_hub::storage::LocalDiskStore;

pub const SECRET: &str = "integration-test-secret";
pub const BASE_URL: &str = "http://localhost:5000";

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub upload_dir: PathBuf,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_upload_limit(None)
    }

    pub fn with_upload_limit(limit: Option<usize>) -> Self {
        let upload_dir = std::env::temp_dir().join(format!("task-hub-it-{}", uuid::Uuid::new_v4()));
        // actix-files resolves its root once, so the directory must exist up front
        std::fs::create_dir_all(&upload_dir).unwrap();
        let images = Arc::new(LocalDiskStore::new(&upload_dir, BASE_URL));
        let mut state = AppState::in_memory(images, tokens());
        if let Some(limit) = limit {
            state.max_upload_bytes = limit;
        }
        TestContext {
            state: web::Data::new(state),
            upload_dir,
        }
    }

    pub async fn app(&self) -> impl Service<Request, Response = ServiceResponse, Error = Error> {
        test::init_service(App::new().configure(routes::configure(self.state.clone()))).await
    }

    pub fn stored_files(&self) -> usize {
        std::fs::read_dir(&self.upload_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}

pub fn tokens() -> TokenIssuer {
    TokenIssuer::new(SECRET, Duration::hours(1))
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub async fn register<S>(app: &S, name: &str, email: &str, password: &str) -> AuthResponse
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "name": name, "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201, "registration of {} failed", email);
    test::read_body_json(resp).await
}

/// Hand-built multipart body with a single file field.
pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "----task-hub-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    (format!("multipart/form-data; boundary={}", boundary), body)
}

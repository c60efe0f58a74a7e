mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::Value;

use common::{bearer, multipart_body, register, TestContext, BASE_URL};
use task_hub::models::StoredImage;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake image bytes";

fn upload_request(token: &str, field: &str, filename: &str, content_type: &str, data: &[u8]) -> test::TestRequest {
    let (header, body) = multipart_body(field, filename, content_type, data);
    test::TestRequest::post()
        .uri("/api/images/upload")
        .insert_header(bearer(token))
        .insert_header(("Content-Type", header))
        .set_payload(body)
}

#[actix_web::test]
async fn upload_list_serve_delete() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    let auth = register(&app, "A", "a@x.com", "secret1").await;

    let req = upload_request(&auth.token, "image", "cat photo.png", "image/png", PNG).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let stored: StoredImage = test::read_body_json(resp).await;
    assert!(stored.filename.ends_with("-cat_photo.png"));
    assert_eq!(stored.url, format!("{}/uploads/{}", BASE_URL, stored.filename));
    assert_eq!(ctx.stored_files(), 1);

    let req = test::TestRequest::get()
        .uri("/api/images")
        .insert_header(bearer(&auth.token))
        .to_request();
    let listed: Vec<StoredImage> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed, vec![stored.clone()]);

    let req = test::TestRequest::get()
        .uri(&format!("/uploads/{}", stored.filename))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await, PNG);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/images/{}", stored.filename))
        .insert_header(bearer(&auth.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Image deleted successfully");
    assert_eq!(ctx.stored_files(), 0);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/images/{}", stored.filename))
        .insert_header(bearer(&auth.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "File not found");
}

#[actix_web::test]
async fn oversize_upload_is_rejected_before_storage() {
    let ctx = TestContext::with_upload_limit(Some(8));
    let app = ctx.app().await;
    let auth = register(&app, "A", "a@x.com", "secret1").await;

    let req = upload_request(&auth.token, "image", "big.png", "image/png", PNG).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].as_str().unwrap().starts_with("File size exceeds"));
    assert_eq!(ctx.stored_files(), 0);
}

#[actix_web::test]
async fn non_images_and_missing_files_are_rejected() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    let auth = register(&app, "A", "a@x.com", "secret1").await;

    let req = upload_request(&auth.token, "image", "notes.txt", "text/plain", b"hello").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Only image files are allowed");

    let req = upload_request(&auth.token, "avatar", "cat.png", "image/png", PNG).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "No file uploaded");

    let req = upload_request(&auth.token, "image", "empty.png", "image/png", b"").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    assert_eq!(ctx.stored_files(), 0);
}

#[actix_web::test]
async fn image_routes_require_auth() {
    let ctx = TestContext::new();
    let app = ctx.app().await;

    let req = test::TestRequest::get().uri("/api/images").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let (header, body) = multipart_body("image", "cat.png", "image/png", PNG);
    let req = test::TestRequest::post()
        .uri("/api/images/upload")
        .insert_header(("Content-Type", header))
        .set_payload(body)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.stored_files(), 0);

    let req = test::TestRequest::delete().uri("/api/images/anything.png").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn path_traversal_is_refused() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    let auth = register(&app, "A", "a@x.com", "secret1").await;

    let outside = ctx.upload_dir.parent().unwrap().join(format!("{}-keep.png", uuid::Uuid::new_v4()));
    std::fs::write(&outside, PNG).unwrap();
    let escape = format!("../{}", outside.file_name().unwrap().to_str().unwrap());

    for target in ["..", "nested/secret.png", escape.as_str()] {
        let req = test::TestRequest::delete()
            .uri(&format!("/api/images/{}", target))
            .insert_header(bearer(&auth.token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", target);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["message"].as_str().unwrap().starts_with("Invalid filename"));
    }

    assert!(outside.exists());
    std::fs::remove_file(&outside).unwrap();
}

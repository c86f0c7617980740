//! Private (authenticated write) API tests.

mod common;

use common::{delete, get, image_bytes, multipart_request, put_without_file, TestApp, API_KEY};
use image::ImageFormat;
use meme_vault::domain::FileStorage;
use serde_json::json;

#[tokio::test]
async fn test_create_meme() {
    let app = TestApp::new();
    let png = image_bytes(ImageFormat::Png);

    let (status, created) = app
        .create("Funny Meme", "A very funny meme", "test.png", &png)
        .await;
    assert_eq!(status, 201);
    assert_eq!(
        created,
        json!({
            "id": 1,
            "title": "Funny Meme",
            "description": "A very funny meme",
            "image_url": "http://memes/Funny Meme_test.png",
        })
    );

    let (status, fetched) = app.public(get("/memes/1")).await;
    assert_eq!(status, 200);
    assert_eq!(fetched, created);

    let (stored, content_type) = app.storage.download("Funny Meme_test.png").await.unwrap();
    assert_eq!(stored, png);
    assert_eq!(content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn test_create_rejects_non_image() {
    let app = TestApp::new();
    let (status, body) = app
        .create("Fake", "not really", "fake.png", b"definitely not a png")
        .await;
    assert_eq!(status, 415);
    assert_eq!(body, json!({ "detail": "Uploaded file is not an image" }));

    let (_, memes) = app.public(get("/memes")).await;
    assert_eq!(memes, json!([]));
    assert!(app.storage.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_rejects_truncated_image() {
    let app = TestApp::new();
    let png = image_bytes(ImageFormat::Png);
    let (status, _) = app
        .create("Cut", "half a png", "cut.png", &png[..png.len() / 2])
        .await;
    assert_eq!(status, 415);
    assert!(app.storage.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_requires_title_and_file() {
    let app = TestApp::new();
    let png = image_bytes(ImageFormat::Png);

    let request = multipart_request("POST", "/memes?description=d", Some(API_KEY), "a.png", "image/png", &png);
    let (status, body) = app.private(request).await;
    assert_eq!(status, 400);
    assert!(body["detail"].as_str().unwrap().contains("title"));

    let request = axum::http::Request::post("/memes?title=t&description=d")
        .header("Authorization", API_KEY)
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = app.private(request).await;
    assert_eq!(status, 400);
    assert!(body["detail"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn test_write_routes_require_api_key() {
    let app = TestApp::new();
    let png = image_bytes(ImageFormat::Png);

    let request = multipart_request("POST", "/memes?title=t&description=d", None, "a.png", "image/png", &png);
    let (status, body) = app.private(request).await;
    assert_eq!(status, 401);
    assert_eq!(body, json!({ "detail": "Invalid API Key" }));

    let request = multipart_request("POST", "/memes?title=t&description=d", Some("wrong"), "a.png", "image/png", &png);
    let (status, _) = app.private(request).await;
    assert_eq!(status, 401);

    let (status, _) = app.private(put_without_file("/memes/1?title=x", Some("wrong"))).await;
    assert_eq!(status, 401);

    let (status, _) = app.private(delete("/memes/1", None)).await;
    assert_eq!(status, 401);

    assert!(app.storage.list().await.unwrap().is_empty());

    let (status, _) = app.private(get("/health")).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_update_meme() {
    let app = TestApp::new();
    let (status, created) = app
        .create("Funny Meme", "A very funny meme", "test.png", &image_bytes(ImageFormat::Png))
        .await;
    assert_eq!(status, 201);
    let meme_id = created["id"].as_i64().unwrap();

    let jpg = image_bytes(ImageFormat::Jpeg);
    let uri = format!("/memes/{}?title=Updated%20Meme&description=An%20updated%20meme", meme_id);
    let request = multipart_request("PUT", &uri, Some(API_KEY), "update_mem.jpg", "image/jpg", &jpg);
    let (status, updated) = app.private(request).await;
    assert_eq!(status, 200);
    assert_eq!(updated["id"], meme_id);
    assert_eq!(updated["title"], "Updated Meme");
    assert_eq!(updated["description"], "An updated meme");
    assert!(updated["image_url"].as_str().unwrap().ends_with("update_mem.jpg"));

    assert!(app.storage.download("Funny Meme_test.png").await.is_err());
    let (stored, _) = app.storage.download("Updated Meme_update_mem.jpg").await.unwrap();
    assert_eq!(stored, jpg);

    let (_, fetched) = app.public(get(&format!("/memes/{}", meme_id))).await;
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn test_update_fields_only_keeps_image() {
    let app = TestApp::new();
    let (_, created) = app
        .create("Funny Meme", "A very funny meme", "test.png", &image_bytes(ImageFormat::Png))
        .await;

    let (status, updated) = app
        .private(put_without_file("/memes/1?description=Now%20with%20context", Some(API_KEY)))
        .await;
    assert_eq!(status, 200);
    assert_eq!(updated["title"], "Funny Meme");
    assert_eq!(updated["description"], "Now with context");
    assert_eq!(updated["image_url"], created["image_url"]);
    assert_eq!(
        app.storage.list().await.unwrap(),
        vec!["Funny Meme_test.png".to_string()]
    );
}

#[tokio::test]
async fn test_update_with_invalid_image_is_rejected() {
    let app = TestApp::new();
    let (_, created) = app
        .create("Funny Meme", "A very funny meme", "test.png", &image_bytes(ImageFormat::Png))
        .await;

    let request = multipart_request("PUT", "/memes/1?title=Broken", Some(API_KEY), "bad.png", "image/png", b"garbage");
    let (status, _) = app.private(request).await;
    assert_eq!(status, 415);

    let (_, fetched) = app.public(get("/memes/1")).await;
    assert_eq!(fetched, created);
    assert_eq!(
        app.storage.list().await.unwrap(),
        vec!["Funny Meme_test.png".to_string()]
    );
}

#[tokio::test]
async fn test_update_missing_meme() {
    let app = TestApp::new();
    let (status, body) = app
        .private(put_without_file("/memes/7?title=x", Some(API_KEY)))
        .await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({ "detail": "Meme not found" }));
}

#[tokio::test]
async fn test_update_missing_meme_with_empty_title() {
    let app = TestApp::new();
    let (status, body) = app
        .private(put_without_file("/memes/999?title=", Some(API_KEY)))
        .await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({ "detail": "Meme not found" }));
}

#[tokio::test]
async fn test_update_existing_meme_with_empty_title() {
    let app = TestApp::new();
    let png = image_bytes(ImageFormat::Png);
    let (status, _) = app.create("Funny Meme", "d", "test.png", &png).await;
    assert_eq!(status, 201);

    let (status, _) = app
        .private(put_without_file("/memes/1?title=", Some(API_KEY)))
        .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_oversized_upload_is_payload_too_large() {
    let app = TestApp::with_upload_limit(1000);
    let request = multipart_request(
        "POST",
        "/memes?title=big&description=d",
        Some(API_KEY),
        "big.png",
        "image/png",
        &[0u8; 5000],
    );
    let (status, body) = app.private(request).await;
    assert_eq!(status, 413);
    assert!(body["detail"].is_string());
    assert!(app.storage.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_meme() {
    let app = TestApp::new();
    let (_, created) = app
        .create("Funny Meme", "A very funny meme", "test.png", &image_bytes(ImageFormat::Png))
        .await;

    let (status, deleted) = app.private(delete("/memes/1", Some(API_KEY))).await;
    assert_eq!(status, 200);
    assert_eq!(deleted, created);

    let (status, _) = app.public(get("/memes/1")).await;
    assert_eq!(status, 404);
    assert!(app.storage.list().await.unwrap().is_empty());

    let (status, _) = app.private(delete("/memes/1", Some(API_KEY))).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_full_lifecycle_scenario() {
    let app = TestApp::new();

    let (status, created) = app
        .create("Funny Meme", "A very funny meme", "test.png", &image_bytes(ImageFormat::Png))
        .await;
    assert_eq!(status, 201);
    assert_eq!(created["image_url"], "http://memes/Funny Meme_test.png");

    let request = multipart_request(
        "PUT",
        "/memes/1?title=Updated%20Meme&description=An%20updated%20meme",
        Some(API_KEY),
        "update_mem.jpg",
        "image/jpg",
        &image_bytes(ImageFormat::Jpeg),
    );
    let (status, updated) = app.private(request).await;
    assert_eq!(status, 200);
    assert_eq!(updated["image_url"], "http://memes/Updated Meme_update_mem.jpg");

    let (status, deleted) = app.private(delete("/memes/1", Some(API_KEY))).await;
    assert_eq!(status, 200);
    assert_eq!(deleted["id"], 1);
    assert_eq!(deleted["title"], "Updated Meme");

    let (status, _) = app.public(get("/memes/1")).await;
    assert_eq!(status, 404);
    assert!(app.storage.list().await.unwrap().is_empty());
}

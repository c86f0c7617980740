#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use http_body_util::BodyExt;
use image::ImageFormat;
use meme_vault::{
    auth::StaticApiKeys,
    db::init_memory_pool,
    lifecycle::StorageLayout,
    reads::ListPolicy,
    repositories::SqliteMemeRepository,
    routes::{create_private_router, create_public_router},
    storage::MemoryFileStorage,
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;

pub const API_KEY: &str = "JflNaq4Pmsh8fhJq";
const BOUNDARY: &str = "meme-vault-test-boundary";

/// Both routers over one in-memory database and one in-memory bucket.
pub struct TestApp {
    pub public: Router,
    pub private: Router,
    pub storage: Arc<MemoryFileStorage>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_policy(ListPolicy::default())
    }

    pub fn with_policy(policy: ListPolicy) -> Self {
        Self::build(policy, 10 * 1024 * 1024)
    }

    pub fn with_upload_limit(max_upload_bytes: usize) -> Self {
        Self::build(ListPolicy::default(), max_upload_bytes)
    }

    fn build(policy: ListPolicy, max_upload_bytes: usize) -> Self {
        let repo = Arc::new(SqliteMemeRepository::new(init_memory_pool().unwrap()));
        let storage = Arc::new(MemoryFileStorage::new());
        let state = Arc::new(AppState::new(
            repo,
            storage.clone(),
            Arc::new(StaticApiKeys::new(vec![API_KEY.to_string()])),
            StorageLayout::for_bucket("memes"),
            policy,
            max_upload_bytes,
        ));
        Self {
            public: create_public_router(state.clone()),
            private: create_private_router(state),
            storage,
        }
    }

    pub async fn public(&self, request: Request<Body>) -> (u16, Value) {
        send(self.public.clone(), request).await
    }

    pub async fn private(&self, request: Request<Body>) -> (u16, Value) {
        send(self.private.clone(), request).await
    }

    pub async fn create(&self, title: &str, description: &str, filename: &str, data: &[u8]) -> (u16, Value) {
        let uri = format!("/memes?title={}&description={}", encode(title), encode(description));
        let request = multipart_request("POST", &uri, Some(API_KEY), filename, guess_type(filename), data);
        self.private(request).await
    }
}

async fn send(app: Router, request: Request<Body>) -> (u16, Value) {
    let response: Response<Body> = app.oneshot(request).await.unwrap();
    let status = response.status().as_u16();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::delete(uri);
    if let Some(key) = api_key {
        builder = builder.header("Authorization", key);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn put_without_file(uri: &str, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::put(uri);
    if let Some(key) = api_key {
        builder = builder.header("Authorization", key);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn multipart_request(
    method: &str,
    uri: &str,
    api_key: Option<&str>,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", format!("multipart/form-data; boundary={}", BOUNDARY));
    if let Some(key) = api_key {
        builder = builder.header("Authorization", key);
    }
    builder.body(Body::from(body)).unwrap()
}

/// Percent-encodes spaces, which is all the test titles need.
pub fn encode(value: &str) -> String {
    value.replace(' ', "%20")
}

fn guess_type(filename: &str) -> &'static str {
    if filename.ends_with(".png") {
        "image/png"
    } else if filename.ends_with(".jpg") {
        "image/jpg"
    } else {
        "application/octet-stream"
    }
}

pub fn image_bytes(format: ImageFormat) -> Vec<u8> {
    let mut img = image::RgbImage::new(8, 8);
    for (x, _, pixel) in img.enumerate_pixels_mut() {
        *pixel = image::Rgb([(x * 30) as u8, 120, 200]);
    }
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, format)
        .unwrap();
    buf.into_inner()
}

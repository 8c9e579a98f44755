use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use ::common::storage::LocalFileStore;
use ::common::{FixedClock, ReadingConfig, StorageConfig};
use reqwest::Client;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;

use server::config::{AppConfig, CorsConfig, DatabaseConfig, RunMode, ServerConfig};
use server::state::AppState;

/// Instant every test server reports as "now": 2024-03-07T12:00:00Z.
pub const NOW_MILLIS: i64 = 1_709_812_800_000;

pub mod routes {
    pub const POSTS: &str = "/api/v1/posts";
    pub const TAGS: &str = "/api/v1/tags";
    pub const CATEGORIES: &str = "/api/v1/categories";
    pub const UPLOADS: &str = "/api/v1/uploads";
    pub const OPENAPI: &str = "/api-docs/openapi.json";

    pub fn post(id: i32) -> String {
        format!("/api/v1/posts/{id}")
    }

    pub fn post_by_slug(slug: &str) -> String {
        format!("/api/v1/posts/by-slug/{slug}")
    }

    pub fn tag(id: i32) -> String {
        format!("/api/v1/tags/{id}")
    }

    pub fn category(id: i32) -> String {
        format!("/api/v1/categories/{id}")
    }

    pub fn upload(id: i32) -> String {
        format!("/api/v1/uploads/{id}")
    }

    pub fn upload_attachment(id: i32) -> String {
        format!("/api/v1/uploads/{id}/attachment")
    }

    pub fn file(name: &str) -> String {
        format!("/files/{name}")
    }
}

/// A running test server backed by a throwaway SQLite file and upload dir.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub upload_dir: PathBuf,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let db = server::database::init_db(&db_url)
            .await
            .expect("Failed to initialize test database");

        let upload_dir = dir.path().join("_posts");
        let storage = StorageConfig {
            upload_dir: upload_dir.clone(),
            base_url: "http://localhost:3000/files".into(),
            max_file_size: 1024 * 1024,
        };
        let file_store = LocalFileStore::new(
            storage.upload_dir.clone(),
            storage.base_url.clone(),
            storage.max_file_size,
        )
        .await
        .expect("Failed to create file store");

        let app_config = AppConfig {
            mode: RunMode::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: Some(db_url),
            },
            storage,
            reading: ReadingConfig::default(),
        };

        let clock = FixedClock(
            Utc.timestamp_millis_opt(NOW_MILLIS)
                .single()
                .expect("valid timestamp"),
        );

        let state = AppState {
            db: db.clone(),
            config: app_config,
            file_store: Arc::new(file_store),
            clock: Arc::new(clock),
        };

        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            upload_dir,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_raw(&self, path: &str, body: &'static str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    async fn send_file(
        &self,
        request: reqwest::RequestBuilder,
        file_name: &str,
        file_bytes: Vec<u8>,
    ) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(file_bytes)
            .file_name(file_name.to_string())
            .mime_str("text/markdown")
            .expect("Failed to set MIME type");
        let form = reqwest::multipart::Form::new().part("file", part);

        let res = request
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }

    /// POST a file as the `file` multipart field.
    pub async fn upload(&self, file_name: &str, file_bytes: impl Into<Vec<u8>>) -> TestResponse {
        let request = self.client.post(self.url(routes::UPLOADS));
        self.send_file(request, file_name, file_bytes.into()).await
    }

    /// PUT a replacement file for an existing upload.
    pub async fn replace_attachment(
        &self,
        id: i32,
        file_name: &str,
        file_bytes: impl Into<Vec<u8>>,
    ) -> TestResponse {
        let request = self.client.put(self.url(&routes::upload_attachment(id)));
        self.send_file(request, file_name, file_bytes.into()).await
    }

    /// Upload a document and return the new upload's `id`.
    pub async fn create_upload(&self, file_name: &str, text: &str) -> i32 {
        let res = self.upload(file_name, text.as_bytes().to_vec()).await;
        assert_eq!(res.status, 201, "create_upload failed: {}", res.text);
        res.id()
    }

    /// Create a post via the API and return its `id`.
    pub async fn create_post(&self, title: &str) -> i32 {
        let res = self
            .post(
                routes::POSTS,
                &serde_json::json!({ "title": title, "content": "Some words here." }),
            )
            .await;
        assert_eq!(res.status, 201, "create_post failed: {}", res.text);
        res.id()
    }

    /// Create a tag via the API and return its `id`.
    pub async fn create_tag(&self, name: &str) -> i32 {
        let res = self
            .post(routes::TAGS, &serde_json::json!({ "name": name }))
            .await;
        assert_eq!(res.status, 201, "create_tag failed: {}", res.text);
        res.id()
    }

    /// Create a category via the API and return its `id`.
    pub async fn create_category(&self, name: &str) -> i32 {
        let res = self
            .post(routes::CATEGORIES, &serde_json::json!({ "name": name }))
            .await;
        assert_eq!(res.status, 201, "create_category failed: {}", res.text);
        res.id()
    }

    /// Fetch a post and return its JSON body.
    pub async fn fetch_post(&self, id: i32) -> Value {
        let res = self.get(&routes::post(id)).await;
        assert_eq!(res.status, 200, "fetch_post failed: {}", res.text);
        res.body
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }

    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}

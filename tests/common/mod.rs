use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::ServiceExt;

use mailpost::rbac::Role;
use mailpost::services::blog_cache::BlogCache;
use mailpost::services::dispatch::Dispatcher;
use mailpost::smtp::Mailer;
use mailpost::{app, db, AppState};

#[derive(Debug, Clone)]
pub struct SentMail {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
}

/// Recording transport with failure injection.
pub struct MockMailer {
    pub sent: Mutex<Vec<SentMail>>,
    pub fail_with: Mutex<Option<String>>,
}

impl MockMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(MockMailer {
            sent: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
        })
    }

    pub fn fail_next(&self, error: &str) {
        *self.fail_with.lock().unwrap() = Some(error.to_string());
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_sent(&self) -> Option<SentMail> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, subject: &str, body: &str, recipients: &[String]) -> Result<String> {
        if let Some(error) = self.fail_with.lock().unwrap().take() {
            anyhow::bail!("{}", error);
        }
        self.sent.lock().unwrap().push(SentMail {
            subject: subject.to_string(),
            body: body.to_string(),
            recipients: recipients.to_vec(),
        });
        Ok(format!("250 Ok: {} recipients accepted", recipients.len()))
    }
}

pub struct TestApp {
    pub pool: SqlitePool,
    pub mailer: Arc<MockMailer>,
    pub dispatcher: Arc<Dispatcher>,
    pub router: Router,
}

pub async fn test_app() -> TestApp {
    test_app_with_retry(None).await
}

pub async fn test_app_with_retry(retry_failed_after_secs: Option<i64>) -> TestApp {
    // Single connection so the in-memory database is shared across queries.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    db::run_migrations(&pool).await.expect("migrations");

    let mailer = MockMailer::new();
    let dispatcher = Arc::new(Dispatcher::new(
        pool.clone(),
        mailer.clone() as Arc<dyn Mailer>,
        retry_failed_after_secs,
    ));
    let state = AppState {
        pool: pool.clone(),
        mailer: mailer.clone() as Arc<dyn Mailer>,
        dispatcher: dispatcher.clone(),
        blog_cache: Arc::new(BlogCache::new(Duration::from_secs(15 * 60))),
        public_base_url: "http://localhost:3030".to_string(),
    };

    TestApp {
        pool,
        mailer,
        dispatcher,
        router: app(state),
    }
}

/// Insert a user row directly; returns (user_id, bearer token).
pub async fn seed_user(
    pool: &SqlitePool,
    email: &str,
    role: Role,
    verified: bool,
) -> (i64, String) {
    let hash = bcrypt::hash("password123", 4).expect("bcrypt");
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (email, password_hash, role, is_active, is_verified, created_at)
         VALUES (?, ?, ?, 1, ?, ?) RETURNING id",
    )
    .bind(email)
    .bind(&hash)
    .bind(role)
    .bind(verified)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .expect("seed user");
    (id, format!("{}:{}", id, role.as_str()))
}

pub async fn request(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", token);
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

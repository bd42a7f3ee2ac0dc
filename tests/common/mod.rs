//! Shared harness for API tests: router, tokens and scripted upstreams

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use marketplace_admin::{
    admin::{UserRole, Upstreams},
    db, server,
    upstream::{
        NotificationMessage, NotificationService, ReviewService, UpstreamError, UpstreamReply,
        UpstreamResult, UserDirectory,
    },
    AppContext, ServerConfig,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const SIGNING_KEY: &str = "integration-test-signing-key";

/// Admin configured through `ADMIN_USER_IDS`
pub const CONFIGURED_ADMIN: i64 = 900;

/// What a scripted upstream call does
#[derive(Clone)]
pub enum Script {
    Reply(StatusCode, Value),
    Unreachable,
}

/// Upstream fake keyed by operation name:
/// `list_client`, `list_freelancer`, `block`, `unblock`, `delete_review`,
/// `send_notification`, `list_notifications`
#[derive(Default)]
pub struct FakeUpstreams {
    scripts: Mutex<HashMap<&'static str, Script>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeUpstreams {
    pub fn script(&self, operation: &'static str, script: Script) {
        self.scripts.lock().unwrap().insert(operation, script);
    }

    /// Recorded `(call, credential)` pairs
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, operation: &'static str, call: String, credential: &str) -> UpstreamResult {
        self.calls
            .lock()
            .unwrap()
            .push((call, credential.to_string()));

        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(operation)
            .cloned()
            .unwrap_or(Script::Reply(StatusCode::OK, json!({})));

        match script {
            Script::Reply(status, body) => Ok(UpstreamReply::new(status, body)),
            Script::Unreachable => Err(UpstreamError::Unreachable {
                service: "fake",
                reason: "connection refused".to_string(),
            }),
        }
    }
}

#[async_trait]
impl UserDirectory for FakeUpstreams {
    async fn list_users(&self, role: UserRole, credential: &str) -> UpstreamResult {
        let operation = match role {
            UserRole::Client => "list_client",
            UserRole::Freelancer => "list_freelancer",
        };
        self.answer(operation, format!("list {}", role), credential)
    }

    async fn set_blocked(
        &self,
        role: UserRole,
        user_id: i64,
        blocked: bool,
        credential: &str,
    ) -> UpstreamResult {
        let operation = if blocked { "block" } else { "unblock" };
        self.answer(operation, format!("{} {} {}", operation, role, user_id), credential)
    }
}

#[async_trait]
impl ReviewService for FakeUpstreams {
    async fn delete_review(&self, review_id: i64, credential: &str) -> UpstreamResult {
        self.answer("delete_review", format!("delete_review {}", review_id), credential)
    }
}

#[async_trait]
impl NotificationService for FakeUpstreams {
    async fn send(&self, notification: &NotificationMessage, credential: &str) -> UpstreamResult {
        self.answer(
            "send_notification",
            format!(
                "send_notification {} {} {}",
                notification.user_id, notification.notification_type, notification.message
            ),
            credential,
        )
    }

    async fn list(&self, credential: &str) -> UpstreamResult {
        self.answer("list_notifications", "list_notifications".to_string(), credential)
    }
}

pub struct TestApp {
    pub router: Router,
    pub ctx: AppContext,
    pub upstreams: Arc<FakeUpstreams>,
}

impl TestApp {
    pub async fn new() -> Self {
        let config = ServerConfig::from_lookup(|key| match key {
            "JWT_SIGNING_KEY" => Some(SIGNING_KEY.to_string()),
            "ADMIN_USER_IDS" => Some(CONFIGURED_ADMIN.to_string()),
            "JWT_LEEWAY_SECS" => Some("0".to_string()),
            _ => None,
        })
        .unwrap();
        config.validate().unwrap();

        let pool = db::create_memory_pool().await.unwrap();
        let fakes = Arc::new(FakeUpstreams::default());
        let upstreams = Upstreams {
            users: fakes.clone(),
            reviews: fakes.clone(),
            notifications: fakes.clone(),
        };

        let ctx = AppContext::with_upstreams(config, pool, upstreams);
        let router = server::build_router(ctx.clone());

        Self {
            router,
            ctx,
            upstreams: fakes,
        }
    }

    /// Insert an admin profile row directly; profiles are managed outside this service
    pub async fn seed_profile(&self, user_id: i64, email: &str, is_super_admin: bool, is_active: bool) {
        sqlx::query(
            "INSERT INTO admin_profile (user_id, full_name, email, is_super_admin, is_active, created_at) \
             VALUES (?, 'Test Admin', ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(email)
        .bind(is_super_admin)
        .bind(is_active)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.ctx.db)
        .await
        .unwrap();
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    /// Number of audit entries, read through the API
    pub async fn audit_count(&self, token: &str) -> u64 {
        let (status, body) = self.get("/logs", token).await;
        assert_eq!(status, StatusCode::OK);
        body["count"].as_u64().unwrap()
    }
}

/// HS256 token valid for ten minutes
pub fn token(claims: Value) -> String {
    let mut claims = claims;
    if claims.get("exp").is_none() {
        claims["exp"] = json!(chrono::Utc::now().timestamp() + 600);
    }
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SIGNING_KEY.as_bytes()),
    )
    .unwrap()
}

/// Token for the admin listed in `ADMIN_USER_IDS`
pub fn admin_token() -> String {
    token(json!({ "user_id": CONFIGURED_ADMIN }))
}

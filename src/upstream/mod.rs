/// Upstream service clients
///
/// The admin service owns no user, review or notification data. Each
/// upstream is reached through a trait so handlers never see URLs and tests
/// can substitute fakes.

pub mod http;

pub use http::HttpUpstream;

use crate::admin::UserRole;
use async_trait::async_trait;
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Response from an upstream service that was reached
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: Value,
}

impl UpstreamReply {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Upstream could not be reached at all
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("{service} unreachable: {reason}")]
    Unreachable { service: &'static str, reason: String },

    #[error("{service} timed out")]
    Timeout { service: &'static str },
}

pub type UpstreamResult = Result<UpstreamReply, UpstreamError>;

/// Notification payload sent to the notification service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationMessage {
    pub user_id: i64,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub message: String,
}

/// Client and freelancer directories
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch the full user list for a role
    async fn list_users(&self, role: UserRole, credential: &str) -> UpstreamResult;

    /// Block or unblock a user
    async fn set_blocked(
        &self,
        role: UserRole,
        user_id: i64,
        blocked: bool,
        credential: &str,
    ) -> UpstreamResult;
}

#[async_trait]
pub trait ReviewService: Send + Sync {
    async fn delete_review(&self, review_id: i64, credential: &str) -> UpstreamResult;
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send(&self, notification: &NotificationMessage, credential: &str) -> UpstreamResult;

    async fn list(&self, credential: &str) -> UpstreamResult;
}

/// Admin Action Dispatcher
///
/// Runs moderation actions against the upstream services and the local
/// stores. Every action that succeeds is reported once to each registered
/// [`ActionObserver`]; failed actions are never reported.
use super::audit::{AdminAction, AdminActionType, TargetType};
use super::disputes::{DisputeManager, NewDispute, PaymentDispute};
use super::verification::{UserVerification, VerificationManager};
use super::UserRole;
use crate::error::{AdminError, AdminResult};
use crate::metrics;
use crate::pagination::PageRequest;
use crate::upstream::{
    NotificationMessage, NotificationService, ReviewService, UpstreamError, UpstreamReply,
    UpstreamResult, UserDirectory,
};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Longest message excerpt kept in a notification audit entry
const NOTIFICATION_EXCERPT_CHARS: usize = 50;

/// Hook invoked after an admin action succeeded
#[async_trait]
pub trait ActionObserver: Send + Sync {
    async fn action_completed(&self, action: &AdminAction);
}

/// Upstream service clients used by the dispatcher
#[derive(Clone)]
pub struct Upstreams {
    pub users: Arc<dyn UserDirectory>,
    pub reviews: Arc<dyn ReviewService>,
    pub notifications: Arc<dyn NotificationService>,
}

/// Merged client and freelancer listing
#[derive(Debug, Clone, Serialize)]
pub struct UserListing {
    pub clients: Value,
    pub freelancers: Value,
    pub page: u32,
    pub page_size: u32,
}

/// Dispatcher for admin actions
#[derive(Clone)]
pub struct AdminActionDispatcher {
    upstreams: Upstreams,
    disputes: DisputeManager,
    verifications: VerificationManager,
    observers: Vec<Arc<dyn ActionObserver>>,
}

impl AdminActionDispatcher {
    pub fn new(
        upstreams: Upstreams,
        disputes: DisputeManager,
        verifications: VerificationManager,
    ) -> Self {
        Self {
            upstreams,
            disputes,
            verifications,
            observers: Vec::new(),
        }
    }

    /// Register an observer for completed actions
    pub fn with_observer(mut self, observer: Arc<dyn ActionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    async fn completed(&self, action: AdminAction) {
        info!(
            admin_id = action.admin_id,
            action = action.action_type.as_str(),
            target_type = action.target_type.as_str(),
            target_id = action.target_id,
            "admin action completed"
        );
        metrics::record_admin_action(action.action_type.as_str(), action.target_type.as_str());

        for observer in &self.observers {
            observer.action_completed(&action).await;
        }
    }

    /// Fetch clients and freelancers concurrently, then filter and page each list
    pub async fn view_users(
        &self,
        credential: &str,
        search: Option<&str>,
        page: PageRequest,
    ) -> AdminResult<UserListing> {
        let (clients, freelancers) = tokio::join!(
            self.upstreams.users.list_users(UserRole::Client, credential),
            self.upstreams.users.list_users(UserRole::Freelancer, credential)
        );

        let unavailable = |e: UpstreamError| {
            warn!(error = %e, "user directory unreachable");
            AdminError::ServiceUnavailable("User services unavailable".to_string())
        };
        let clients = clients.map_err(unavailable)?;
        let freelancers = freelancers.map_err(unavailable)?;

        if !clients.is_success() || !freelancers.is_success() {
            warn!(
                client_status = clients.status.as_u16(),
                freelancer_status = freelancers.status.as_u16(),
                "user directory rejected listing"
            );
            return Err(AdminError::bad_gateway("Failed to fetch users"));
        }

        let search = search.map(str::trim).filter(|s| !s.is_empty());

        Ok(UserListing {
            clients: filter_users(clients.body, search, page),
            freelancers: filter_users(freelancers.body, search, page),
            page: page.page,
            page_size: page.page_size,
        })
    }

    pub async fn block_user(
        &self,
        admin_id: i64,
        credential: &str,
        role: UserRole,
        user_id: i64,
    ) -> AdminResult<()> {
        let reply = self
            .upstreams
            .users
            .set_blocked(role, user_id, true, credential)
            .await;
        expect_success(
            reply,
            "User service unavailable",
            AdminError::upstream_rejected("Failed to block user"),
        )?;

        self.completed(AdminAction {
            admin_id,
            action_type: AdminActionType::BlockUser,
            target_type: TargetType::User,
            target_id: user_id,
            description: format!("{} blocked", role),
        })
        .await;

        Ok(())
    }

    pub async fn unblock_user(
        &self,
        admin_id: i64,
        credential: &str,
        role: UserRole,
        user_id: i64,
    ) -> AdminResult<()> {
        let reply = self
            .upstreams
            .users
            .set_blocked(role, user_id, false, credential)
            .await;
        expect_success(
            reply,
            "User service unavailable",
            AdminError::upstream_rejected("Failed to unblock user"),
        )?;

        self.completed(AdminAction {
            admin_id,
            action_type: AdminActionType::UnblockUser,
            target_type: TargetType::User,
            target_id: user_id,
            description: format!("{} unblocked", role),
        })
        .await;

        Ok(())
    }

    pub async fn delete_review(
        &self,
        admin_id: i64,
        credential: &str,
        review_id: i64,
    ) -> AdminResult<()> {
        let reply = self.upstreams.reviews.delete_review(review_id, credential).await;
        expect_success(
            reply,
            "Review service unavailable",
            AdminError::upstream_rejected("Failed to delete review"),
        )?;

        self.completed(AdminAction {
            admin_id,
            action_type: AdminActionType::DeleteReview,
            target_type: TargetType::Review,
            target_id: review_id,
            description: "Review deleted by admin".to_string(),
        })
        .await;

        Ok(())
    }

    pub async fn send_notification(
        &self,
        admin_id: i64,
        credential: &str,
        notification: NotificationMessage,
    ) -> AdminResult<()> {
        if notification.user_id <= 0
            || notification.notification_type.trim().is_empty()
            || notification.message.trim().is_empty()
        {
            return Err(AdminError::Validation(
                "user_id, type, and message are required".to_string(),
            ));
        }

        let reply = self.upstreams.notifications.send(&notification, credential).await;
        expect_success(
            reply,
            "Notification service unavailable",
            AdminError::bad_gateway("Notification failed"),
        )?;

        let excerpt: String = notification
            .message
            .chars()
            .take(NOTIFICATION_EXCERPT_CHARS)
            .collect();

        self.completed(AdminAction {
            admin_id,
            action_type: AdminActionType::SendNotification,
            target_type: TargetType::User,
            target_id: notification.user_id,
            description: format!(
                "Type: {}, Message: {}",
                notification.notification_type, excerpt
            ),
        })
        .await;

        Ok(())
    }

    /// Pass the notification listing through with its upstream status
    pub async fn list_notifications(&self, credential: &str) -> AdminResult<UpstreamReply> {
        self.upstreams.notifications.list(credential).await.map_err(|e| {
            warn!(error = %e, "notification service unreachable");
            AdminError::ServiceUnavailable("Notification service unavailable".to_string())
        })
    }

    pub async fn verify_user(
        &self,
        admin_id: i64,
        user_id: i64,
        user_type: UserRole,
        remarks: Option<&str>,
    ) -> AdminResult<UserVerification> {
        let verification = self
            .verifications
            .verify(user_id, user_type, admin_id, remarks)
            .await?;

        self.completed(AdminAction {
            admin_id,
            action_type: AdminActionType::VerifyUser,
            target_type: TargetType::User,
            target_id: user_id,
            description: format!("User {} verified", user_type),
        })
        .await;

        Ok(verification)
    }

    pub async fn create_dispute(
        &self,
        admin_id: i64,
        new: NewDispute,
    ) -> AdminResult<PaymentDispute> {
        let dispute = self.disputes.create(&new).await?;

        self.completed(AdminAction {
            admin_id,
            action_type: AdminActionType::PaymentDisputeCreated,
            target_type: TargetType::Payment,
            target_id: dispute.payment_id,
            description: format!("Reason: {}", dispute.reason),
        })
        .await;

        Ok(dispute)
    }

    pub async fn resolve_dispute(
        &self,
        admin_id: i64,
        dispute_id: i64,
        resolution: &str,
    ) -> AdminResult<PaymentDispute> {
        let dispute = self.disputes.resolve(dispute_id, resolution, admin_id).await?;

        self.completed(AdminAction {
            admin_id,
            action_type: AdminActionType::DisputeResolved,
            target_type: TargetType::Payment,
            target_id: dispute.payment_id,
            description: format!("Resolution: {}", resolution.trim()),
        })
        .await;

        Ok(dispute)
    }

    pub async fn reject_dispute(
        &self,
        admin_id: i64,
        dispute_id: i64,
        reason: &str,
    ) -> AdminResult<PaymentDispute> {
        let dispute = self.disputes.reject(dispute_id, reason, admin_id).await?;

        self.completed(AdminAction {
            admin_id,
            action_type: AdminActionType::DisputeRejected,
            target_type: TargetType::Payment,
            target_id: dispute.payment_id,
            description: format!("Rejection: {}", reason.trim()),
        })
        .await;

        Ok(dispute)
    }
}

/// Map an upstream outcome onto the caller-facing error taxonomy
fn expect_success(
    reply: UpstreamResult,
    unavailable: &str,
    rejected: AdminError,
) -> AdminResult<UpstreamReply> {
    match reply {
        Ok(reply) if reply.is_success() => Ok(reply),
        Ok(reply) => {
            warn!(status = reply.status.as_u16(), "upstream rejected action");
            Err(rejected)
        }
        Err(e) => {
            warn!(error = %e, "upstream unreachable");
            Err(AdminError::ServiceUnavailable(unavailable.to_string()))
        }
    }
}

/// Non-array bodies are returned untouched
fn filter_users(body: Value, search: Option<&str>, page: PageRequest) -> Value {
    let Value::Array(users) = body else {
        return body;
    };

    let users = match search {
        Some(query) => {
            let query = query.to_lowercase();
            users
                .into_iter()
                .filter(|user| user_matches(user, &query))
                .collect()
        }
        None => users,
    };

    Value::Array(page.slice(users))
}

fn user_matches(user: &Value, query: &str) -> bool {
    ["name", "email"].iter().any(|field| {
        user.get(field)
            .and_then(Value::as_str)
            .map(|value| value.to_lowercase().contains(query))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::disputes::DisputeStatus;
    use crate::db;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Mutex;

    /// Scripted upstream: every call answers with `status`, or fails in transport
    struct FakeUpstream {
        status: Option<StatusCode>,
        body: Value,
        calls: Mutex<Vec<String>>,
    }

    impl FakeUpstream {
        fn answering(status: StatusCode, body: Value) -> Arc<Self> {
            Arc::new(Self {
                status: Some(status),
                body,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                status: None,
                body: Value::Null,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn reply(&self, call: String) -> UpstreamResult {
            self.calls.lock().unwrap().push(call);
            match self.status {
                Some(status) => Ok(UpstreamReply::new(status, self.body.clone())),
                None => Err(UpstreamError::Timeout { service: "fake" }),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UserDirectory for FakeUpstream {
        async fn list_users(&self, role: UserRole, credential: &str) -> UpstreamResult {
            self.reply(format!("list {} {}", role, credential))
        }

        async fn set_blocked(
            &self,
            role: UserRole,
            user_id: i64,
            blocked: bool,
            credential: &str,
        ) -> UpstreamResult {
            self.reply(format!("blocked={} {} {} {}", blocked, role, user_id, credential))
        }
    }

    #[async_trait]
    impl ReviewService for FakeUpstream {
        async fn delete_review(&self, review_id: i64, credential: &str) -> UpstreamResult {
            self.reply(format!("delete {} {}", review_id, credential))
        }
    }

    #[async_trait]
    impl NotificationService for FakeUpstream {
        async fn send(&self, notification: &NotificationMessage, credential: &str) -> UpstreamResult {
            self.reply(format!("send {} {}", notification.user_id, credential))
        }

        async fn list(&self, credential: &str) -> UpstreamResult {
            self.reply(format!("list {}", credential))
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        actions: Mutex<Vec<AdminAction>>,
    }

    impl RecordingObserver {
        fn actions(&self) -> Vec<AdminAction> {
            self.actions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ActionObserver for RecordingObserver {
        async fn action_completed(&self, action: &AdminAction) {
            self.actions.lock().unwrap().push(action.clone());
        }
    }

    async fn dispatcher_with(
        upstream: Arc<FakeUpstream>,
    ) -> (AdminActionDispatcher, Arc<RecordingObserver>) {
        let pool = db::create_memory_pool().await.unwrap();
        let observer = Arc::new(RecordingObserver::default());
        let upstreams = Upstreams {
            users: upstream.clone(),
            reviews: upstream.clone(),
            notifications: upstream,
        };
        let dispatcher = AdminActionDispatcher::new(
            upstreams,
            DisputeManager::new(pool.clone()),
            VerificationManager::new(pool),
        )
        .with_observer(observer.clone());
        (dispatcher, observer)
    }

    fn notification(message: &str) -> NotificationMessage {
        NotificationMessage {
            user_id: 4,
            notification_type: "warning".to_string(),
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_block_success_reports_once() {
        let upstream = FakeUpstream::answering(StatusCode::OK, json!({}));
        let (dispatcher, observer) = dispatcher_with(upstream.clone()).await;

        dispatcher
            .block_user(1, "Bearer t", UserRole::Freelancer, 7)
            .await
            .unwrap();

        assert_eq!(upstream.calls(), vec!["blocked=true freelancer 7 Bearer t"]);
        let actions = observer.actions();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action_type, AdminActionType::BlockUser);
        assert_eq!(actions[0].target_type, TargetType::User);
        assert_eq!(actions[0].target_id, 7);
        assert_eq!(actions[0].description, "freelancer blocked");
    }

    #[tokio::test]
    async fn test_block_rejected_reports_nothing() {
        let upstream = FakeUpstream::answering(StatusCode::NOT_FOUND, Value::Null);
        let (dispatcher, observer) = dispatcher_with(upstream).await;

        let err = dispatcher
            .unblock_user(1, "Bearer t", UserRole::Client, 7)
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Failed to unblock user");
        assert!(observer.actions().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_unavailable() {
        let (dispatcher, observer) = dispatcher_with(FakeUpstream::unreachable()).await;

        let err = dispatcher.delete_review(1, "Bearer t", 3).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "Review service unavailable");

        let err = dispatcher
            .send_notification(1, "Bearer t", notification("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Notification service unavailable");

        assert!(observer.actions().is_empty());
    }

    #[tokio::test]
    async fn test_notification_rejected_is_bad_gateway() {
        let upstream = FakeUpstream::answering(StatusCode::INTERNAL_SERVER_ERROR, Value::Null);
        let (dispatcher, observer) = dispatcher_with(upstream).await;

        let err = dispatcher
            .send_notification(1, "Bearer t", notification("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(observer.actions().is_empty());
    }

    #[tokio::test]
    async fn test_notification_description_truncated() {
        let upstream = FakeUpstream::answering(StatusCode::CREATED, json!({"id": 1}));
        let (dispatcher, observer) = dispatcher_with(upstream).await;

        let long = "é".repeat(80);
        dispatcher
            .send_notification(2, "Bearer t", notification(&long))
            .await
            .unwrap();

        let actions = observer.actions();
        assert_eq!(actions[0].target_id, 4);
        assert_eq!(
            actions[0].description,
            format!("Type: warning, Message: {}", "é".repeat(50))
        );
    }

    #[tokio::test]
    async fn test_notification_requires_fields() {
        let upstream = FakeUpstream::answering(StatusCode::CREATED, Value::Null);
        let (dispatcher, _) = dispatcher_with(upstream.clone()).await;

        let err = dispatcher
            .send_notification(2, "Bearer t", notification("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Validation(_)));
        assert!(upstream.calls().is_empty());
    }

    #[tokio::test]
    async fn test_view_users_filters_and_pages() {
        let users = json!([
            {"id": 1, "name": "Alice Smith", "email": "alice@example.com"},
            {"id": 2, "name": "Bob", "email": "bob@SMITH.org"},
            {"id": 3, "name": "Carol", "email": "carol@example.com"},
            {"id": 4, "name": "Smithers"}
        ]);
        let upstream = FakeUpstream::answering(StatusCode::OK, users);
        let (dispatcher, _) = dispatcher_with(upstream.clone()).await;

        let listing = dispatcher
            .view_users("Bearer t", Some("smith"), PageRequest::parse(Some("1"), Some("2")))
            .await
            .unwrap();

        let ids: Vec<i64> = listing
            .clients
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(listing.freelancers.as_array().unwrap().len(), 2);
        assert_eq!(listing.page_size, 2);

        let mut calls = upstream.calls();
        calls.sort();
        assert_eq!(calls, vec!["list client Bearer t", "list freelancer Bearer t"]);
    }

    #[tokio::test]
    async fn test_view_users_non_array_passthrough() {
        let body = json!({"detail": "paginated elsewhere"});
        let upstream = FakeUpstream::answering(StatusCode::OK, body.clone());
        let (dispatcher, _) = dispatcher_with(upstream).await;

        let listing = dispatcher
            .view_users("Bearer t", Some("x"), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(listing.clients, body);
    }

    #[tokio::test]
    async fn test_view_users_failures() {
        let (dispatcher, _) = dispatcher_with(FakeUpstream::unreachable()).await;
        let err = dispatcher
            .view_users("Bearer t", None, PageRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let upstream = FakeUpstream::answering(StatusCode::FORBIDDEN, Value::Null);
        let (dispatcher, _) = dispatcher_with(upstream).await;
        let err = dispatcher
            .view_users("Bearer t", None, PageRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "Failed to fetch users");
    }

    #[tokio::test]
    async fn test_dispute_lifecycle_reports_each_step() {
        let (dispatcher, observer) =
            dispatcher_with(FakeUpstream::answering(StatusCode::OK, Value::Null)).await;

        let dispute = dispatcher
            .create_dispute(
                9,
                NewDispute {
                    payment_id: 1,
                    application_id: None,
                    raised_by: 9,
                    client_id: Some(2),
                    freelancer_id: Some(3),
                    reason: "no payment".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();

        let resolved = dispatcher
            .resolve_dispute(9, dispute.id, "refunded")
            .await
            .unwrap();
        assert_eq!(resolved.status, DisputeStatus::Resolved);

        let err = dispatcher
            .reject_dispute(9, dispute.id, "too late")
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Conflict(_)));

        let actions = observer.actions();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].action_type, AdminActionType::PaymentDisputeCreated);
        assert_eq!(actions[1].action_type, AdminActionType::DisputeResolved);
        assert_eq!(actions[1].target_type, TargetType::Payment);
        assert_eq!(actions[1].target_id, 1);
        assert_eq!(actions[1].description, "Resolution: refunded");
    }

    #[tokio::test]
    async fn test_verify_user_reports() {
        let (dispatcher, observer) =
            dispatcher_with(FakeUpstream::answering(StatusCode::OK, Value::Null)).await;

        let verification = dispatcher
            .verify_user(9, 42, UserRole::Client, None)
            .await
            .unwrap();
        assert!(verification.is_verified);
        assert_eq!(verification.verified_by, Some(9));

        let actions = observer.actions();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].description, "User client verified");
    }
}

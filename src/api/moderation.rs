/// Review and notification moderation endpoints
use super::extract::{parse_id, ValidatedJson};
use crate::{
    auth::AdminAuthContext,
    error::AdminResult,
    upstream::NotificationMessage,
    AppContext,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

/// Build moderation routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/reviews/:id", delete(delete_review))
        .route("/notifications", get(list_notifications))
        .route("/notifications/send", post(send_notification))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendNotificationRequest {
    #[validate(
        required(message = "user_id, type, and message are required"),
        range(min = 1, message = "user_id, type, and message are required")
    )]
    pub user_id: Option<i64>,
    #[serde(rename = "type")]
    #[validate(
        required(message = "user_id, type, and message are required"),
        length(min = 1, message = "user_id, type, and message are required")
    )]
    pub notification_type: Option<String>,
    #[validate(
        required(message = "user_id, type, and message are required"),
        length(min = 1, message = "user_id, type, and message are required")
    )]
    pub message: Option<String>,
}

async fn delete_review(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<String>,
) -> AdminResult<Json<Value>> {
    let review_id = parse_id(&id, "review id")?;

    ctx.dispatcher
        .delete_review(auth.user_id, &auth.credential, review_id)
        .await?;

    Ok(Json(json!({ "message": "Review deleted" })))
}

async fn send_notification(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ValidatedJson(req): ValidatedJson<SendNotificationRequest>,
) -> AdminResult<Json<Value>> {
    let notification = NotificationMessage {
        user_id: req.user_id.unwrap_or_default(),
        notification_type: req.notification_type.unwrap_or_default(),
        message: req.message.unwrap_or_default(),
    };

    ctx.dispatcher
        .send_notification(auth.user_id, &auth.credential, notification)
        .await?;

    Ok(Json(json!({ "message": "Notification sent" })))
}

/// Upstream listing, returned with the upstream status
async fn list_notifications(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
) -> AdminResult<(StatusCode, Json<Value>)> {
    let reply = ctx.dispatcher.list_notifications(&auth.credential).await?;
    Ok((reply.status, Json(reply.body)))
}

/// User directory endpoints: listing, blocking and verification
use super::extract::{non_empty, parse_id, ValidatedJson};
use crate::{
    admin::{UserListing, UserRole, UserVerification},
    auth::AdminAuthContext,
    error::AdminResult,
    pagination::PageRequest,
    AppContext,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

/// Build user routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/users", get(view_users))
        .route("/users/verify", post(verify_user))
        .route("/users/:role/:id/block", patch(block_user))
        .route("/users/:role/:id/unblock", patch(unblock_user))
}

#[derive(Debug, Deserialize)]
pub struct ViewUsersQuery {
    search: Option<String>,
    page: Option<String>,
    page_size: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyUserRequest {
    #[validate(
        required(message = "user_id and user_type are required"),
        range(min = 1, message = "user_id and user_type are required")
    )]
    pub user_id: Option<i64>,
    #[validate(
        required(message = "user_id and user_type are required"),
        length(min = 1, message = "user_id and user_type are required")
    )]
    pub user_type: Option<String>,
    #[validate(length(max = 2000))]
    pub remarks: Option<String>,
}

/// Merged client and freelancer directory
async fn view_users(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Query(query): Query<ViewUsersQuery>,
) -> AdminResult<Json<UserListing>> {
    let page = PageRequest::parse(query.page.as_deref(), query.page_size.as_deref());
    let search = non_empty(query.search);

    let listing = ctx
        .dispatcher
        .view_users(&auth.credential, search.as_deref(), page)
        .await?;

    Ok(Json(listing))
}

async fn block_user(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path((role, id)): Path<(String, String)>,
) -> AdminResult<Json<Value>> {
    let role = UserRole::from_str(&role)?;
    let user_id = parse_id(&id, "user id")?;

    ctx.dispatcher
        .block_user(auth.user_id, &auth.credential, role, user_id)
        .await?;

    Ok(Json(json!({ "message": "User blocked" })))
}

async fn unblock_user(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path((role, id)): Path<(String, String)>,
) -> AdminResult<Json<Value>> {
    let role = UserRole::from_str(&role)?;
    let user_id = parse_id(&id, "user id")?;

    ctx.dispatcher
        .unblock_user(auth.user_id, &auth.credential, role, user_id)
        .await?;

    Ok(Json(json!({ "message": "User unblocked" })))
}

/// Record a manual verification
async fn verify_user(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ValidatedJson(req): ValidatedJson<VerifyUserRequest>,
) -> AdminResult<(StatusCode, Json<UserVerification>)> {
    // Both are present once validation passed
    let user_id = req.user_id.unwrap_or_default();
    let user_type = UserRole::from_str(req.user_type.as_deref().unwrap_or_default())?;

    let verification = ctx
        .dispatcher
        .verify_user(auth.user_id, user_id, user_type, req.remarks.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(verification)))
}

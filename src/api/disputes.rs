/// Payment dispute endpoints
use super::extract::{non_empty, parse_id, parse_optional_id, ValidatedJson};
use crate::{
    admin::{DisputeFilter, DisputeStatus, NewDispute, PaymentDispute},
    auth::AdminAuthContext,
    error::AdminResult,
    pagination::{PageRequest, Paginated},
    AppContext,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

/// Build dispute routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/disputes", get(list_disputes).post(create_dispute))
        .route("/disputes/:id", get(get_dispute))
        .route("/disputes/:id/resolve", patch(resolve_dispute))
        .route("/disputes/:id/reject", patch(reject_dispute))
}

#[derive(Debug, Deserialize)]
pub struct ListDisputesQuery {
    status: Option<String>,
    user_id: Option<String>,
    search: Option<String>,
    page: Option<String>,
    page_size: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDisputeRequest {
    #[validate(
        required(message = "Required fields: payment_id, client_id, freelancer_id, reason"),
        range(min = 1, message = "Required fields: payment_id, client_id, freelancer_id, reason")
    )]
    pub payment_id: Option<i64>,
    #[validate(
        required(message = "Required fields: payment_id, client_id, freelancer_id, reason"),
        range(min = 1, message = "Required fields: payment_id, client_id, freelancer_id, reason")
    )]
    pub client_id: Option<i64>,
    #[validate(
        required(message = "Required fields: payment_id, client_id, freelancer_id, reason"),
        range(min = 1, message = "Required fields: payment_id, client_id, freelancer_id, reason")
    )]
    pub freelancer_id: Option<i64>,
    #[validate(
        required(message = "Required fields: payment_id, client_id, freelancer_id, reason"),
        length(min = 1, message = "Required fields: payment_id, client_id, freelancer_id, reason")
    )]
    pub reason: Option<String>,
    #[validate(range(min = 1))]
    pub application_id: Option<i64>,
    /// Defaults to the calling admin
    #[validate(range(min = 1))]
    pub raised_by: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResolveDisputeRequest {
    resolution: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectDisputeRequest {
    reason: Option<String>,
}

async fn list_disputes(
    State(ctx): State<AppContext>,
    _auth: AdminAuthContext,
    Query(query): Query<ListDisputesQuery>,
) -> AdminResult<Json<Paginated<PaymentDispute>>> {
    let page = PageRequest::parse(query.page.as_deref(), query.page_size.as_deref());

    // A status no dispute can hold matches nothing
    let status = match non_empty(query.status) {
        Some(s) => match DisputeStatus::from_str(&s) {
            Ok(status) => Some(status),
            Err(_) => return Ok(Json(Paginated::new(Vec::new(), 0, page))),
        },
        None => None,
    };

    let filter = DisputeFilter {
        status,
        user_id: parse_optional_id(query.user_id.as_deref(), "user_id")?,
        search: non_empty(query.search),
    };

    let (disputes, count) = ctx.disputes.list(&filter, page).await?;

    Ok(Json(Paginated::new(disputes, count, page)))
}

async fn create_dispute(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ValidatedJson(req): ValidatedJson<CreateDisputeRequest>,
) -> AdminResult<(StatusCode, Json<PaymentDispute>)> {
    let new = NewDispute {
        payment_id: req.payment_id.unwrap_or_default(),
        application_id: req.application_id,
        raised_by: req.raised_by.unwrap_or(auth.user_id),
        client_id: req.client_id,
        freelancer_id: req.freelancer_id,
        reason: req.reason.unwrap_or_default(),
        description: non_empty(req.description),
    };

    let dispute = ctx.dispatcher.create_dispute(auth.user_id, new).await?;

    Ok((StatusCode::CREATED, Json(dispute)))
}

async fn get_dispute(
    State(ctx): State<AppContext>,
    _auth: AdminAuthContext,
    Path(id): Path<String>,
) -> AdminResult<Json<PaymentDispute>> {
    let dispute_id = parse_id(&id, "dispute id")?;
    Ok(Json(ctx.disputes.get(dispute_id).await?))
}

/// Resolve an open dispute; the body may be missing so lookup errors win
async fn resolve_dispute(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<String>,
    body: Option<Json<ResolveDisputeRequest>>,
) -> AdminResult<Json<PaymentDispute>> {
    let dispute_id = parse_id(&id, "dispute id")?;
    let Json(req) = body.unwrap_or_default();

    let dispute = ctx
        .dispatcher
        .resolve_dispute(auth.user_id, dispute_id, req.resolution.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(dispute))
}

async fn reject_dispute(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<String>,
    body: Option<Json<RejectDisputeRequest>>,
) -> AdminResult<Json<PaymentDispute>> {
    let dispute_id = parse_id(&id, "dispute id")?;
    let Json(req) = body.unwrap_or_default();

    let dispute = ctx
        .dispatcher
        .reject_dispute(auth.user_id, dispute_id, req.reason.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(dispute))
}

/// Audit log and caller identity endpoints
use super::extract::{non_empty, parse_optional_id};
use crate::{
    admin::{AdminActionType, AdminProfile, AuditFilter, AuditLogEntry, TargetType},
    auth::AdminAuthContext,
    error::AdminResult,
    pagination::{PageRequest, Paginated},
    AppContext,
};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Build audit routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/logs", get(list_logs))
        .route("/me", get(whoami))
}

#[derive(Debug, Deserialize)]
pub struct ListLogsQuery {
    action: Option<String>,
    admin_id: Option<String>,
    target_type: Option<String>,
    search: Option<String>,
    page: Option<String>,
    page_size: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub user_id: i64,
    pub is_super_admin: bool,
    pub profile: Option<AdminProfile>,
}

async fn list_logs(
    State(ctx): State<AppContext>,
    _auth: AdminAuthContext,
    Query(query): Query<ListLogsQuery>,
) -> AdminResult<Json<Paginated<AuditLogEntry>>> {
    let page = PageRequest::parse(query.page.as_deref(), query.page_size.as_deref());

    // Unknown action or target names match no entries
    let action_type = match non_empty(query.action).map(|a| AdminActionType::from_str(&a)) {
        Some(Ok(action_type)) => Some(action_type),
        Some(Err(_)) => return Ok(Json(Paginated::new(Vec::new(), 0, page))),
        None => None,
    };
    let target_type = match non_empty(query.target_type).map(|t| TargetType::from_str(&t)) {
        Some(Ok(target_type)) => Some(target_type),
        Some(Err(_)) => return Ok(Json(Paginated::new(Vec::new(), 0, page))),
        None => None,
    };

    let filter = AuditFilter {
        action_type,
        admin_id: parse_optional_id(query.admin_id.as_deref(), "admin_id")?,
        target_type,
        search: non_empty(query.search),
    };

    let (entries, count) = ctx.audit_log.list(&filter, page).await?;

    Ok(Json(Paginated::new(entries, count, page)))
}

/// The authenticated admin principal
async fn whoami(auth: AdminAuthContext) -> Json<WhoAmI> {
    Json(WhoAmI {
        user_id: auth.user_id,
        is_super_admin: auth.is_super_admin,
        profile: auth.profile,
    })
}

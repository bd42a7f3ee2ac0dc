/// Admin Action Audit Log
///
/// Append-only record of every successful administrative action.
use super::{format_timestamp, like_pattern, parse_timestamp};
use crate::admin::dispatcher::ActionObserver;
use crate::error::{AdminError, AdminResult};
use crate::pagination::PageRequest;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

/// Audited action types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminActionType {
    BlockUser,
    UnblockUser,
    VerifyUser,
    PaymentDisputeCreated,
    DisputeResolved,
    DisputeRejected,
    DeleteReview,
    SendNotification,
}

impl AdminActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminActionType::BlockUser => "BLOCK_USER",
            AdminActionType::UnblockUser => "UNBLOCK_USER",
            AdminActionType::VerifyUser => "VERIFY_USER",
            AdminActionType::PaymentDisputeCreated => "PAYMENT_DISPUTE_CREATED",
            AdminActionType::DisputeResolved => "DISPUTE_RESOLVED",
            AdminActionType::DisputeRejected => "DISPUTE_REJECTED",
            AdminActionType::DeleteReview => "DELETE_REVIEW",
            AdminActionType::SendNotification => "SEND_NOTIFICATION",
        }
    }

    pub fn from_str(s: &str) -> AdminResult<Self> {
        match s.to_uppercase().as_str() {
            "BLOCK_USER" => Ok(AdminActionType::BlockUser),
            "UNBLOCK_USER" => Ok(AdminActionType::UnblockUser),
            "VERIFY_USER" => Ok(AdminActionType::VerifyUser),
            "PAYMENT_DISPUTE_CREATED" => Ok(AdminActionType::PaymentDisputeCreated),
            "DISPUTE_RESOLVED" => Ok(AdminActionType::DisputeResolved),
            "DISPUTE_REJECTED" => Ok(AdminActionType::DisputeRejected),
            "DELETE_REVIEW" => Ok(AdminActionType::DeleteReview),
            "SEND_NOTIFICATION" => Ok(AdminActionType::SendNotification),
            _ => Err(AdminError::Validation(format!("Invalid action type: {}", s))),
        }
    }
}

/// Kind of resource an action was applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    User,
    Payment,
    Review,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::User => "user",
            TargetType::Payment => "payment",
            TargetType::Review => "review",
        }
    }

    pub fn from_str(s: &str) -> AdminResult<Self> {
        match s.to_lowercase().as_str() {
            "user" => Ok(TargetType::User),
            "payment" => Ok(TargetType::Payment),
            "review" => Ok(TargetType::Review),
            _ => Err(AdminError::Validation(format!("Invalid target type: {}", s))),
        }
    }
}

/// A completed action, before it is persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAction {
    pub admin_id: i64,
    pub action_type: AdminActionType,
    pub target_type: TargetType,
    pub target_id: i64,
    pub description: String,
}

/// Persisted audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub admin_id: i64,
    pub action_type: AdminActionType,
    pub target_type: TargetType,
    pub target_id: i64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Audit log listing filters
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub action_type: Option<AdminActionType>,
    pub admin_id: Option<i64>,
    pub target_type: Option<TargetType>,
    /// Matches description, action type, or target id
    pub search: Option<String>,
}

/// Audit log store
#[derive(Clone)]
pub struct AuditLog {
    db: SqlitePool,
}

impl AuditLog {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Append an entry
    pub async fn append(&self, action: &AdminAction) -> AdminResult<AuditLogEntry> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO admin_action_log (admin_id, action_type, target_type, target_id, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(action.admin_id)
        .bind(action.action_type.as_str())
        .bind(action.target_type.as_str())
        .bind(action.target_id)
        .bind(&action.description)
        .bind(format_timestamp(now))
        .execute(&self.db)
        .await?;

        Ok(AuditLogEntry {
            id: result.last_insert_rowid(),
            admin_id: action.admin_id,
            action_type: action.action_type,
            target_type: action.target_type,
            target_id: action.target_id,
            description: Some(action.description.clone()),
            created_at: now,
        })
    }

    /// List entries newest-first, returning the page and the total match count
    pub async fn list(
        &self,
        filter: &AuditFilter,
        page: PageRequest,
    ) -> AdminResult<(Vec<AuditLogEntry>, u64)> {
        let mut count_query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM admin_action_log WHERE 1 = 1");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query.build_query_scalar().fetch_one(&self.db).await?;

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, admin_id, action_type, target_type, target_id, description, created_at \
             FROM admin_action_log WHERE 1 = 1",
        );
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows = query.build().fetch_all(&self.db).await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(parse_entry(row)?);
        }

        Ok((entries, total.max(0) as u64))
    }
}

/// Append failures are logged, never returned to the caller.
#[async_trait]
impl ActionObserver for AuditLog {
    async fn action_completed(&self, action: &AdminAction) {
        if let Err(e) = self.append(action).await {
            tracing::warn!(
                error = %e,
                action = action.action_type.as_str(),
                target_type = action.target_type.as_str(),
                target_id = action.target_id,
                "failed to write audit log entry"
            );
        }
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &AuditFilter) {
    if let Some(action_type) = filter.action_type {
        query.push(" AND action_type = ").push_bind(action_type.as_str());
    }
    if let Some(admin_id) = filter.admin_id {
        query.push(" AND admin_id = ").push_bind(admin_id);
    }
    if let Some(target_type) = filter.target_type {
        query.push(" AND target_type = ").push_bind(target_type.as_str());
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search.trim());
        query
            .push(" AND (LOWER(COALESCE(description, '')) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(action_type) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR CAST(target_id AS TEXT) LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

fn parse_entry(row: sqlx::sqlite::SqliteRow) -> AdminResult<AuditLogEntry> {
    let action_str: String = row.get("action_type");
    let target_str: String = row.get("target_type");
    let created_at_str: String = row.get("created_at");

    Ok(AuditLogEntry {
        id: row.get("id"),
        admin_id: row.get("admin_id"),
        action_type: AdminActionType::from_str(&action_str)?,
        target_type: TargetType::from_str(&target_str)?,
        target_id: row.get("target_id"),
        description: row.get("description"),
        created_at: parse_timestamp(&created_at_str)?,
    })
}

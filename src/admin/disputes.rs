/// Payment Dispute Management
use super::{format_timestamp, like_pattern, parse_optional_timestamp, parse_timestamp};
use crate::error::{AdminError, AdminResult};
use crate::pagination::PageRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

/// Dispute status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisputeStatus {
    Open,
    Resolved,
    Rejected,
}

impl DisputeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeStatus::Open => "open",
            DisputeStatus::Resolved => "resolved",
            DisputeStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> AdminResult<Self> {
        match s.to_lowercase().as_str() {
            "open" => Ok(DisputeStatus::Open),
            "resolved" => Ok(DisputeStatus::Resolved),
            "rejected" => Ok(DisputeStatus::Rejected),
            _ => Err(AdminError::Validation(format!("Invalid dispute status: {}", s))),
        }
    }
}

/// Payment dispute record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDispute {
    pub id: i64,
    pub payment_id: i64,
    pub application_id: Option<i64>,
    pub raised_by: i64,
    pub client_id: Option<i64>,
    pub freelancer_id: Option<i64>,
    pub reason: String,
    pub description: Option<String>,
    pub status: DisputeStatus,
    pub resolution: Option<String>,
    pub resolved_by: Option<i64>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new dispute
#[derive(Debug, Clone)]
pub struct NewDispute {
    pub payment_id: i64,
    pub application_id: Option<i64>,
    pub raised_by: i64,
    pub client_id: Option<i64>,
    pub freelancer_id: Option<i64>,
    pub reason: String,
    pub description: Option<String>,
}

/// Dispute listing filters
#[derive(Debug, Clone, Default)]
pub struct DisputeFilter {
    pub status: Option<DisputeStatus>,
    /// Matches the client, the freelancer, or whoever raised the dispute
    pub user_id: Option<i64>,
    /// Matches reason, description, or payment id
    pub search: Option<String>,
}

/// Dispute manager
#[derive(Clone)]
pub struct DisputeManager {
    db: SqlitePool,
}

const SELECT_COLUMNS: &str = "SELECT id, payment_id, application_id, raised_by, client_id, \
     freelancer_id, reason, description, status, resolution, resolved_by, resolved_at, created_at \
     FROM payment_dispute";

impl DisputeManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Open a new dispute
    pub async fn create(&self, new: &NewDispute) -> AdminResult<PaymentDispute> {
        if new.reason.trim().is_empty() {
            return Err(AdminError::Validation("reason is required".to_string()));
        }

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO payment_dispute
            (payment_id, application_id, raised_by, client_id, freelancer_id, reason, description, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 'open', ?)
            "#,
        )
        .bind(new.payment_id)
        .bind(new.application_id)
        .bind(new.raised_by)
        .bind(new.client_id)
        .bind(new.freelancer_id)
        .bind(&new.reason)
        .bind(&new.description)
        .bind(format_timestamp(now))
        .execute(&self.db)
        .await?;

        Ok(PaymentDispute {
            id: result.last_insert_rowid(),
            payment_id: new.payment_id,
            application_id: new.application_id,
            raised_by: new.raised_by,
            client_id: new.client_id,
            freelancer_id: new.freelancer_id,
            reason: new.reason.clone(),
            description: new.description.clone(),
            status: DisputeStatus::Open,
            resolution: None,
            resolved_by: None,
            resolved_at: None,
            created_at: now,
        })
    }

    /// Get dispute by ID
    pub async fn find(&self, dispute_id: i64) -> AdminResult<Option<PaymentDispute>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(dispute_id)
            .fetch_optional(&self.db)
            .await?;

        row.map(parse_dispute).transpose()
    }

    /// Get dispute by ID, failing if it does not exist
    pub async fn get(&self, dispute_id: i64) -> AdminResult<PaymentDispute> {
        self.find(dispute_id)
            .await?
            .ok_or_else(|| AdminError::NotFound("Dispute not found".to_string()))
    }

    /// List disputes newest-first, returning the page and the total match count
    pub async fn list(
        &self,
        filter: &DisputeFilter,
        page: PageRequest,
    ) -> AdminResult<(Vec<PaymentDispute>, u64)> {
        let mut count_query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM payment_dispute WHERE 1 = 1");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query.build_query_scalar().fetch_one(&self.db).await?;

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_COLUMNS);
        query.push(" WHERE 1 = 1");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows = query.build().fetch_all(&self.db).await?;

        let mut disputes = Vec::with_capacity(rows.len());
        for row in rows {
            disputes.push(parse_dispute(row)?);
        }

        Ok((disputes, total.max(0) as u64))
    }

    /// Resolve an open dispute
    pub async fn resolve(
        &self,
        dispute_id: i64,
        resolution: &str,
        resolved_by: i64,
    ) -> AdminResult<PaymentDispute> {
        self.close(dispute_id, DisputeStatus::Resolved, resolution, "resolution", resolved_by)
            .await
    }

    /// Reject an open dispute
    pub async fn reject(
        &self,
        dispute_id: i64,
        reason: &str,
        rejected_by: i64,
    ) -> AdminResult<PaymentDispute> {
        self.close(dispute_id, DisputeStatus::Rejected, reason, "reason", rejected_by)
            .await
    }

    /// Move an open dispute to a terminal status.
    ///
    /// The update only matches rows still `open`, so of two concurrent
    /// transitions exactly one wins and the other gets a conflict.
    async fn close(
        &self,
        dispute_id: i64,
        status: DisputeStatus,
        note: &str,
        note_field: &str,
        closed_by: i64,
    ) -> AdminResult<PaymentDispute> {
        let current = self.get(dispute_id).await?;

        let note = note.trim();
        if note.is_empty() {
            return Err(AdminError::Validation(format!("{} field is required", note_field)));
        }

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE payment_dispute
            SET status = ?,
                resolution = ?,
                resolved_by = ?,
                resolved_at = ?
            WHERE id = ? AND status = 'open'
            "#,
        )
        .bind(status.as_str())
        .bind(note)
        .bind(closed_by)
        .bind(format_timestamp(now))
        .bind(dispute_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            let latest = self.find(dispute_id).await?.unwrap_or(current);
            return Err(AdminError::Conflict(format!(
                "Dispute {} is already {}",
                dispute_id,
                latest.status.as_str()
            )));
        }

        tracing::info!(dispute_id, status = status.as_str(), closed_by, "dispute closed");
        crate::metrics::record_dispute_transition(status.as_str());

        self.get(dispute_id).await
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &DisputeFilter) {
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(user_id) = filter.user_id {
        query
            .push(" AND (client_id = ")
            .push_bind(user_id)
            .push(" OR freelancer_id = ")
            .push_bind(user_id)
            .push(" OR raised_by = ")
            .push_bind(user_id)
            .push(")");
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search.trim());
        query
            .push(" AND (LOWER(reason) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(COALESCE(description, '')) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR CAST(payment_id AS TEXT) LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

fn parse_dispute(row: sqlx::sqlite::SqliteRow) -> AdminResult<PaymentDispute> {
    let status_str: String = row.get("status");
    let created_at_str: String = row.get("created_at");

    Ok(PaymentDispute {
        id: row.get("id"),
        payment_id: row.get("payment_id"),
        application_id: row.get("application_id"),
        raised_by: row.get("raised_by"),
        client_id: row.get("client_id"),
        freelancer_id: row.get("freelancer_id"),
        reason: row.get("reason"),
        description: row.get("description"),
        status: DisputeStatus::from_str(&status_str)?,
        resolution: row.get("resolution"),
        resolved_by: row.get("resolved_by"),
        resolved_at: parse_optional_timestamp(row.get("resolved_at"))?,
        created_at: parse_timestamp(&created_at_str)?,
    })
}

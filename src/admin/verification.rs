/// Manual User Verification
use super::{format_timestamp, parse_optional_timestamp, UserRole};
use crate::error::{AdminError, AdminResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

/// Verification record, one per user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserVerification {
    pub id: i64,
    pub user_id: i64,
    pub user_type: UserRole,
    pub is_verified: bool,
    pub verified_by: Option<i64>,
    pub remarks: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
}

/// Verification manager
#[derive(Clone)]
pub struct VerificationManager {
    db: SqlitePool,
}

impl VerificationManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Mark a user verified, replacing any earlier record for the same user
    pub async fn verify(
        &self,
        user_id: i64,
        user_type: UserRole,
        verified_by: i64,
        remarks: Option<&str>,
    ) -> AdminResult<UserVerification> {
        let now = format_timestamp(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO user_verification (user_id, user_type, is_verified, verified_by, remarks, verified_at)
            VALUES (?, ?, 1, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                user_type = excluded.user_type,
                is_verified = 1,
                verified_by = excluded.verified_by,
                remarks = excluded.remarks,
                verified_at = excluded.verified_at
            "#,
        )
        .bind(user_id)
        .bind(user_type.as_str())
        .bind(verified_by)
        .bind(remarks)
        .bind(&now)
        .execute(&self.db)
        .await?;

        tracing::info!(user_id, user_type = user_type.as_str(), verified_by, "user verified");

        self.get(user_id).await?.ok_or_else(|| {
            AdminError::Internal(format!("Verification for user {} vanished", user_id))
        })
    }

    /// Get the verification record for a user
    pub async fn get(&self, user_id: i64) -> AdminResult<Option<UserVerification>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, user_type, is_verified, verified_by, remarks, verified_at
            FROM user_verification
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => {
                let user_type: String = row.get("user_type");
                Ok(Some(UserVerification {
                    id: row.get("id"),
                    user_id: row.get("user_id"),
                    user_type: UserRole::from_str(&user_type)?,
                    is_verified: row.get::<i64, _>("is_verified") != 0,
                    verified_by: row.get("verified_by"),
                    remarks: row.get("remarks"),
                    verified_at: parse_optional_timestamp(row.get("verified_at"))?,
                }))
            }
            None => Ok(None),
        }
    }
}

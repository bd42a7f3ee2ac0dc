/// Admin Profiles
///
/// Marketplace users that hold the admin role, keyed by their user id.
use super::parse_timestamp;
use crate::error::AdminResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

/// Admin profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminProfile {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub email: String,
    pub is_super_admin: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Admin profile manager
#[derive(Clone)]
pub struct AdminProfileManager {
    db: SqlitePool,
}

impl AdminProfileManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Get profile for a user
    pub async fn get_profile(&self, user_id: i64) -> AdminResult<Option<AdminProfile>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, full_name, email, is_super_admin, is_active, created_at
            FROM admin_profile
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => {
                let created_at: String = row.get("created_at");
                Ok(Some(AdminProfile {
                    id: row.get("id"),
                    user_id: row.get("user_id"),
                    full_name: row.get("full_name"),
                    email: row.get("email"),
                    is_super_admin: row.get::<i64, _>("is_super_admin") != 0,
                    is_active: row.get::<i64, _>("is_active") != 0,
                    created_at: parse_timestamp(&created_at)?,
                }))
            }
            None => Ok(None),
        }
    }
}

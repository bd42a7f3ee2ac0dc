/// Admin and Moderation System
///
/// Handles the payment dispute workflow, manual user verification,
/// admin profiles, the audit trail, and the dispatcher that drives
/// moderation actions against upstream services.

pub mod audit;
pub mod disputes;
pub mod dispatcher;
pub mod profiles;
pub mod verification;

pub use audit::{AdminAction, AdminActionType, AuditFilter, AuditLog, AuditLogEntry, TargetType};
pub use dispatcher::{ActionObserver, AdminActionDispatcher, Upstreams, UserListing};
pub use disputes::{DisputeFilter, DisputeManager, DisputeStatus, NewDispute, PaymentDispute};
pub use profiles::{AdminProfile, AdminProfileManager};
pub use verification::{UserVerification, VerificationManager};

use crate::error::{AdminError, AdminResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marketplace user roles, each backed by its own upstream directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Client,
    Freelancer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Client => "client",
            UserRole::Freelancer => "freelancer",
        }
    }

    pub fn from_str(s: &str) -> AdminResult<Self> {
        match s.to_lowercase().as_str() {
            "client" => Ok(UserRole::Client),
            "freelancer" => Ok(UserRole::Freelancer),
            _ => Err(AdminError::Validation(
                "Invalid role. Must be 'client' or 'freelancer'".to_string(),
            )),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-width RFC 3339 so stored timestamps sort lexicographically
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str) -> AdminResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AdminError::Internal(format!("Invalid timestamp: {}", e)))
}

pub(crate) fn parse_optional_timestamp(value: Option<String>) -> AdminResult<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_timestamp).transpose()
}

/// `LIKE` pattern for a case-insensitive substring match
pub(crate) fn like_pattern(query: &str) -> String {
    let escaped = query
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Authentication extractors and utilities
use crate::{
    admin::AdminProfile,
    config::{is_hmac, AuthConfig},
    context::AppContext,
    error::{AdminError, AdminResult},
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde_json::Value;

/// Admin authentication context - requires an authorized admin principal
#[derive(Debug, Clone)]
pub struct AdminAuthContext {
    pub user_id: i64,
    /// Raw `Authorization` header value, forwarded to upstream services
    pub credential: String,
    pub profile: Option<AdminProfile>,
    pub is_super_admin: bool,
}

#[async_trait]
impl FromRequestParts<AppContext> for AdminAuthContext {
    type Rejection = AdminError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| AdminError::Authentication("Missing authorization header".to_string()))?;
        let credential = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let token_data = verify_jwt_token(&token, &state.config.authentication)?;
        let claims = &token_data.claims;
        let user_id = principal_id(claims)?;

        tracing::debug!("AdminAuthContext: Checking admin access for user {}", user_id);

        let is_configured_admin = state
            .config
            .authentication
            .admin_user_ids
            .contains(&user_id);

        match state.profiles.get_profile(user_id).await? {
            Some(profile) if !profile.is_active => {
                tracing::warn!("AdminAuthContext: Admin profile for user {} is inactive", user_id);
                Err(AdminError::Authorization("Admin profile is inactive".to_string()))
            }
            Some(profile) => Ok(AdminAuthContext {
                user_id,
                credential,
                is_super_admin: profile.is_super_admin,
                profile: Some(profile),
            }),
            None if is_configured_admin || claims_grant_admin(claims) => {
                tracing::debug!("AdminAuthContext: User {} is admin without a profile", user_id);
                Ok(AdminAuthContext {
                    user_id,
                    credential,
                    profile: None,
                    is_super_admin: is_configured_admin,
                })
            }
            None => {
                tracing::warn!("AdminAuthContext: User {} is not an admin", user_id);
                Err(AdminError::Authorization("Admin role required".to_string()))
            }
        }
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Verify a JWT token with full validation
///
/// This performs:
/// 1. JWT signature verification with the configured algorithm
/// 2. Expiration checking, allowing the configured leeway
pub fn verify_jwt_token(token: &str, config: &AuthConfig) -> AdminResult<TokenData<Value>> {
    let decoding_key = decoding_key(config)?;
    let mut validation = Validation::new(config.jwt_algorithm);
    validation.leeway = config.jwt_leeway_secs;

    decode::<Value>(token, &decoding_key, &validation).map_err(|e| {
        tracing::warn!("JWT verification failed: {}", e);
        AdminError::Authentication("Invalid or expired token".to_string())
    })
}

fn decoding_key(config: &AuthConfig) -> AdminResult<DecodingKey> {
    let key = config.jwt_signing_key.as_bytes();

    let decoding_key = match config.jwt_algorithm {
        algorithm if is_hmac(algorithm) => Ok(DecodingKey::from_secret(key)),
        Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(key),
        Algorithm::EdDSA => DecodingKey::from_ed_pem(key),
        _ => DecodingKey::from_rsa_pem(key),
    };

    decoding_key.map_err(|e| AdminError::Internal(format!("Invalid JWT verification key: {}", e)))
}

/// Principal id from `user_id`, falling back to `sub`
fn principal_id(claims: &Value) -> AdminResult<i64> {
    ["user_id", "sub"]
        .iter()
        .filter_map(|claim| claims.get(claim))
        .find_map(|value| match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .filter(|id| *id > 0)
        .ok_or_else(|| AdminError::Authentication("Token does not identify a user".to_string()))
}

fn claims_grant_admin(claims: &Value) -> bool {
    claims.get("is_admin").and_then(Value::as_bool) == Some(true)
        || claims.get("role").and_then(Value::as_str) == Some("admin")
}

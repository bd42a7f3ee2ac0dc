/// HTTP clients for the marketplace upstream services
use super::{
    NotificationMessage, NotificationService, ReviewService, UpstreamError, UpstreamReply,
    UpstreamResult, UserDirectory,
};
use crate::admin::UserRole;
use crate::config::UpstreamConfig;
use crate::error::{AdminError, AdminResult};
use crate::metrics;
use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, RequestBuilder};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, warn};

/// One reqwest client shared by all upstream services
#[derive(Clone)]
pub struct HttpUpstream {
    client: Client,
    config: UpstreamConfig,
}

impl HttpUpstream {
    pub fn new(config: UpstreamConfig) -> AdminResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AdminError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn user_base(&self, role: UserRole) -> (&'static str, String) {
        match role {
            UserRole::Client => (
                "client",
                format!("{}/api/clients", trim_base(&self.config.client_service_url)),
            ),
            UserRole::Freelancer => (
                "freelancer",
                format!("{}/api/freelancers", trim_base(&self.config.freelancer_service_url)),
            ),
        }
    }

    async fn execute(
        &self,
        service: &'static str,
        operation: &'static str,
        request: RequestBuilder,
        credential: &str,
    ) -> UpstreamResult {
        let request = if credential.is_empty() {
            request
        } else {
            request.header(AUTHORIZATION, credential)
        };

        let start = Instant::now();
        let result = request.send().await;
        let elapsed = start.elapsed().as_secs_f64();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                let outcome = if e.is_timeout() { "timeout" } else { "unreachable" };
                metrics::record_upstream_call(service, operation, outcome, elapsed);
                warn!(service, operation, error = %e, "upstream request failed");

                return Err(if e.is_timeout() {
                    UpstreamError::Timeout { service }
                } else {
                    UpstreamError::Unreachable {
                        service,
                        reason: e.to_string(),
                    }
                });
            }
        };

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            metrics::record_upstream_call(service, operation, "unreachable", elapsed);
            if e.is_timeout() {
                UpstreamError::Timeout { service }
            } else {
                UpstreamError::Unreachable {
                    service,
                    reason: e.to_string(),
                }
            }
        })?;

        let outcome = if status.is_success() { "success" } else { "rejected" };
        metrics::record_upstream_call(service, operation, outcome, elapsed);
        debug!(service, operation, status = status.as_u16(), "upstream responded");

        Ok(UpstreamReply::new(status, parse_body(&bytes)))
    }
}

#[async_trait]
impl UserDirectory for HttpUpstream {
    async fn list_users(&self, role: UserRole, credential: &str) -> UpstreamResult {
        let (service, base) = self.user_base(role);
        let request = self.client.get(format!("{}/", base));
        self.execute(service, "list", request, credential).await
    }

    async fn set_blocked(
        &self,
        role: UserRole,
        user_id: i64,
        blocked: bool,
        credential: &str,
    ) -> UpstreamResult {
        let (service, base) = self.user_base(role);
        let operation = if blocked { "block" } else { "unblock" };
        let request = self.client.patch(format!("{}/{}/{}/", base, user_id, operation));
        self.execute(service, operation, request, credential).await
    }
}

#[async_trait]
impl ReviewService for HttpUpstream {
    async fn delete_review(&self, review_id: i64, credential: &str) -> UpstreamResult {
        let url = format!(
            "{}/api/reviews/delete/{}",
            trim_base(&self.config.review_service_url),
            review_id
        );
        self.execute("review", "delete", self.client.delete(url), credential)
            .await
    }
}

#[async_trait]
impl NotificationService for HttpUpstream {
    async fn send(&self, notification: &NotificationMessage, credential: &str) -> UpstreamResult {
        let url = format!(
            "{}/api/notifications/send/",
            trim_base(&self.config.notification_service_url)
        );
        let request = self.client.post(url).json(notification);
        self.execute("notification", "send", request, credential).await
    }

    async fn list(&self, credential: &str) -> UpstreamResult {
        let url = format!(
            "{}/api/notifications/view",
            trim_base(&self.config.notification_service_url)
        );
        self.execute("notification", "list", self.client.get(url), credential)
            .await
    }
}

fn trim_base(url: &str) -> &str {
    url.trim_end_matches('/')
}

/// Upstream bodies are usually JSON; anything else is kept as text
fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, timeout_secs: u64) -> UpstreamConfig {
        UpstreamConfig {
            client_service_url: server.uri(),
            freelancer_service_url: format!("{}/", server.uri()),
            review_service_url: server.uri(),
            notification_service_url: server.uri(),
            request_timeout_secs: timeout_secs,
        }
    }

    #[tokio::test]
    async fn test_list_users_forwards_credential() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clients/"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "Ann"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let upstream = HttpUpstream::new(config_for(&server, 5)).unwrap();
        let reply = upstream
            .list_users(UserRole::Client, "Bearer abc")
            .await
            .unwrap();

        assert!(reply.is_success());
        assert_eq!(reply.body, json!([{"id": 1, "name": "Ann"}]));
    }

    #[tokio::test]
    async fn test_block_and_unblock_paths() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/freelancers/7/block/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "blocked"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/clients/8/unblock/"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let upstream = HttpUpstream::new(config_for(&server, 5)).unwrap();

        let blocked = upstream
            .set_blocked(UserRole::Freelancer, 7, true, "Bearer abc")
            .await
            .unwrap();
        assert!(blocked.is_success());

        let missing = upstream
            .set_blocked(UserRole::Client, 8, false, "Bearer abc")
            .await
            .unwrap();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.body, Value::Null);
    }

    #[tokio::test]
    async fn test_delete_review() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/reviews/delete/12"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let upstream = HttpUpstream::new(config_for(&server, 5)).unwrap();
        let reply = upstream.delete_review(12, "Bearer abc").await.unwrap();
        assert_eq!(reply.status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_send_notification_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/notifications/send/"))
            .and(body_json(json!({"user_id": 3, "type": "warning", "message": "Be nice"})))
            .respond_with(ResponseTemplate::new(201).set_body_string("queued"))
            .expect(1)
            .mount(&server)
            .await;

        let upstream = HttpUpstream::new(config_for(&server, 5)).unwrap();
        let notification = NotificationMessage {
            user_id: 3,
            notification_type: "warning".to_string(),
            message: "Be nice".to_string(),
        };
        let reply = NotificationService::send(&upstream, &notification, "Bearer abc")
            .await
            .unwrap();

        assert_eq!(reply.status, StatusCode::CREATED);
        assert_eq!(reply.body, Value::String("queued".to_string()));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notifications/view"))
            .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(3)))
            .mount(&server)
            .await;

        let upstream = HttpUpstream::new(config_for(&server, 1)).unwrap();
        let err = NotificationService::list(&upstream, "Bearer abc")
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_unreachable() {
        let config = UpstreamConfig {
            client_service_url: "http://127.0.0.1:9".to_string(),
            ..UpstreamConfig::default()
        };
        let upstream = HttpUpstream::new(config).unwrap();
        let err = upstream
            .list_users(UserRole::Client, "Bearer abc")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UpstreamError::Unreachable { .. } | UpstreamError::Timeout { .. }
        ));
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(b""), Value::Null);
        assert_eq!(parse_body(b"[1,2]"), json!([1, 2]));
        assert_eq!(parse_body(b"oops"), Value::String("oops".to_string()));
    }
}

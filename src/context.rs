/// Application context and dependency injection
use crate::{
    admin::{
        AdminActionDispatcher, AdminProfileManager, AuditLog, DisputeManager, Upstreams,
        VerificationManager,
    },
    config::ServerConfig,
    db,
    error::AdminResult,
    upstream::HttpUpstream,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub profiles: Arc<AdminProfileManager>,
    pub audit_log: Arc<AuditLog>,
    pub disputes: Arc<DisputeManager>,
    pub dispatcher: Arc<AdminActionDispatcher>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> AdminResult<Self> {
        // Validate configuration
        config.validate()?;

        // Initialize database
        let db = db::create_pool(&config.storage.database_path, db::DatabaseOptions::default())
            .await?;

        // Run migrations
        db::run_migrations(&db).await?;

        // Test connection
        db::test_connection(&db).await?;

        // One HTTP client serves every upstream
        let http = Arc::new(HttpUpstream::new(config.upstream.clone())?);
        let upstreams = Upstreams {
            users: http.clone(),
            reviews: http.clone(),
            notifications: http,
        };

        tracing::info!(
            client = %config.upstream.client_service_url,
            freelancer = %config.upstream.freelancer_service_url,
            review = %config.upstream.review_service_url,
            notification = %config.upstream.notification_service_url,
            "upstream services configured"
        );

        Ok(Self::with_upstreams(config, db, upstreams))
    }

    /// Assemble the context around an existing pool and upstream clients
    pub fn with_upstreams(config: ServerConfig, db: SqlitePool, upstreams: Upstreams) -> Self {
        let profiles = Arc::new(AdminProfileManager::new(db.clone()));
        let audit_log = Arc::new(AuditLog::new(db.clone()));
        let disputes = Arc::new(DisputeManager::new(db.clone()));

        let dispatcher = Arc::new(
            AdminActionDispatcher::new(
                upstreams,
                (*disputes).clone(),
                VerificationManager::new(db.clone()),
            )
            .with_observer(audit_log.clone()),
        );

        Self {
            config: Arc::new(config),
            db,
            profiles,
            audit_log,
            disputes,
            dispatcher,
        }
    }
}

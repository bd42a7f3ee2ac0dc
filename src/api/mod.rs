/// API routes and handlers
pub mod disputes;
pub mod extract;
pub mod health;
pub mod logs;
pub mod moderation;
pub mod users;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(users::routes())
        .merge(disputes::routes())
        .merge(moderation::routes())
        .merge(logs::routes())
}

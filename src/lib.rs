//! Marketplace Admin Service
//!
//! Administrative backend for a multi-service freelance marketplace:
//! payment disputes, manual user verification, an append-only audit log,
//! and moderation actions proxied to the client, freelancer, review and
//! notification services.

pub mod admin;
pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod metrics;
pub mod pagination;
pub mod server;
pub mod upstream;

pub use config::ServerConfig;
pub use context::AppContext;
pub use error::{AdminError, AdminResult};

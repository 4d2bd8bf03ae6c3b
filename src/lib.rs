//! AssetDesk server
//!
//! Tracks physical assets through check-out, check-in and repair, with
//! role-gated mutations and bulk imports that can be enriched by an
//! external text-completion service.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

pub mod api;
pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    /// Cancelled on shutdown; long-running imports stop at the next batch
    pub shutdown: CancellationToken,
}

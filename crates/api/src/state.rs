use std::sync::Arc;

use hof_core::merge_lock::MergeLocks;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool is reference-counted and everything else is
/// behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: hof_db::DbPool,
    /// Server and engine configuration.
    pub config: Arc<ServerConfig>,
    /// Screenshot ids claimed by in-flight merges.
    pub merge_locks: Arc<MergeLocks>,
}

impl AppState {
    pub fn new(pool: hof_db::DbPool, config: ServerConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            merge_locks: Arc::new(MergeLocks::new()),
        }
    }
}

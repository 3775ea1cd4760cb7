//! Application state management

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::{config::Config, repository::UserRepository};

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    config: Arc<Config>,
    pool: SqlitePool,
    users: UserRepository,
}

impl AppState {
    /// Build state from a loaded configuration and a migrated pool
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        Self {
            config: Arc::new(config),
            users: UserRepository::new(pool.clone()),
            pool,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the user repository
    pub fn users(&self) -> &UserRepository {
        &self.users
    }
}

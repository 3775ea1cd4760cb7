//! # user-directory
//!
//! HTTP service for user records. Each user carries a set of named locations
//! shared with other users, and the listing reports how many published ads
//! each user authored.
//!
//! ## Endpoints
//!
//! | Method | Path | Success |
//! |--------|------|---------|
//! | GET | `/api/v1/users` | 200, array with `total_ads` |
//! | POST | `/api/v1/users` | 201 with `Location` |
//! | GET | `/api/v1/users/{id}` | 200 |
//! | PATCH | `/api/v1/users/{id}` | 200 |
//! | DELETE | `/api/v1/users/{id}` | 204 |
//! | GET | `/health`, `/ready` | 200 (or 503 from `/ready`) |
//!
//! ## Example
//!
//! ```rust,no_run
//! use user_directory::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config);
//!
//!     let pool = database::connect(&config.database).await?;
//!     let app = router(AppState::new(config.clone(), pool));
//!
//!     Server::new(config).serve(app).await
//! }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod health;
pub mod ids;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repository;
pub mod responses;
pub mod server;
pub mod state;

/// Commonly used items
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::database;
    pub use crate::error::{Error, Result};
    pub use crate::models::{NewUser, Role, User, UserListing, UserPage, UserPatch};
    pub use crate::observability::init_tracing;
    pub use crate::repository::{Pagination, Repository, UserRepository};
    pub use crate::server::{router, Server};
    pub use crate::state::AppState;
}

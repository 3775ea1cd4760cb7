//! Data access for users and locations
//!
//! - [`Repository`]: generic CRUD contract
//! - [`UserRepository`]: SQLite implementation for users, including the
//!   location associations and the published-ad listing
//! - [`RepositoryError`]: structured errors carrying the failed operation
//! - [`Pagination`]: offset/limit window for listings
//!
//! # Example
//!
//! ```rust,ignore
//! use user_directory::repository::{Pagination, Repository, UserRepository};
//!
//! let users = UserRepository::new(pool);
//! let user = users.find_by_id(7).await?;
//! let first_page = users.list_with_ad_totals(Some(Pagination::page(1, 4))).await?;
//! ```

mod error;
mod locations;
mod pagination;
mod traits;
mod users;

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use pagination::Pagination;
pub use traits::{Repository, RepositoryResult};
pub use users::UserRepository;

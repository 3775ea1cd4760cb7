//! HTTP handlers for the user resource
//!
//! Handlers stay thin: extract, validate, call the [`UserRepository`], and
//! shape the response. Rejections from the extractors in [`extract`] and all
//! handler errors render as the JSON body described in [`crate::error`].
//!
//! [`UserRepository`]: crate::repository::UserRepository

pub mod extract;
mod query;
mod users;

pub use query::ListQuery;
pub use users::{create_user, delete_user, get_user, list_users, update_user, user_location};

//! User and location records and the request payloads that change them

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Database identifier of a user
pub type UserId = i64;

/// Database identifier of a location
pub type LocationId = i64;

/// Role of a user on the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Moderator,
    Admin,
}

impl Role {
    /// Stored and serialized form
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user together with the names of its locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: String,
    pub role: Role,
    pub age: Option<i32>,
    pub locations: Vec<String>,
}

/// A user as returned by the listing, annotated with its published ad count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserListing {
    #[serde(flatten)]
    pub user: User,
    pub total_ads: i64,
}

/// One window of the listing plus the size of the whole collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPage {
    pub users: Vec<UserListing>,
    pub total: u64,
}

/// A shared, named place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
}

/// Row of the `users` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: UserId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: String,
    pub role: Role,
    pub age: Option<i32>,
}

impl UserRow {
    pub(crate) fn with_locations(self, locations: Vec<String>) -> User {
        User {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            username: self.username,
            role: self.role,
            age: self.age,
            locations,
        }
    }
}

/// Row of the listing query: user columns plus the published ad count
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct UserListingRow {
    #[sqlx(flatten)]
    pub user: UserRow,
    pub total_ads: i64,
}

/// Body of a create request
///
/// Every field is optional on the wire; `validate` decides what is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub role: Option<Role>,
    pub age: Option<i32>,
    pub locations: Option<Vec<String>>,
}

impl NewUser {
    /// Validate the create request
    pub fn validate(&self) -> Result<(), String> {
        match self.username.as_deref() {
            None => return Err("username is required".to_string()),
            Some(name) if name.trim().is_empty() => {
                return Err("username cannot be empty".to_string())
            }
            Some(_) => {}
        }
        validate_age(self.age)?;
        validate_locations(self.locations.as_deref())
    }
}

/// Body of a partial update
///
/// A field that is absent from the body is left untouched. For the nullable
/// columns the outer `Option` records presence and the inner one the value,
/// so `{"age": null}` clears the age while `{}` keeps it. `username` and
/// `role` are tracked the same way so that an explicit `null` is rejected
/// instead of being mistaken for absence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserPatch {
    #[serde(default, deserialize_with = "present")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub username: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub role: Option<Option<Role>>,
    #[serde(default, deserialize_with = "present")]
    pub age: Option<Option<i32>>,
    pub locations: Option<Vec<String>>,
}

impl UserPatch {
    /// True when the patch changes no column of the `users` row
    pub fn touches_no_columns(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.username.is_none()
            && self.role.is_none()
            && self.age.is_none()
    }

    /// Validate the fields that are present
    pub fn validate(&self) -> Result<(), String> {
        match &self.username {
            Some(None) => return Err("username cannot be null".to_string()),
            Some(Some(name)) if name.trim().is_empty() => {
                return Err("username cannot be empty".to_string())
            }
            _ => {}
        }
        if self.role == Some(None) {
            return Err("role cannot be null".to_string());
        }
        validate_age(self.age.flatten())?;
        validate_locations(self.locations.as_deref())
    }
}

fn validate_age(age: Option<i32>) -> Result<(), String> {
    match age {
        Some(age) if age < 0 => Err("age cannot be negative".to_string()),
        _ => Ok(()),
    }
}

fn validate_locations(locations: Option<&[String]>) -> Result<(), String> {
    if locations.unwrap_or_default().iter().any(|name| name.trim().is_empty()) {
        return Err("location names cannot be empty".to_string());
    }
    Ok(())
}

/// Marks a field as present even when its value is `null`
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

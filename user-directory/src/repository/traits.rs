//! Repository trait definitions
//!
//! Async methods use RPITIT (Return Position Impl Trait In Traits), so no
//! `async_trait` boxing is involved.

use std::future::Future;

use super::error::RepositoryError;

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Base repository trait for CRUD operations
///
/// # Type Parameters
///
/// - `Id`: The identifier type for the entity
/// - `Entity`: The full entity type returned from queries
/// - `Create`: The payload for creating new entities
/// - `Update`: The payload for updating existing entities
pub trait Repository<Id, Entity, Create, Update>: Send + Sync {
    /// Find an entity by its unique identifier
    ///
    /// Returns `Ok(None)` if no entity has this identifier.
    fn find_by_id(&self, id: Id) -> impl Future<Output = RepositoryResult<Option<Entity>>> + Send;

    /// Count all entities
    fn count(&self) -> impl Future<Output = RepositoryResult<u64>> + Send;

    /// Check if an entity exists by its identifier
    fn exists(&self, id: Id) -> impl Future<Output = RepositoryResult<bool>> + Send;

    /// Create a new entity, returning it with its generated fields
    fn create(&self, data: Create) -> impl Future<Output = RepositoryResult<Entity>> + Send;

    /// Update an existing entity
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` repository error if the entity doesn't exist.
    fn update(&self, id: Id, data: Update) -> impl Future<Output = RepositoryResult<Entity>> + Send;

    /// Delete an entity by its identifier
    ///
    /// Returns `true` if the entity was deleted, `false` if it didn't exist.
    fn delete(&self, id: Id) -> impl Future<Output = RepositoryResult<bool>> + Send;
}

//! SQL-backed user repository

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use super::error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
use super::locations;
use super::pagination::Pagination;
use super::traits::{Repository, RepositoryResult};
use crate::models::{
    NewUser, User, UserId, UserListing, UserListingRow, UserPage, UserPatch, UserRow,
};

/// Users and their location associations, stored in SQLite
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a repository over an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List users ordered by id, each annotated with its published ad count
    ///
    /// `None` returns the whole collection. The page and the collection total
    /// are read in one transaction, so they describe the same snapshot.
    pub async fn list_with_ad_totals(
        &self,
        pagination: Option<Pagination>,
    ) -> RepositoryResult<UserPage> {
        let op = RepositoryOperation::FindAll;
        let mut tx = self.pool.begin().await.map_err(RepositoryError::during(op))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await
            .map_err(RepositoryError::during(op))?;

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT u.id, u.first_name, u.last_name, u.username, u.role, u.age, \
             (SELECT COUNT(*) FROM ads a WHERE a.author_id = u.id AND a.is_published) AS total_ads \
             FROM users u ORDER BY u.id",
        );
        if let Some(pagination) = pagination {
            let (offset, limit) = pagination.as_sql();
            query.push(" LIMIT ").push_bind(limit);
            query.push(" OFFSET ").push_bind(offset);
        }

        let rows: Vec<UserListingRow> = query
            .build_query_as()
            .fetch_all(&mut *tx)
            .await
            .map_err(RepositoryError::during(op))?;

        let mut names = locations::names_for_window(&mut tx, pagination).await?;
        tx.commit().await.map_err(RepositoryError::during(op))?;

        let users = rows
            .into_iter()
            .map(|row| {
                let locations = names.remove(&row.user.id).unwrap_or_default();
                UserListing {
                    user: row.user.with_locations(locations),
                    total_ads: row.total_ads,
                }
            })
            .collect();

        Ok(UserPage {
            users,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }
}

async fn fetch_row(conn: &mut SqliteConnection, id: UserId) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        "SELECT id, first_name, last_name, username, role, age FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}

async fn fetch_user(
    conn: &mut SqliteConnection,
    id: UserId,
    operation: RepositoryOperation,
) -> RepositoryResult<Option<User>> {
    let Some(row) = fetch_row(conn, id)
        .await
        .map_err(RepositoryError::during(operation))?
    else {
        return Ok(None);
    };
    let names = locations::names_for_user(conn, id).await?;
    Ok(Some(row.with_locations(names)))
}

fn not_found(id: UserId, operation: RepositoryOperation) -> RepositoryError {
    RepositoryError::not_found("User", id.to_string()).with_operation(operation)
}

/// Attach the username to duplicate-key failures so the caller can report it
fn tag_duplicate(err: RepositoryError, username: &str) -> RepositoryError {
    if err.kind == RepositoryErrorKind::AlreadyExists {
        err.with_entity("User", username)
    } else {
        err
    }
}

impl Repository<UserId, User, NewUser, UserPatch> for UserRepository {
    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(RepositoryError::during(RepositoryOperation::FindById))?;
        fetch_user(&mut conn, id, RepositoryOperation::FindById).await
    }

    async fn count(&self) -> RepositoryResult<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(RepositoryError::during(RepositoryOperation::Count))?;
        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn exists(&self, id: UserId) -> RepositoryResult<bool> {
        let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(RepositoryError::during(RepositoryOperation::Exists))?;
        Ok(found > 0)
    }

    async fn create(&self, data: NewUser) -> RepositoryResult<User> {
        let op = RepositoryOperation::Create;
        let username = data
            .username
            .ok_or_else(|| RepositoryError::validation_failed("username is required"))?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::during(op))?;

        let id = sqlx::query(
            "INSERT INTO users (first_name, last_name, username, role, age) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&username)
        .bind(data.role.unwrap_or_default())
        .bind(data.age)
        .execute(&mut *tx)
        .await
        .map_err(|e| tag_duplicate(RepositoryError::during(op)(e), &username))?
        .last_insert_rowid();

        if let Some(names) = &data.locations {
            locations::attach(&mut tx, id, names, op).await?;
        }

        let user = fetch_user(&mut tx, id, op)
            .await?
            .ok_or_else(|| not_found(id, op))?;
        tx.commit().await.map_err(RepositoryError::during(op))?;

        tracing::debug!(user_id = id, "user row inserted");
        Ok(user)
    }

    async fn update(&self, id: UserId, data: UserPatch) -> RepositoryResult<User> {
        let op = RepositoryOperation::Update;
        data.validate()
            .map_err(|msg| RepositoryError::validation_failed(msg).with_operation(op))?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::during(op))?;

        let current = fetch_row(&mut tx, id)
            .await
            .map_err(RepositoryError::during(op))?
            .ok_or_else(|| not_found(id, op))?;

        if !data.touches_no_columns() {
            let username = data.username.flatten().unwrap_or(current.username);
            sqlx::query(
                "UPDATE users SET first_name = ?, last_name = ?, username = ?, role = ?, age = ? \
                 WHERE id = ?",
            )
            .bind(data.first_name.unwrap_or(current.first_name))
            .bind(data.last_name.unwrap_or(current.last_name))
            .bind(&username)
            .bind(data.role.flatten().unwrap_or(current.role))
            .bind(data.age.unwrap_or(current.age))
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| tag_duplicate(RepositoryError::during(op)(e), &username))?;
        }

        if let Some(names) = &data.locations {
            locations::detach_all(&mut tx, id, op).await?;
            locations::attach(&mut tx, id, names, op).await?;
        }

        let user = fetch_user(&mut tx, id, op)
            .await?
            .ok_or_else(|| not_found(id, op))?;
        tx.commit().await.map_err(RepositoryError::during(op))?;
        Ok(user)
    }

    async fn delete(&self, id: UserId) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::during(RepositoryOperation::Delete))?;
        Ok(result.rows_affected() > 0)
    }
}

//! Location lookups and the user/location join table
//!
//! These functions take a connection rather than the pool so that the user
//! repository can run them inside its own transaction.

use std::collections::{HashMap, HashSet};

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::error::{RepositoryError, RepositoryOperation};
use super::pagination::Pagination;
use super::traits::RepositoryResult;
use crate::models::{Location, UserId};

/// Find the location with this name, inserting it first if it is missing
///
/// Idempotent: the unique index on `locations.name` turns a second insert of
/// the same name into a no-op.
pub(crate) async fn get_or_create(
    conn: &mut SqliteConnection,
    name: &str,
) -> RepositoryResult<Location> {
    sqlx::query("INSERT INTO locations (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
        .bind(name)
        .execute(&mut *conn)
        .await
        .map_err(RepositoryError::during(RepositoryOperation::GetOrCreate))?;

    sqlx::query_as::<_, Location>("SELECT id, name FROM locations WHERE name = ?")
        .bind(name)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            RepositoryError::during(RepositoryOperation::GetOrCreate)(e).with_entity("Location", name)
        })
}

/// Associate the named locations with a user
///
/// Repeated names in `names` and associations that already exist are ignored.
pub(crate) async fn attach(
    conn: &mut SqliteConnection,
    user_id: UserId,
    names: &[String],
    operation: RepositoryOperation,
) -> RepositoryResult<()> {
    let mut seen = HashSet::new();
    for name in names.iter().filter(|name| seen.insert(name.as_str())) {
        let location = get_or_create(conn, name).await?;
        sqlx::query(
            "INSERT INTO user_locations (user_id, location_id) VALUES (?, ?) \
             ON CONFLICT (user_id, location_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(location.id)
        .execute(&mut *conn)
        .await
        .map_err(RepositoryError::during(operation))?;
    }
    Ok(())
}

/// Remove every location association of a user, keeping the locations
pub(crate) async fn detach_all(
    conn: &mut SqliteConnection,
    user_id: UserId,
    operation: RepositoryOperation,
) -> RepositoryResult<()> {
    sqlx::query("DELETE FROM user_locations WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *conn)
        .await
        .map_err(RepositoryError::during(operation))?;
    Ok(())
}

/// Location names of one user, sorted by name
pub(crate) async fn names_for_user(
    conn: &mut SqliteConnection,
    user_id: UserId,
) -> RepositoryResult<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        "SELECT l.name FROM user_locations ul \
         JOIN locations l ON l.id = ul.location_id \
         WHERE ul.user_id = ? ORDER BY l.name",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(RepositoryError::during(RepositoryOperation::BatchLoad))
}

/// Location names for every user in a listing window, in one query
///
/// The window is applied to `users` ordered by id, matching the listing
/// query, so the bound parameters never grow with the number of users.
/// Users without locations are absent from the returned map.
pub(crate) async fn names_for_window(
    conn: &mut SqliteConnection,
    pagination: Option<Pagination>,
) -> RepositoryResult<HashMap<UserId, Vec<String>>> {
    let mut query = QueryBuilder::<Sqlite>::new(
        "SELECT ul.user_id, l.name FROM user_locations ul \
         JOIN locations l ON l.id = ul.location_id",
    );
    if let Some(pagination) = pagination {
        let (offset, limit) = pagination.as_sql();
        query
            .push(" WHERE ul.user_id IN (SELECT id FROM users ORDER BY id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset)
            .push(")");
    }
    query.push(" ORDER BY l.name");

    let rows: Vec<(UserId, String)> = query
        .build_query_as()
        .fetch_all(&mut *conn)
        .await
        .map_err(RepositoryError::during(RepositoryOperation::BatchLoad))?;

    let mut names: HashMap<UserId, Vec<String>> = HashMap::new();
    for (user_id, name) in rows {
        names.entry(user_id).or_default().push(name);
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::memory_pool;
    use crate::repository::RepositoryErrorKind;

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let first = get_or_create(&mut conn, "Berlin").await.unwrap();
        let second = get_or_create(&mut conn, "Berlin").await.unwrap();
        assert_eq!(first, second);

        let other = get_or_create(&mut conn, "Paris").await.unwrap();
        assert_ne!(first.id, other.id);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_names_for_window_groups_by_user() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        for (id, name) in [(1_i64, "a"), (2, "b"), (3, "c")] {
            sqlx::query("INSERT INTO users (id, username) VALUES (?, ?)")
                .bind(id)
                .bind(name)
                .execute(&mut *conn)
                .await
                .unwrap();
        }
        let op = RepositoryOperation::Create;
        attach(&mut conn, 1, &["Rome".into(), "Oslo".into(), "Rome".into()], op)
            .await
            .unwrap();
        attach(&mut conn, 2, &["Oslo".into()], op).await.unwrap();

        let names = names_for_window(&mut conn, None).await.unwrap();
        assert_eq!(names[&1], vec!["Oslo".to_string(), "Rome".to_string()]);
        assert_eq!(names[&2], vec!["Oslo".to_string()]);
        assert!(!names.contains_key(&3));

        let second = names_for_window(&mut conn, Some(Pagination::page(2, 1)))
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[&2], vec!["Oslo".to_string()]);

        detach_all(&mut conn, 1, RepositoryOperation::Update).await.unwrap();
        assert!(names_for_user(&mut conn, 1).await.unwrap().is_empty());
        assert_eq!(names_for_user(&mut conn, 2).await.unwrap(), vec!["Oslo"]);
    }

    #[tokio::test]
    async fn test_attach_failure_reports_callers_operation() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        // No user 99: the join row violates its foreign key
        let err = attach(&mut conn, 99, &["Riga".into()], RepositoryOperation::Create)
            .await
            .unwrap_err();
        assert_eq!(err.operation, RepositoryOperation::Create);
        assert_eq!(err.kind, RepositoryErrorKind::ConstraintViolation);
    }

    #[tokio::test]
    async fn test_names_for_empty_table() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        assert!(names_for_window(&mut conn, None).await.unwrap().is_empty());
    }
}

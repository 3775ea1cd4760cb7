//! User endpoints under `/api/v1/users`

use axum::{extract::State, Json};

use super::extract::{JsonBody, PathParam, QueryParams};
use super::query::ListQuery;
use crate::{
    error::{Error, Result},
    models::{NewUser, User, UserId, UserListing, UserPatch},
    repository::{Repository, RepositoryError, RepositoryOperation},
    responses::{Counted, Created, NoContent},
    state::AppState,
};

/// Path of a single user resource
pub fn user_location(id: UserId) -> String {
    format!("/api/v1/users/{}", id)
}

fn user_not_found(id: UserId, operation: RepositoryOperation) -> Error {
    RepositoryError::not_found("User", id.to_string())
        .with_operation(operation)
        .into()
}

/// `GET /api/v1/users`
pub async fn list_users(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Counted<UserListing>> {
    let window = query.window(&state.config().pagination)?;

    let page = state.users().list_with_ad_totals(window).await?;

    tracing::info!(
        returned = page.users.len(),
        total = page.total,
        page = query.page,
        "Listed users"
    );
    Ok(Counted::new(page.users, page.total))
}

/// `GET /api/v1/users/{id}`
pub async fn get_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<UserId>,
) -> Result<Json<User>> {
    let user = state
        .users()
        .find_by_id(id)
        .await?
        .ok_or_else(|| user_not_found(id, RepositoryOperation::FindById))?;

    tracing::info!(user_id = id, "Fetched user");
    Ok(Json(user))
}

/// `POST /api/v1/users`
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewUser>,
) -> Result<Created<User>> {
    body.validate().map_err(Error::Validation)?;

    let user = state.users().create(body).await?;
    let location = user_location(user.id);

    tracing::info!(user_id = user.id, username = %user.username, "Created user");
    Ok(Created::new(user).with_location(location))
}

/// `PATCH /api/v1/users/{id}`
pub async fn update_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<UserId>,
    JsonBody(patch): JsonBody<UserPatch>,
) -> Result<Json<User>> {
    patch.validate().map_err(Error::Validation)?;

    let replaces_locations = patch.locations.is_some();
    let user = state.users().update(id, patch).await?;

    tracing::info!(user_id = id, replaces_locations, "Updated user");
    Ok(Json(user))
}

/// `DELETE /api/v1/users/{id}`
pub async fn delete_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<UserId>,
) -> Result<NoContent> {
    if !state.users().delete(id).await? {
        return Err(user_not_found(id, RepositoryOperation::Delete));
    }

    tracing::info!(user_id = id, "Deleted user");
    Ok(NoContent)
}

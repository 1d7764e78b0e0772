use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use tracing::info;

use farmpilot_db::models::{UserLinkRow, UserRow};
use farmpilot_types::api::{LinkRequest, LinkResponse, NameResponse, UserResponse};

use crate::auth::AppState;
use crate::error::{self, ApiError, blocking};
use crate::middleware::CurrentUser;
use crate::storage::AVATARS;
use crate::uploads::{read_upload, serve_image};

pub(crate) fn to_user_response(user: UserRow) -> UserResponse {
    UserResponse {
        id: user.id,
        email: user.email,
        name: user.name,
        avatar: user.avatar,
    }
}

fn to_link_response(link: UserLinkRow) -> LinkResponse {
    LinkResponse {
        id: link.id,
        user_id: link.user_id,
        url: link.url,
    }
}

pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse {
        id: user.id,
        email: user.email,
        name: user.name,
        avatar: user.avatar,
    })
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: Option<String>,
}

pub async fn update_name(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<NameQuery>,
) -> Result<Json<UserResponse>, ApiError> {
    let name = query
        .name
        .filter(|n| !n.is_empty())
        .ok_or(ApiError::BadRequest("이름을 제공해야 합니다."))?;

    let db = state.clone();
    let updated = blocking(move || db.db.update_user_name(user.id, &name))
        .await?
        .ok_or(ApiError::NotFound(error::USER_NOT_FOUND))?;

    Ok(Json(to_user_response(updated)))
}

pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<Json<UserResponse>, ApiError> {
    let (original_name, data) = read_upload(multipart, "avatar").await?;
    let filename = state.storage.save(AVATARS, &original_name, &data).await?;

    // Avatars are replaced, not leaked: drop the previous file.
    if let Some(old) = &user.avatar {
        state.storage.remove(AVATARS, old).await;
    }

    let db = state.clone();
    let user_id = user.id;
    let stored = filename.clone();
    let updated = blocking(move || db.db.update_user_avatar(user_id, &stored))
        .await?
        .ok_or(ApiError::NotFound(error::USER_NOT_FOUND))?;

    info!("User {} updated avatar to {}", updated.id, filename);
    Ok(Json(to_user_response(updated)))
}

pub async fn my_avatar(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, ApiError> {
    serve_image(
        &state.storage,
        AVATARS,
        user.avatar.as_deref(),
        error::AVATAR_NOT_SET,
        error::AVATAR_NOT_FOUND,
    )
    .await
}

pub async fn avatar_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let db = state.clone();
    let user = blocking(move || db.db.get_user_by_id(id))
        .await?
        .ok_or(ApiError::NotFound(error::USER_NOT_FOUND))?;

    serve_image(
        &state.storage,
        AVATARS,
        user.avatar.as_deref(),
        error::AVATAR_NOT_SET,
        error::AVATAR_NOT_FOUND,
    )
    .await
}

pub async fn name_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NameResponse>, ApiError> {
    let db = state.clone();
    let user = blocking(move || db.db.get_user_by_id(id))
        .await?
        .ok_or(ApiError::NotFound(error::USER_NOT_FOUND))?;

    Ok(Json(NameResponse { name: user.name }))
}

// -- User links --

pub async fn add_link(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<LinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), ApiError> {
    let db = state.clone();
    let link = blocking(move || db.db.add_user_link(user.id, &req.url)).await?;

    Ok((StatusCode::CREATED, Json(to_link_response(link))))
}

pub async fn my_links(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<LinkResponse>>, ApiError> {
    let db = state.clone();
    let links = blocking(move || db.db.list_user_links(user.id)).await?;

    Ok(Json(links.into_iter().map(to_link_response).collect()))
}

/// Lookup filters by owner as well as id, so a link held by a different
/// user reads the same as one that does not exist.
pub async fn update_link(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(link_id): Path<i64>,
    Json(req): Json<LinkRequest>,
) -> Result<Json<LinkResponse>, ApiError> {
    let db = state.clone();
    let link = blocking(move || db.db.update_user_link(user.id, link_id, &req.url))
        .await?
        .ok_or(ApiError::NotFound(error::LINK_NOT_FOUND))?;

    Ok(Json(to_link_response(link)))
}

pub async fn delete_link(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(link_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let db = state.clone();
    let deleted = blocking(move || db.db.delete_user_link(user.id, link_id)).await?;
    if !deleted {
        return Err(ApiError::NotFound(error::LINK_NOT_FOUND));
    }

    Ok(StatusCode::NO_CONTENT)
}

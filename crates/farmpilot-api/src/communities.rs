use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use tracing::warn;

use farmpilot_db::models::CommunityRow;
use farmpilot_types::api::{CommunityCreate, CommunityPatch, CommunityResponse, UploadedImage};

use crate::auth::AppState;
use crate::error::{self, ApiError, blocking};
use crate::middleware::{CurrentUser, ensure_writer};
use crate::storage::COMMUNITY_IMAGES;
use crate::uploads::{read_upload, serve_image};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
}

fn to_response(row: CommunityRow) -> CommunityResponse {
    let created_at = row
        .created_at
        .parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without
            // timezone. Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(&row.created_at, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!(
                "Corrupt created_at '{}' on community '{}': {}",
                row.created_at, row.id, e
            );
            chrono::DateTime::default()
        });

    CommunityResponse {
        id: row.id,
        title: row.title,
        content: row.content,
        image: row.image,
        writer_id: row.writer_id,
        created_at,
    }
}

/// The writer is always the caller; any writer id in the payload is
/// discarded.
pub async fn create_community(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CommunityCreate>,
) -> Result<Json<CommunityResponse>, ApiError> {
    let db = state.clone();
    let row = blocking(move || db.db.create_community(user.id, &req)).await?;

    Ok(Json(to_response(row)))
}

pub async fn get_community(
    State(state): State<AppState>,
    Path(community_id): Path<i64>,
) -> Result<Json<CommunityResponse>, ApiError> {
    let db = state.clone();
    let row = blocking(move || db.db.get_community(community_id))
        .await?
        .ok_or(ApiError::NotFound(error::POST_NOT_FOUND))?;

    Ok(Json(to_response(row)))
}

pub async fn list_communities(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<CommunityResponse>>, ApiError> {
    let db = state.clone();
    let rows = blocking(move || db.db.list_communities(query.keyword.as_deref())).await?;

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn update_community(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(community_id): Path<i64>,
    Json(patch): Json<CommunityPatch>,
) -> Result<Json<CommunityResponse>, ApiError> {
    let db = state.clone();
    let row = blocking(move || db.db.get_community(community_id))
        .await?
        .ok_or(ApiError::NotFound(error::POST_NOT_FOUND))?;
    ensure_writer(&row, user.id)?;

    let db = state.clone();
    let updated = blocking(move || db.db.update_community(community_id, &patch))
        .await?
        .ok_or(ApiError::NotFound(error::POST_NOT_FOUND))?;

    Ok(Json(to_response(updated)))
}

pub async fn delete_community(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(community_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let db = state.clone();
    let row = blocking(move || db.db.get_community(community_id))
        .await?
        .ok_or(ApiError::NotFound(error::POST_NOT_FOUND))?;
    ensure_writer(&row, user.id)?;

    // The post's image file, if any, stays on disk.
    let db = state.clone();
    blocking(move || db.db.delete_community(community_id).map(|_| ())).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Stores the upload under a fresh generated name and points the post at
/// it. A previously attached image file is left behind on disk.
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(community_id): Path<i64>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadedImage>), ApiError> {
    let db = state.clone();
    let row = blocking(move || db.db.get_community(community_id))
        .await?
        .ok_or(ApiError::NotFound(error::POST_NOT_FOUND))?;
    ensure_writer(&row, user.id)?;

    let (original_name, data) = read_upload(multipart, "file").await?;
    let filename = state
        .storage
        .save(COMMUNITY_IMAGES, &original_name, &data)
        .await?;

    let db = state.clone();
    let stored = filename.clone();
    blocking(move || db.db.set_community_image(community_id, &stored)).await?;

    Ok((StatusCode::CREATED, Json(UploadedImage { filename })))
}

pub async fn get_image(
    State(state): State<AppState>,
    Path(community_id): Path<i64>,
) -> Result<Response, ApiError> {
    let db = state.clone();
    let row = blocking(move || db.db.get_community(community_id))
        .await?
        .ok_or(ApiError::NotFound(error::POST_NOT_FOUND))?;

    serve_image(
        &state.storage,
        COMMUNITY_IMAGES,
        row.image.as_deref(),
        error::IMAGE_NOT_FOUND,
        error::IMAGE_NOT_FOUND,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use axum::extract::State;

    fn create_req() -> CommunityCreate {
        CommunityCreate {
            title: "양액 질문".into(),
            content: "TDS를 얼마로 맞추나요?".into(),
            image: None,
            writer_id: None,
        }
    }

    #[tokio::test]
    async fn writer_is_always_the_caller() {
        let state = test_support::state().await;
        let alice = state.db.create_user("alice@x.com", "Alice", None, "h").unwrap();

        let mut req = create_req();
        req.writer_id = Some(alice.id + 100);

        let created = create_community(
            State(state.clone()),
            Extension(test_support::current_user(&alice)),
            Json(req),
        )
        .await
        .unwrap();

        assert_eq!(created.0.writer_id, alice.id);
    }

    #[tokio::test]
    async fn non_writer_delete_is_forbidden_and_the_post_survives() {
        let state = test_support::state().await;
        let alice = state.db.create_user("alice@x.com", "Alice", None, "h").unwrap();
        let bob = state.db.create_user("bob@x.com", "Bob", None, "h").unwrap();
        let row = state.db.create_community(alice.id, &create_req()).unwrap();

        let err = delete_community(
            State(state.clone()),
            Extension(test_support::current_user(&bob)),
            Path(row.id),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Forbidden));
        assert!(state.db.get_community(row.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn writer_delete_returns_no_content() {
        let state = test_support::state().await;
        let alice = state.db.create_user("alice@x.com", "Alice", None, "h").unwrap();
        let row = state.db.create_community(alice.id, &create_req()).unwrap();

        let status = delete_community(
            State(state.clone()),
            Extension(test_support::current_user(&alice)),
            Path(row.id),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.db.get_community(row.id).unwrap().is_none());
    }
}

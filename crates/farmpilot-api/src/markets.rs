use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Response,
};

use farmpilot_db::models::{MarketRow, decode_hashtags};
use farmpilot_types::api::{MarketCreate, MarketPatch, MarketResponse, UploadedImage};

use crate::auth::AppState;
use crate::communities::SearchQuery;
use crate::error::{self, ApiError, blocking};
use crate::middleware::{CurrentUser, ensure_writer};
use crate::storage::MARKET_IMAGES;
use crate::uploads::{read_upload, serve_image};

fn to_response(row: MarketRow) -> MarketResponse {
    MarketResponse {
        id: row.id,
        title: row.title,
        content: row.content,
        crop: row.crop,
        price: row.price,
        location: row.location,
        farm_name: row.farm_name,
        cultivation_period: row.cultivation_period,
        hashtags: decode_hashtags(row.hashtags.as_deref()),
        image: row.image,
        writer_id: row.writer_id,
    }
}

/// The writer is always the caller; any writer id in the payload is
/// discarded.
pub async fn create_market(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<MarketCreate>,
) -> Result<Json<MarketResponse>, ApiError> {
    let db = state.clone();
    let row = blocking(move || db.db.create_market(user.id, &req)).await?;

    Ok(Json(to_response(row)))
}

pub async fn get_market(
    State(state): State<AppState>,
    Path(market_id): Path<i64>,
) -> Result<Json<MarketResponse>, ApiError> {
    let db = state.clone();
    let row = blocking(move || db.db.get_market(market_id))
        .await?
        .ok_or(ApiError::NotFound(error::POST_NOT_FOUND))?;

    Ok(Json(to_response(row)))
}

pub async fn list_markets(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<MarketResponse>>, ApiError> {
    let db = state.clone();
    let rows = blocking(move || db.db.list_markets(query.keyword.as_deref())).await?;

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn update_market(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(market_id): Path<i64>,
    Json(patch): Json<MarketPatch>,
) -> Result<Json<MarketResponse>, ApiError> {
    let db = state.clone();
    let row = blocking(move || db.db.get_market(market_id))
        .await?
        .ok_or(ApiError::NotFound(error::POST_NOT_FOUND))?;
    ensure_writer(&row, user.id)?;

    let db = state.clone();
    let updated = blocking(move || db.db.update_market(market_id, &patch))
        .await?
        .ok_or(ApiError::NotFound(error::POST_NOT_FOUND))?;

    Ok(Json(to_response(updated)))
}

pub async fn delete_market(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(market_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let db = state.clone();
    let row = blocking(move || db.db.get_market(market_id))
        .await?
        .ok_or(ApiError::NotFound(error::POST_NOT_FOUND))?;
    ensure_writer(&row, user.id)?;

    // The listing's image file, if any, stays on disk.
    let db = state.clone();
    blocking(move || db.db.delete_market(market_id).map(|_| ())).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Stores the upload under a fresh generated name and points the listing
/// at it. A previously attached image file is left behind on disk.
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(market_id): Path<i64>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadedImage>), ApiError> {
    let db = state.clone();
    let row = blocking(move || db.db.get_market(market_id))
        .await?
        .ok_or(ApiError::NotFound(error::POST_NOT_FOUND))?;
    ensure_writer(&row, user.id)?;

    let (original_name, data) = read_upload(multipart, "file").await?;
    let filename = state
        .storage
        .save(MARKET_IMAGES, &original_name, &data)
        .await?;

    let db = state.clone();
    let stored = filename.clone();
    blocking(move || db.db.set_market_image(market_id, &stored)).await?;

    Ok((StatusCode::CREATED, Json(UploadedImage { filename })))
}

pub async fn get_image(
    State(state): State<AppState>,
    Path(market_id): Path<i64>,
) -> Result<Response, ApiError> {
    let db = state.clone();
    let row = blocking(move || db.db.get_market(market_id))
        .await?
        .ok_or(ApiError::NotFound(error::POST_NOT_FOUND))?;

    serve_image(
        &state.storage,
        MARKET_IMAGES,
        row.image.as_deref(),
        error::IMAGE_NOT_FOUND,
        error::IMAGE_NOT_FOUND,
    )
    .await
}

use axum::{
    body::Bytes,
    extract::Multipart,
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::storage::{Storage, content_type};

/// Pull the named file field out of a multipart body; other fields are
/// skipped.
pub async fn read_upload(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("잘못된 업로드 요청입니다."))?
    {
        if field.name() != Some(field_name) {
            continue;
        }
        let original_name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|_| ApiError::BadRequest("파일을 읽을 수 없습니다."))?;
        return Ok((original_name, data));
    }
    Err(ApiError::BadRequest("파일이 필요합니다."))
}

/// Serve a stored image reference: 404 when the reference is unset, and
/// again when the referenced file has gone missing from disk.
pub async fn serve_image(
    storage: &Storage,
    kind: &str,
    reference: Option<&str>,
    not_set: &'static str,
    missing: &'static str,
) -> Result<Response, ApiError> {
    let filename = reference.ok_or(ApiError::NotFound(not_set))?;
    let bytes = storage
        .read(kind, filename)
        .await
        .ok_or(ApiError::NotFound(missing))?;

    Ok(([(header::CONTENT_TYPE, content_type(filename))], bytes).into_response())
}

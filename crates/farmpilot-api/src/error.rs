use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const POST_NOT_FOUND: &str = "게시물을 찾을 수 없습니다.";
pub const IMAGE_NOT_FOUND: &str = "이미지를 찾을 수 없습니다.";
pub const USER_NOT_FOUND: &str = "사용자를 찾을 수 없습니다.";
pub const LINK_NOT_FOUND: &str = "링크를 찾을 수 없습니다.";
pub const AVATAR_NOT_SET: &str = "프로필 이미지가 설정되지 않았습니다.";
pub const AVATAR_NOT_FOUND: &str = "프로필 이미지를 찾을 수 없습니다.";

/// Error taxonomy for the whole HTTP surface.
///
/// Token problems are collapsed into the single `Unauthenticated` variant:
/// a malformed token, an expired token, and a token whose subject no
/// longer resolves to a user all yield the same 401, so callers cannot
/// probe which of those happened.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("자격 증명을 확인할 수 없습니다.")]
    Unauthenticated,
    #[error("이메일 또는 비밀번호가 일치하지 않습니다.")]
    BadCredentials,
    #[error("권한이 없습니다.")]
    Forbidden,
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::Unauthenticated | ApiError::BadCredentials => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            ApiError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, (*msg).to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, (*msg).to_string()),
            ApiError::Internal(e) => {
                error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "서버 오류가 발생했습니다.".to_string(),
                )
            }
        };

        let body = Json(json!({ "detail": detail }));
        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

/// Run a blocking store/hash closure off the async runtime.
pub async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
        .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_carries_www_authenticate_header() {
        let resp = ApiError::Unauthenticated.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn not_found_has_no_auth_challenge() {
        let resp = ApiError::NotFound(POST_NOT_FOUND).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(resp.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}

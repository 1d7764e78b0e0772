use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use farmpilot_db::models::Authored;

use crate::auth::AppState;
use crate::error::{ApiError, blocking};

/// The resolved caller, attached to request extensions by [`require_auth`].
/// Deliberately carries no password hash.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
}

/// Extract and validate the bearer token, then resolve it to a user record.
/// Runs one store lookup per protected request; there is no caching.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthenticated)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthenticated)?;

    let claims = state
        .tokens
        .verify(token)
        .map_err(|_| ApiError::Unauthenticated)?;

    // A subject that no longer resolves (account removed after issue) is
    // indistinguishable from a bad token on the wire.
    let db = state.clone();
    let user = blocking(move || db.db.get_user_by_email(&claims.sub))
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    req.extensions_mut().insert(CurrentUser {
        id: user.id,
        email: user.email,
        name: user.name,
        avatar: user.avatar,
    });
    Ok(next.run(req).await)
}

/// The one ownership check shared by every mutate/delete/image path.
pub fn ensure_writer<T: Authored>(row: &T, caller_id: i64) -> Result<(), ApiError> {
    if row.writer_id() != caller_id {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmpilot_db::models::CommunityRow;

    #[test]
    fn ensure_writer_rejects_non_owners() {
        let row = CommunityRow {
            id: 1,
            title: "t".into(),
            content: "c".into(),
            image: None,
            writer_id: 42,
            created_at: String::new(),
        };

        assert!(ensure_writer(&row, 42).is_ok());
        assert!(matches!(
            ensure_writer(&row, 7),
            Err(ApiError::Forbidden)
        ));
    }
}

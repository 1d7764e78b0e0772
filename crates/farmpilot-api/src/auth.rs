use std::sync::Arc;

use axum::{Form, Json, extract::State};
use tracing::info;

use farmpilot_db::Database;
use farmpilot_types::api::{SignupRequest, TokenForm, TokenResponse, UserResponse};

use crate::error::{ApiError, blocking};
use crate::password;
use crate::status::StatusCell;
use crate::storage::Storage;
use crate::token::TokenConfig;
use crate::users::to_user_response;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenConfig,
    pub storage: Storage,
    pub status: StatusCell,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest("올바른 이메일 주소가 아닙니다."));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("비밀번호를 제공해야 합니다."));
    }

    let db = state.clone();
    let created = blocking(move || {
        if db.db.get_user_by_email(&req.email)?.is_some() {
            return Ok(None);
        }
        // Only the bcrypt hash ever reaches the store.
        let hashed = password::hash_password(&req.password)?;
        let user = db
            .db
            .create_user(&req.email, &req.name, req.avatar.as_deref(), &hashed)?;
        Ok(Some(user))
    })
    .await?;

    let user = created.ok_or(ApiError::BadRequest("이메일이 이미 등록되어 있습니다."))?;
    info!("New signup: {} ({})", user.email, user.id);

    Ok(Json(to_user_response(user)))
}

/// OAuth2 password flow: form-encoded `username` (the email) + `password`
/// in exchange for a bearer token.
pub async fn issue_token(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let db = state.clone();
    let email = form.username.clone();
    let user = blocking(move || db.db.get_user_by_email(&email))
        .await?
        .ok_or(ApiError::BadCredentials)?;

    let email = user.email;
    let stored_hash = user.password;
    let ok = blocking(move || password::verify_password(&form.password, &stored_hash)).await?;
    if !ok {
        return Err(ApiError::BadCredentials);
    }

    let access_token = state.tokens.issue(&email)?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn signup_req(email: &str) -> SignupRequest {
        SignupRequest {
            email: email.into(),
            name: "Alice".into(),
            avatar: None,
            password: "plkit-pass".into(),
        }
    }

    #[tokio::test]
    async fn signup_then_login_issues_a_working_token() {
        let state = test_support::state().await;

        let created = signup(State(state.clone()), Json(signup_req("a@x.com")))
            .await
            .unwrap();
        assert_eq!(created.0.email, "a@x.com");
        assert_eq!(created.0.name, "Alice");

        // The stored password is a hash, never the plaintext.
        let stored = state.db.get_user_by_email("a@x.com").unwrap().unwrap();
        assert_ne!(stored.password, "plkit-pass");

        let token = issue_token(
            State(state.clone()),
            Form(TokenForm {
                username: "a@x.com".into(),
                password: "plkit-pass".into(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(token.0.token_type, "bearer");
        let claims = state.tokens.verify(&token.0.access_token).unwrap();
        assert_eq!(claims.sub, "a@x.com");
    }

    #[tokio::test]
    async fn duplicate_email_signup_is_rejected() {
        let state = test_support::state().await;
        signup(State(state.clone()), Json(signup_req("a@x.com")))
            .await
            .unwrap();

        let err = signup(State(state.clone()), Json(signup_req("a@x.com")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let state = test_support::state().await;
        signup(State(state.clone()), Json(signup_req("a@x.com")))
            .await
            .unwrap();

        let wrong_password = issue_token(
            State(state.clone()),
            Form(TokenForm {
                username: "a@x.com".into(),
                password: "nope".into(),
            }),
        )
        .await
        .unwrap_err();
        let unknown_email = issue_token(
            State(state.clone()),
            Form(TokenForm {
                username: "ghost@x.com".into(),
                password: "nope".into(),
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(wrong_password, ApiError::BadCredentials));
        assert!(matches!(unknown_email, ApiError::BadCredentials));
    }
}

pub mod auth;
pub mod communities;
pub mod demo;
pub mod error;
pub mod markets;
pub mod middleware;
pub mod password;
pub mod status;
pub mod storage;
pub mod token;
pub mod uploads;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use jsonwebtoken::Algorithm;

    use farmpilot_db::Database;
    use farmpilot_db::models::UserRow;

    use crate::auth::{AppState, AppStateInner};
    use crate::middleware::CurrentUser;
    use crate::storage::Storage;
    use crate::token::TokenConfig;

    pub async fn state() -> AppState {
        let dir = std::env::temp_dir().join(format!("farmpilot-test-{}", uuid::Uuid::new_v4()));
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            tokens: TokenConfig::new("test-secret".into(), Algorithm::HS256, 30),
            storage: Storage::new(dir).await.unwrap(),
            status: Default::default(),
        })
    }

    pub fn current_user(row: &UserRow) -> CurrentUser {
        CurrentUser {
            id: row.id,
            email: row.email.clone(),
            name: row.name.clone(),
            avatar: row.avatar.clone(),
        }
    }
}

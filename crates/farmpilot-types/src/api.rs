use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// JWT claims shared between the auth endpoints (token issue) and the
/// request guard (token verify). `sub` carries the user's email; validity
/// is purely signature + expiry, there is no server-side revocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub password: String,
}

/// OAuth2 password flow: the login form carries the email in `username`.
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

// -- Users --

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NameResponse {
    pub name: String,
}

// -- User links --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: i64,
    pub user_id: i64,
    pub url: String,
}

// -- Communities --

#[derive(Debug, Deserialize)]
pub struct CommunityCreate {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Accepted on the wire but never trusted; the server always stamps
    /// the caller's id as the writer.
    #[serde(default)]
    pub writer_id: Option<i64>,
}

/// Merge-patch payload: absent fields leave the stored values untouched.
#[derive(Debug, Default, Deserialize)]
pub struct CommunityPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommunityResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub writer_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// -- Markets --

#[derive(Debug, Deserialize)]
pub struct MarketCreate {
    pub title: String,
    pub content: String,
    pub crop: String,
    pub price: i64,
    pub location: String,
    pub farm_name: String,
    pub cultivation_period: String,
    #[serde(default)]
    pub hashtags: Option<Vec<String>>,
    #[serde(default)]
    pub image: Option<String>,
    /// Accepted on the wire but never trusted; see [`CommunityCreate`].
    #[serde(default)]
    pub writer_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MarketPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub crop: Option<String>,
    pub price: Option<i64>,
    pub location: Option<String>,
    pub farm_name: Option<String>,
    pub cultivation_period: Option<String>,
    pub hashtags: Option<Vec<String>>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MarketResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub crop: String,
    pub price: i64,
    pub location: String,
    pub farm_name: String,
    pub cultivation_period: String,
    pub hashtags: Vec<String>,
    pub image: Option<String>,
    pub writer_id: i64,
}

// -- Uploads --

#[derive(Debug, Serialize)]
pub struct UploadedImage {
    pub filename: String,
}

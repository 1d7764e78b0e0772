//! Database row types mapping directly to SQLite rows.
//! Distinct from the farmpilot-types API models to keep the DB layer
//! independent of the wire format.

use farmpilot_types::api::{CommunityPatch, MarketPatch};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct UserLinkRow {
    pub id: i64,
    pub user_id: i64,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct CommunityRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub writer_id: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct MarketRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub crop: String,
    pub price: i64,
    pub location: String,
    pub farm_name: String,
    pub cultivation_period: String,
    /// JSON-encoded string list, see [`encode_hashtags`]/[`decode_hashtags`].
    pub hashtags: Option<String>,
    pub image: Option<String>,
    pub writer_id: i64,
}

/// Rows that carry an owning writer. Every mutation path checks this
/// against the caller before touching the row.
pub trait Authored {
    fn writer_id(&self) -> i64;
}

impl Authored for CommunityRow {
    fn writer_id(&self) -> i64 {
        self.writer_id
    }
}

impl Authored for MarketRow {
    fn writer_id(&self) -> i64 {
        self.writer_id
    }
}

impl CommunityRow {
    /// Merge-patch: fields absent from the patch are left untouched.
    pub fn apply(&mut self, patch: &CommunityPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(image) = &patch.image {
            self.image = Some(image.clone());
        }
    }
}

impl MarketRow {
    /// Merge-patch: fields absent from the patch are left untouched.
    pub fn apply(&mut self, patch: &MarketPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(crop) = &patch.crop {
            self.crop = crop.clone();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(location) = &patch.location {
            self.location = location.clone();
        }
        if let Some(farm_name) = &patch.farm_name {
            self.farm_name = farm_name.clone();
        }
        if let Some(period) = &patch.cultivation_period {
            self.cultivation_period = period.clone();
        }
        if let Some(hashtags) = &patch.hashtags {
            self.hashtags = Some(encode_hashtags(hashtags));
        }
        if let Some(image) = &patch.image {
            self.image = Some(image.clone());
        }
    }
}

pub fn encode_hashtags(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".into())
}

pub fn decode_hashtags(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Corrupt hashtags column '{}': {}", raw, e);
        Vec::new()
    })
}

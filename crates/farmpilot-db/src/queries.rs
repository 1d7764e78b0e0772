use crate::Database;
use crate::models::{CommunityRow, MarketRow, UserLinkRow, UserRow, encode_hashtags};
use anyhow::Result;
use farmpilot_types::api::{CommunityCreate, CommunityPatch, MarketCreate, MarketPatch};
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        email: &str,
        name: &str,
        avatar: Option<&str>,
        password_hash: &str,
    ) -> Result<UserRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO user (email, name, avatar, password) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![email, name, avatar, password_hash],
            )?;
            let id = conn.last_insert_rowid();
            query_user_by_id(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("user {} vanished after insert", id))
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn update_user_name(&self, id: i64, name: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE user SET name = ?1 WHERE id = ?2",
                rusqlite::params![name, id],
            )?;
            query_user_by_id(conn, id)
        })
    }

    pub fn update_user_avatar(&self, id: i64, avatar: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE user SET avatar = ?1 WHERE id = ?2",
                rusqlite::params![avatar, id],
            )?;
            query_user_by_id(conn, id)
        })
    }

    // -- User links --

    pub fn add_user_link(&self, user_id: i64, url: &str) -> Result<UserLinkRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO user_link (user_id, url) VALUES (?1, ?2)",
                rusqlite::params![user_id, url],
            )?;
            Ok(UserLinkRow {
                id: conn.last_insert_rowid(),
                user_id,
                url: url.to_string(),
            })
        })
    }

    pub fn list_user_links(&self, user_id: i64) -> Result<Vec<UserLinkRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, user_id, url FROM user_link WHERE user_id = ?1")?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(UserLinkRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        url: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Scoped to the owner: a link held by a different user is reported
    /// the same way as a link that does not exist.
    pub fn update_user_link(
        &self,
        user_id: i64,
        link_id: i64,
        url: &str,
    ) -> Result<Option<UserLinkRow>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE user_link SET url = ?1 WHERE id = ?2 AND user_id = ?3",
                rusqlite::params![url, link_id, user_id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            Ok(Some(UserLinkRow {
                id: link_id,
                user_id,
                url: url.to_string(),
            }))
        })
    }

    pub fn delete_user_link(&self, user_id: i64, link_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM user_link WHERE id = ?1 AND user_id = ?2",
                rusqlite::params![link_id, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Communities --

    pub fn create_community(&self, writer_id: i64, req: &CommunityCreate) -> Result<CommunityRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO community (title, content, image, writer_id) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![req.title, req.content, req.image, writer_id],
            )?;
            let id = conn.last_insert_rowid();
            query_community(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("community {} vanished after insert", id))
        })
    }

    pub fn get_community(&self, id: i64) -> Result<Option<CommunityRow>> {
        self.with_conn(|conn| query_community(conn, id))
    }

    /// `keyword` filters by case-sensitive substring over title or content;
    /// `instr` instead of LIKE because SQLite LIKE folds ASCII case.
    pub fn list_communities(&self, keyword: Option<&str>) -> Result<Vec<CommunityRow>> {
        self.with_conn(|conn| {
            let mut rows = Vec::new();
            match keyword {
                Some(keyword) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, title, content, image, writer_id, created_at
                         FROM community
                         WHERE instr(title, ?1) > 0 OR instr(content, ?1) > 0",
                    )?;
                    let mapped = stmt.query_map([keyword], map_community)?;
                    for row in mapped {
                        rows.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, title, content, image, writer_id, created_at FROM community",
                    )?;
                    let mapped = stmt.query_map([], map_community)?;
                    for row in mapped {
                        rows.push(row?);
                    }
                }
            }
            Ok(rows)
        })
    }

    pub fn update_community(&self, id: i64, patch: &CommunityPatch) -> Result<Option<CommunityRow>> {
        self.with_conn(|conn| {
            let Some(mut row) = query_community(conn, id)? else {
                return Ok(None);
            };
            row.apply(patch);
            conn.execute(
                "UPDATE community SET title = ?1, content = ?2, image = ?3 WHERE id = ?4",
                rusqlite::params![row.title, row.content, row.image, id],
            )?;
            Ok(Some(row))
        })
    }

    pub fn set_community_image(&self, id: i64, filename: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE community SET image = ?1 WHERE id = ?2",
                rusqlite::params![filename, id],
            )?;
            Ok(())
        })
    }

    pub fn delete_community(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM community WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // -- Markets --

    pub fn create_market(&self, writer_id: i64, req: &MarketCreate) -> Result<MarketRow> {
        self.with_conn(|conn| {
            let hashtags = req.hashtags.as_deref().map(encode_hashtags);
            conn.execute(
                "INSERT INTO market
                    (title, content, crop, price, location, farm_name,
                     cultivation_period, hashtags, image, writer_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    req.title,
                    req.content,
                    req.crop,
                    req.price,
                    req.location,
                    req.farm_name,
                    req.cultivation_period,
                    hashtags,
                    req.image,
                    writer_id
                ],
            )?;
            let id = conn.last_insert_rowid();
            query_market(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("market {} vanished after insert", id))
        })
    }

    pub fn get_market(&self, id: i64) -> Result<Option<MarketRow>> {
        self.with_conn(|conn| query_market(conn, id))
    }

    pub fn list_markets(&self, keyword: Option<&str>) -> Result<Vec<MarketRow>> {
        self.with_conn(|conn| {
            let mut rows = Vec::new();
            match keyword {
                Some(keyword) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, title, content, crop, price, location, farm_name,
                                cultivation_period, hashtags, image, writer_id
                         FROM market
                         WHERE instr(title, ?1) > 0 OR instr(content, ?1) > 0",
                    )?;
                    let mapped = stmt.query_map([keyword], map_market)?;
                    for row in mapped {
                        rows.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, title, content, crop, price, location, farm_name,
                                cultivation_period, hashtags, image, writer_id
                         FROM market",
                    )?;
                    let mapped = stmt.query_map([], map_market)?;
                    for row in mapped {
                        rows.push(row?);
                    }
                }
            }
            Ok(rows)
        })
    }

    pub fn update_market(&self, id: i64, patch: &MarketPatch) -> Result<Option<MarketRow>> {
        self.with_conn(|conn| {
            let Some(mut row) = query_market(conn, id)? else {
                return Ok(None);
            };
            row.apply(patch);
            conn.execute(
                "UPDATE market SET title = ?1, content = ?2, crop = ?3, price = ?4,
                        location = ?5, farm_name = ?6, cultivation_period = ?7,
                        hashtags = ?8, image = ?9
                 WHERE id = ?10",
                rusqlite::params![
                    row.title,
                    row.content,
                    row.crop,
                    row.price,
                    row.location,
                    row.farm_name,
                    row.cultivation_period,
                    row.hashtags,
                    row.image,
                    id
                ],
            )?;
            Ok(Some(row))
        })
    }

    pub fn set_market_image(&self, id: i64, filename: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE market SET image = ?1 WHERE id = ?2",
                rusqlite::params![filename, id],
            )?;
            Ok(())
        })
    }

    pub fn delete_market(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM market WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, email, name, avatar, password FROM user WHERE email = ?1")?;

    let row = stmt.query_row([email], map_user).optional()?;
    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, email, name, avatar, password FROM user WHERE id = ?1")?;

    let row = stmt.query_row([id], map_user).optional()?;
    Ok(row)
}

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        avatar: row.get(3)?,
        password: row.get(4)?,
    })
}

fn query_community(conn: &Connection, id: i64) -> Result<Option<CommunityRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, content, image, writer_id, created_at FROM community WHERE id = ?1",
    )?;

    let row = stmt.query_row([id], map_community).optional()?;
    Ok(row)
}

fn map_community(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommunityRow> {
    Ok(CommunityRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        image: row.get(3)?,
        writer_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn query_market(conn: &Connection, id: i64) -> Result<Option<MarketRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, content, crop, price, location, farm_name,
                cultivation_period, hashtags, image, writer_id
         FROM market WHERE id = ?1",
    )?;

    let row = stmt.query_row([id], map_market).optional()?;
    Ok(row)
}

fn map_market(row: &rusqlite::Row<'_>) -> rusqlite::Result<MarketRow> {
    Ok(MarketRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        crop: row.get(3)?,
        price: row.get(4)?,
        location: row.get(5)?,
        farm_name: row.get(6)?,
        cultivation_period: row.get(7)?,
        hashtags: row.get(8)?,
        image: row.get(9)?,
        writer_id: row.get(10)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::decode_hashtags;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn seed_user(db: &Database, email: &str) -> UserRow {
        db.create_user(email, "Tester", None, "$2b$12$not-a-real-hash")
            .unwrap()
    }

    fn community_req(title: &str, content: &str) -> CommunityCreate {
        CommunityCreate {
            title: title.into(),
            content: content.into(),
            image: None,
            writer_id: None,
        }
    }

    fn market_req(title: &str) -> MarketCreate {
        MarketCreate {
            title: title.into(),
            content: "신선한 작물 판매합니다".into(),
            crop: "lettuce".into(),
            price: 5000,
            location: "Gwangju".into(),
            farm_name: "Green Farm".into(),
            cultivation_period: "2024-03 ~ 2024-05".into(),
            hashtags: Some(vec!["fresh".into()]),
            image: None,
            writer_id: None,
        }
    }

    #[test]
    fn create_user_and_fetch_by_email() {
        let db = test_db();
        let user = seed_user(&db, "a@x.com");

        let fetched = db.get_user_by_email("a@x.com").unwrap().unwrap();
        assert_eq!(fetched.id, user.id);
        assert_eq!(fetched.name, "Tester");
        assert!(db.get_user_by_email("b@x.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_rejected_by_the_store() {
        let db = test_db();
        seed_user(&db, "a@x.com");
        assert!(db.create_user("a@x.com", "Other", None, "hash").is_err());
    }

    #[test]
    fn links_are_scoped_to_their_owner() {
        let db = test_db();
        let alice = seed_user(&db, "alice@x.com");
        let bob = seed_user(&db, "bob@x.com");

        let link = db.add_user_link(alice.id, "https://plkit.example").unwrap();

        // Bob can neither see, update, nor delete Alice's link.
        assert!(db.list_user_links(bob.id).unwrap().is_empty());
        assert!(
            db.update_user_link(bob.id, link.id, "https://evil.example")
                .unwrap()
                .is_none()
        );
        assert!(!db.delete_user_link(bob.id, link.id).unwrap());

        // Alice can.
        let updated = db
            .update_user_link(alice.id, link.id, "https://plkit.example/2")
            .unwrap()
            .unwrap();
        assert_eq!(updated.url, "https://plkit.example/2");
        assert!(db.delete_user_link(alice.id, link.id).unwrap());
        assert!(db.list_user_links(alice.id).unwrap().is_empty());
    }

    #[test]
    fn community_create_stamps_writer_and_timestamp() {
        let db = test_db();
        let user = seed_user(&db, "a@x.com");

        let row = db
            .create_community(user.id, &community_req("재배 일지", "오늘의 기록"))
            .unwrap();

        assert_eq!(row.writer_id, user.id);
        assert!(!row.created_at.is_empty());
        assert_eq!(db.get_community(row.id).unwrap().unwrap().title, "재배 일지");
    }

    #[test]
    fn community_keyword_search_is_case_sensitive_substring() {
        let db = test_db();
        let user = seed_user(&db, "a@x.com");
        db.create_community(user.id, &community_req("Tomato diary", "day one"))
            .unwrap();
        db.create_community(user.id, &community_req("Lettuce log", "tomato seedlings"))
            .unwrap();
        db.create_community(user.id, &community_req("Unrelated", "nothing here"))
            .unwrap();

        // Substring match over title OR content.
        let hits = db.list_communities(Some("tomato")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Lettuce log");

        // Case matters.
        let hits = db.list_communities(Some("Tomato")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Tomato diary");

        // No keyword returns everything.
        assert_eq!(db.list_communities(None).unwrap().len(), 3);
    }

    #[test]
    fn community_merge_patch_keeps_absent_fields() {
        let db = test_db();
        let user = seed_user(&db, "a@x.com");
        let row = db
            .create_community(user.id, &community_req("원래 제목", "원래 내용"))
            .unwrap();

        let patch = CommunityPatch {
            title: Some("바뀐 제목".into()),
            ..Default::default()
        };
        let updated = db.update_community(row.id, &patch).unwrap().unwrap();

        assert_eq!(updated.title, "바뀐 제목");
        assert_eq!(updated.content, "원래 내용");
        assert_eq!(updated.writer_id, user.id);

        assert!(db.update_community(9999, &patch).unwrap().is_none());
    }

    #[test]
    fn community_delete_reports_absence() {
        let db = test_db();
        let user = seed_user(&db, "a@x.com");
        let row = db
            .create_community(user.id, &community_req("t", "c"))
            .unwrap();

        assert!(db.delete_community(row.id).unwrap());
        assert!(!db.delete_community(row.id).unwrap());
        assert!(db.get_community(row.id).unwrap().is_none());
    }

    #[test]
    fn market_roundtrip_with_hashtags() {
        let db = test_db();
        let user = seed_user(&db, "a@x.com");

        let row = db.create_market(user.id, &market_req("상추 팝니다")).unwrap();
        assert_eq!(row.writer_id, user.id);
        assert_eq!(decode_hashtags(row.hashtags.as_deref()), vec!["fresh"]);

        let patch = MarketPatch {
            price: Some(4500),
            hashtags: Some(vec!["fresh".into(), "sale".into()]),
            ..Default::default()
        };
        let updated = db.update_market(row.id, &patch).unwrap().unwrap();
        assert_eq!(updated.price, 4500);
        assert_eq!(updated.farm_name, "Green Farm");
        assert_eq!(
            decode_hashtags(updated.hashtags.as_deref()),
            vec!["fresh", "sale"]
        );
    }

    #[test]
    fn market_keyword_search_covers_title_and_content() {
        let db = test_db();
        let user = seed_user(&db, "a@x.com");
        db.create_market(user.id, &market_req("상추 팝니다")).unwrap();
        db.create_market(user.id, &market_req("토마토 직거래")).unwrap();

        let hits = db.list_markets(Some("상추")).unwrap();
        assert_eq!(hits.len(), 1);

        // "신선한" appears in every fixture's content.
        assert_eq!(db.list_markets(Some("신선한")).unwrap().len(), 2);
        assert!(db.list_markets(Some("없는말")).unwrap().is_empty());
    }

    #[test]
    fn image_reference_overwrite_keeps_row_intact() {
        let db = test_db();
        let user = seed_user(&db, "a@x.com");
        let row = db
            .create_community(user.id, &community_req("t", "c"))
            .unwrap();

        db.set_community_image(row.id, "first.png").unwrap();
        db.set_community_image(row.id, "second.png").unwrap();

        let row = db.get_community(row.id).unwrap().unwrap();
        assert_eq!(row.image.as_deref(), Some("second.png"));
        assert_eq!(row.title, "t");
    }
}

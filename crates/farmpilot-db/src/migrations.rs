use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS user (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            email       TEXT NOT NULL UNIQUE,
            name        TEXT NOT NULL,
            avatar      TEXT,
            password    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS user_link (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     INTEGER NOT NULL REFERENCES user(id),
            url         TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_user_link_user
            ON user_link(user_id);

        CREATE TABLE IF NOT EXISTS community (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            title       TEXT NOT NULL,
            content     TEXT NOT NULL,
            image       TEXT,
            writer_id   INTEGER NOT NULL REFERENCES user(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_community_writer
            ON community(writer_id);

        CREATE TABLE IF NOT EXISTS market (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            title               TEXT NOT NULL,
            content             TEXT NOT NULL,
            crop                TEXT NOT NULL,
            price               INTEGER NOT NULL,
            location            TEXT NOT NULL,
            farm_name           TEXT NOT NULL,
            cultivation_period  TEXT NOT NULL,
            hashtags            TEXT,
            image               TEXT,
            writer_id           INTEGER NOT NULL REFERENCES user(id)
        );

        CREATE INDEX IF NOT EXISTS idx_market_writer
            ON market(writer_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

pub mod messages;
pub mod rooms;
pub mod topics;
pub mod users;

use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use time::OffsetDateTime;

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id            BLOB PRIMARY KEY,
        username      TEXT NOT NULL UNIQUE,
        alias         TEXT NOT NULL,
        email         TEXT,
        password_hash TEXT NOT NULL,
        joined        INTEGER NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS topics (
        id   BLOB PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS rooms (
        id          BLOB PRIMARY KEY,
        host_id     BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        topic_id    BLOB NOT NULL REFERENCES topics(id),
        name        TEXT NOT NULL,
        description TEXT,
        created     INTEGER NOT NULL,
        updated     INTEGER NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS room_participants (
        room_id BLOB NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
        user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        PRIMARY KEY (room_id, user_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS messages (
        id      BLOB PRIMARY KEY,
        room_id BLOB NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
        user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        body    TEXT NOT NULL,
        created INTEGER NOT NULL,
        updated INTEGER NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS rooms_host ON rooms(host_id)",
    "CREATE INDEX IF NOT EXISTS rooms_topic ON rooms(topic_id)",
    "CREATE INDEX IF NOT EXISTS messages_room ON messages(room_id, created)",
    "CREATE INDEX IF NOT EXISTS messages_user ON messages(user_id, created)",
];

pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Creates any missing tables and indexes.
pub async fn init(db_pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(db_pool).await?;
    }
    Ok(())
}

/// Unix milliseconds, the unit every timestamp column uses.
pub fn now() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// A fresh in-memory database. One connection that never idles out,
/// since every sqlite `:memory:` connection is its own database.
pub async fn memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    init(&db_pool).await?;
    Ok(db_pool)
}

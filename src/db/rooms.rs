use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

use crate::{policy::Owned, AppResult};

use super::topics::Topic;

/// A room joined with its host's username, its topic and its head count.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created: i64,
    pub updated: i64,
    pub host_id: Uuid,
    pub host_username: String,
    pub topic_id: Uuid,
    pub topic_name: String,
    pub participant_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Participant {
    pub id: Uuid,
    pub username: String,
    pub alias: String,
}

impl Owned for Room {
    fn owner_id(&self) -> Uuid {
        self.host_id
    }
}

const SELECT_ROOMS: &str = "SELECT r.id, r.name, r.description, r.created, r.updated,
        r.host_id, u.username AS host_username,
        r.topic_id, t.name AS topic_name,
        (SELECT COUNT(*) FROM room_participants p WHERE p.room_id = r.id) AS participant_count
    FROM rooms r
    JOIN users u ON u.id = r.host_id
    JOIN topics t ON t.id = r.topic_id";

/// Normalizes a submitted description: blank means none.
fn description(description: &str) -> Option<&str> {
    let description = description.trim();
    (!description.is_empty()).then_some(description)
}

impl Room {
    pub async fn get(db_pool: &SqlitePool, id: Uuid) -> AppResult<Option<Room>> {
        Ok(sqlx::query_as(&format!("{SELECT_ROOMS} WHERE r.id=?"))
            .bind(id)
            .fetch_optional(db_pool)
            .await?)
    }

    pub async fn create(
        db_pool: &SqlitePool,
        host_id: Uuid,
        topic: &Topic,
        name: &str,
        description_text: &str,
    ) -> AppResult<Uuid> {
        let id = Uuid::now_v7();
        let now = super::now();
        sqlx::query("INSERT INTO rooms (id,host_id,topic_id,name,description,created,updated) VALUES (?,?,?,?,?,?,?)")
            .bind(id)
            .bind(host_id)
            .bind(topic.id)
            .bind(name)
            .bind(description(description_text))
            .bind(now)
            .bind(now)
            .execute(db_pool)
            .await?;
        Ok(id)
    }

    /// Overwrites name, topic and description.
    pub async fn update(
        &self,
        db_pool: &SqlitePool,
        topic: &Topic,
        name: &str,
        description_text: &str,
    ) -> AppResult<()> {
        sqlx::query("UPDATE rooms SET topic_id=?, name=?, description=?, updated=? WHERE id=?")
            .bind(topic.id)
            .bind(name)
            .bind(description(description_text))
            .bind(super::now())
            .bind(self.id)
            .execute(db_pool)
            .await?;
        Ok(())
    }

    /// Deletes the room; its messages and participant rows go with it.
    pub async fn delete(&self, db_pool: &SqlitePool) -> AppResult<()> {
        sqlx::query("DELETE FROM rooms WHERE id=?")
            .bind(self.id)
            .execute(db_pool)
            .await?;
        Ok(())
    }

    /// Records `user_id` as a participant. Returns false if they already were one.
    pub async fn add_participant<'e>(&self, db: impl SqliteExecutor<'e>, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("INSERT OR IGNORE INTO room_participants (room_id,user_id) VALUES (?,?)")
            .bind(self.id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn participants(&self, db_pool: &SqlitePool) -> AppResult<Vec<Participant>> {
        Ok(sqlx::query_as(
            "SELECT u.id, u.username, u.alias
             FROM room_participants p JOIN users u ON u.id = p.user_id
             WHERE p.room_id=?
             ORDER BY u.username",
        )
        .bind(self.id)
        .fetch_all(db_pool)
        .await?)
    }
}

/// Rooms whose topic name, name or description contains `q`. Case-sensitive.
pub async fn search(db_pool: &SqlitePool, q: &str) -> AppResult<Vec<Room>> {
    Ok(sqlx::query_as(&format!(
        "{SELECT_ROOMS}
         WHERE instr(t.name, ?1) > 0
            OR instr(r.name, ?1) > 0
            OR instr(r.description, ?1) > 0
         ORDER BY r.updated DESC, r.created DESC, r.id DESC"
    ))
    .bind(q)
    .fetch_all(db_pool)
    .await?)
}

pub async fn hosted_by(db_pool: &SqlitePool, host_id: Uuid) -> AppResult<Vec<Room>> {
    Ok(sqlx::query_as(&format!(
        "{SELECT_ROOMS} WHERE r.host_id=? ORDER BY r.updated DESC, r.created DESC, r.id DESC"
    ))
    .bind(host_id)
    .fetch_all(db_pool)
    .await?)
}

pub async fn count(db_pool: &SqlitePool) -> AppResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rooms")
        .fetch_one(db_pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, users::User};

    async fn seed(db_pool: &SqlitePool) -> (User, Vec<Uuid>) {
        let host = User::create(db_pool, "host", "password123").await.unwrap();
        let (python, _) = Topic::get_or_create(db_pool, "Python").await.unwrap();
        let (rust, _) = Topic::get_or_create(db_pool, "Rust").await.unwrap();

        let ids = vec![
            Room::create(db_pool, host.id, &python, "Beginners", "").await.unwrap(),
            Room::create(db_pool, host.id, &rust, "happy hour", "talk about numpy").await.unwrap(),
            Room::create(db_pool, host.id, &rust, "Borrowck", "lifetimes").await.unwrap(),
            Room::create(db_pool, host.id, &rust, "Snakes", "PYthon? no").await.unwrap(),
        ];
        (host, ids)
    }

    #[tokio::test]
    async fn search_matches_topic_name_or_description_case_sensitively() {
        let db_pool = db::memory().await.unwrap();
        let (_, ids) = seed(&db_pool).await;

        let mut found: Vec<Uuid> = search(&db_pool, "y").await.unwrap().into_iter().map(|r| r.id).collect();
        found.sort();
        let mut expected = vec![ids[0], ids[1]];
        expected.sort();
        // "Beginners" through its topic, "happy hour" through name and description
        assert_eq!(found, expected);

        let names: Vec<String> = search(&db_pool, "py").await.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0], "happy hour");

        assert_eq!(search(&db_pool, "").await.unwrap().len(), 4);
        assert_eq!(count(&db_pool).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn participants_are_added_once() {
        let db_pool = db::memory().await.unwrap();
        let (host, ids) = seed(&db_pool).await;
        let room = Room::get(&db_pool, ids[0]).await.unwrap().unwrap();

        assert!(room.add_participant(&db_pool, host.id).await.unwrap());
        assert!(!room.add_participant(&db_pool, host.id).await.unwrap());
        assert_eq!(room.participants(&db_pool).await.unwrap().len(), 1);

        let room = Room::get(&db_pool, ids[0]).await.unwrap().unwrap();
        assert_eq!(room.participant_count, 1);
    }

    #[tokio::test]
    async fn blank_description_is_stored_as_none() {
        let db_pool = db::memory().await.unwrap();
        let (_, ids) = seed(&db_pool).await;

        let room = Room::get(&db_pool, ids[0]).await.unwrap().unwrap();
        assert_eq!(room.description, None);
        assert_eq!(room.topic_name, "Python");
        assert_eq!(room.host_username, "host");
    }
}

use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::rooms::Room;
use crate::{policy::Owned, AppResult};

/// A message joined with its author and the room it was posted in.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub room_id: Uuid,
    pub room_name: String,
    pub user_id: Uuid,
    pub username: String,
    pub alias: String,
    pub body: String,
    pub created: i64,
}

impl Owned for Message {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

const SELECT_MESSAGES: &str = "SELECT m.id, m.room_id, r.name AS room_name,
        m.user_id, u.username, u.alias, m.body, m.created
    FROM messages m
    JOIN rooms r ON r.id = m.room_id
    JOIN users u ON u.id = m.user_id";

const NEWEST_FIRST: &str = "ORDER BY m.created DESC, m.id DESC";

impl Message {
    pub async fn create<'e>(
        db: impl SqliteExecutor<'e>,
        room_id: Uuid,
        user_id: Uuid,
        body: &str,
    ) -> AppResult<Uuid> {
        let id = Uuid::now_v7();
        let now = super::now();
        sqlx::query("INSERT INTO messages (id,room_id,user_id,body,created,updated) VALUES (?,?,?,?,?,?)")
            .bind(id)
            .bind(room_id)
            .bind(user_id)
            .bind(body)
            .bind(now)
            .bind(now)
            .execute(db)
            .await?;
        Ok(id)
    }

    /// Stores the message and makes its author a participant, both or neither.
    /// The flag is true when the author was not a participant before.
    pub async fn post(db_pool: &SqlitePool, room: &Room, user_id: Uuid, body: &str) -> AppResult<(Uuid, bool)> {
        let mut tx = db_pool.begin().await?;
        let id = Message::create(&mut *tx, room.id, user_id, body).await?;
        let joined = room.add_participant(&mut *tx, user_id).await?;
        tx.commit().await?;
        Ok((id, joined))
    }

    pub async fn get(db_pool: &SqlitePool, id: Uuid) -> AppResult<Option<Message>> {
        Ok(sqlx::query_as(&format!("{SELECT_MESSAGES} WHERE m.id=?"))
            .bind(id)
            .fetch_optional(db_pool)
            .await?)
    }

    pub async fn delete(&self, db_pool: &SqlitePool) -> AppResult<()> {
        sqlx::query("DELETE FROM messages WHERE id=?")
            .bind(self.id)
            .execute(db_pool)
            .await?;
        Ok(())
    }
}

pub async fn in_room(db_pool: &SqlitePool, room_id: Uuid) -> AppResult<Vec<Message>> {
    Ok(sqlx::query_as(&format!("{SELECT_MESSAGES} WHERE m.room_id=? {NEWEST_FIRST}"))
        .bind(room_id)
        .fetch_all(db_pool)
        .await?)
}

pub async fn by_user(db_pool: &SqlitePool, user_id: Uuid) -> AppResult<Vec<Message>> {
    Ok(sqlx::query_as(&format!("{SELECT_MESSAGES} WHERE m.user_id=? {NEWEST_FIRST}"))
        .bind(user_id)
        .fetch_all(db_pool)
        .await?)
}

/// Newest messages in rooms whose topic name contains `q`, ignoring case.
pub async fn recent(db_pool: &SqlitePool, q: &str, limit: Option<i64>) -> AppResult<Vec<Message>> {
    Ok(sqlx::query_as(&format!(
        "{SELECT_MESSAGES}
         JOIN topics t ON t.id = r.topic_id
         WHERE instr(lower(t.name), lower(?)) > 0
         {NEWEST_FIRST}
         LIMIT ?"
    ))
    .bind(q)
    .bind(limit.unwrap_or(-1))
    .fetch_all(db_pool)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, topics::Topic, users::User};

    #[tokio::test]
    async fn deleting_a_room_takes_its_messages() {
        let db_pool = db::memory().await.unwrap();
        let user = User::create(&db_pool, "alice", "password123").await.unwrap();
        let (topic, _) = Topic::get_or_create(&db_pool, "Rust").await.unwrap();
        let doomed = Room::create(&db_pool, user.id, &topic, "doomed", "").await.unwrap();
        let kept = Room::create(&db_pool, user.id, &topic, "kept", "").await.unwrap();

        Message::create(&db_pool, doomed, user.id, "one").await.unwrap();
        Message::create(&db_pool, doomed, user.id, "two").await.unwrap();
        Message::create(&db_pool, kept, user.id, "three").await.unwrap();

        let room = Room::get(&db_pool, doomed).await.unwrap().unwrap();
        room.add_participant(&db_pool, user.id).await.unwrap();
        room.delete(&db_pool).await.unwrap();

        assert!(in_room(&db_pool, doomed).await.unwrap().is_empty());
        assert_eq!(by_user(&db_pool, user.id).await.unwrap().len(), 1);

        let (participants,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM room_participants")
            .fetch_one(&db_pool)
            .await
            .unwrap();
        assert_eq!(participants, 0);
    }

    #[tokio::test]
    async fn recent_is_newest_first_and_filtered_by_topic() {
        let db_pool = db::memory().await.unwrap();
        let user = User::create(&db_pool, "alice", "password123").await.unwrap();
        let (python, _) = Topic::get_or_create(&db_pool, "Python").await.unwrap();
        let (rust, _) = Topic::get_or_create(&db_pool, "Rust").await.unwrap();
        let snakes = Room::create(&db_pool, user.id, &python, "snakes", "").await.unwrap();
        let crabs = Room::create(&db_pool, user.id, &rust, "crabs", "").await.unwrap();

        for i in 0..4 {
            Message::create(&db_pool, snakes, user.id, &format!("hiss {i}")).await.unwrap();
            Message::create(&db_pool, crabs, user.id, &format!("click {i}")).await.unwrap();
        }

        let bodies: Vec<String> = recent(&db_pool, "", Some(5))
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.body)
            .collect();
        assert_eq!(bodies, ["click 3", "hiss 3", "click 2", "hiss 2", "click 1"]);

        let filtered = recent(&db_pool, "pYtH", None).await.unwrap();
        assert_eq!(filtered.len(), 4);
        assert!(filtered.iter().all(|m| m.room_name == "snakes"));
    }

    #[tokio::test]
    async fn posting_stores_the_message_and_the_participant_together() {
        let db_pool = db::memory().await.unwrap();
        let host = User::create(&db_pool, "host", "password123").await.unwrap();
        let guest = User::create(&db_pool, "guest", "password123").await.unwrap();
        let (topic, _) = Topic::get_or_create(&db_pool, "Rust").await.unwrap();
        let room_id = Room::create(&db_pool, host.id, &topic, "crabs", "").await.unwrap();
        let room = Room::get(&db_pool, room_id).await.unwrap().unwrap();

        let (_, joined) = Message::post(&db_pool, &room, guest.id, "hello").await.unwrap();
        assert!(joined);
        let (_, joined) = Message::post(&db_pool, &room, guest.id, "again").await.unwrap();
        assert!(!joined);
        assert_eq!(in_room(&db_pool, room_id).await.unwrap().len(), 2);
        assert_eq!(room.participants(&db_pool).await.unwrap().len(), 1);

        // unknown author: the insert fails and nothing is left behind
        assert!(Message::post(&db_pool, &room, Uuid::now_v7(), "ghost").await.is_err());
        assert_eq!(in_room(&db_pool, room_id).await.unwrap().len(), 2);
        assert_eq!(room.participants(&db_pool).await.unwrap().len(), 1);
    }
}

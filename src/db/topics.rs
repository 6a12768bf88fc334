use sqlx::SqlitePool;
use uuid::Uuid;

use crate::AppResult;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Topic {
    pub id: Uuid,
    pub name: String,
}

/// A topic together with how many rooms file under it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopicSummary {
    pub id: Uuid,
    pub name: String,
    pub room_count: i64,
}

impl Topic {
    /// Looks the topic up by name, inserting it first if it is new.
    /// The flag is true when this call created it.
    pub async fn get_or_create(db_pool: &SqlitePool, name: &str) -> AppResult<(Topic, bool)> {
        let created = sqlx::query("INSERT INTO topics (id,name) VALUES (?,?) ON CONFLICT(name) DO NOTHING")
            .bind(Uuid::now_v7())
            .bind(name)
            .execute(db_pool)
            .await?
            .rows_affected()
            == 1;

        let topic = sqlx::query_as("SELECT id,name FROM topics WHERE name=?")
            .bind(name)
            .fetch_one(db_pool)
            .await?;

        Ok((topic, created))
    }
}

/// Topics whose name contains `q`, ignoring case, ordered by name.
pub async fn search(db_pool: &SqlitePool, q: &str, limit: Option<i64>) -> AppResult<Vec<TopicSummary>> {
    Ok(sqlx::query_as(
        "SELECT t.id, t.name, COUNT(r.id) AS room_count
         FROM topics t LEFT JOIN rooms r ON r.topic_id = t.id
         WHERE instr(lower(t.name), lower(?)) > 0
         GROUP BY t.id, t.name
         ORDER BY t.name
         LIMIT ?",
    )
    .bind(q)
    .bind(limit.unwrap_or(-1))
    .fetch_all(db_pool)
    .await?)
}

pub async fn all(db_pool: &SqlitePool) -> AppResult<Vec<TopicSummary>> {
    search(db_pool, "", None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let db_pool = db::memory().await.unwrap();

        let (first, created) = Topic::get_or_create(&db_pool, "Python").await.unwrap();
        assert!(created);
        let (second, created) = Topic::get_or_create(&db_pool, "Python").await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);

        assert_eq!(all(&db_pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn search_ignores_case_and_limits() {
        let db_pool = db::memory().await.unwrap();
        for name in ["Python", "Django", "JavaScript", "pytest"] {
            Topic::get_or_create(&db_pool, name).await.unwrap();
        }

        let names: Vec<String> = search(&db_pool, "PY", None)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, ["Python", "pytest"]);

        assert_eq!(search(&db_pool, "", Some(2)).await.unwrap().len(), 2);
        assert_eq!(search(&db_pool, "", None).await.unwrap()[0].room_count, 0);
    }
}

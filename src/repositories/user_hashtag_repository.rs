use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;

use crate::error::AppResult;
use crate::models::Hashtag;

#[async_trait]
pub trait UserHashtagRepository: Send + Sync {
    /// Drop the user's subscriptions and subscribe to `tag_names` instead,
    /// creating hashtags that do not exist yet
    async fn replace_for_user(
        &self,
        user_id: i64,
        tag_names: &[String],
        now: i64,
    ) -> AppResult<Vec<Hashtag>>;
    async fn find_hashtags_by_user(&self, user_id: i64) -> AppResult<Vec<Hashtag>>;
}

pub struct SqliteUserHashtagRepository {
    pool: SqlitePool,
}

impl SqliteUserHashtagRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserHashtagRepository for SqliteUserHashtagRepository {
    async fn replace_for_user(
        &self,
        user_id: i64,
        tag_names: &[String],
        now: i64,
    ) -> AppResult<Vec<Hashtag>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_hashtag WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for tag_name in tag_names {
            sqlx::query(
                "INSERT INTO hashtag (tag_name, posting_count, created_at) VALUES (?, 0, ?) \
                 ON CONFLICT(tag_name) DO NOTHING",
            )
            .bind(tag_name)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "INSERT OR IGNORE INTO user_hashtag (user_id, hashtag_id) \
                 SELECT ?, id FROM hashtag WHERE tag_name = ?",
            )
            .bind(user_id)
            .bind(tag_name)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        self.find_hashtags_by_user(user_id).await
    }

    async fn find_hashtags_by_user(&self, user_id: i64) -> AppResult<Vec<Hashtag>> {
        let hashtags = sqlx::query_as::<_, Hashtag>(
            "SELECT h.id, h.tag_name, h.posting_count, h.created_at \
             FROM user_hashtag uh JOIN hashtag h ON h.id = uh.hashtag_id \
             WHERE uh.user_id = ? ORDER BY uh.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(hashtags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::Database;

    async fn insert_user(db: &Database, nickname: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (nickname, created_at) VALUES (?, 0) RETURNING id",
        )
        .bind(nickname)
        .fetch_one(db.pool())
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_replace_for_user_swaps_subscriptions() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = SqliteUserHashtagRepository::new(db.pool().clone());
        let user_id = insert_user(&db, "subscriber").await;

        let first = repo
            .replace_for_user(user_id, &["love".to_string(), "work".to_string()], 1)
            .await
            .unwrap();
        assert_eq!(first.len(), 2);

        let second = repo
            .replace_for_user(user_id, &["study".to_string()], 2)
            .await
            .unwrap();
        let names: Vec<String> = second.into_iter().map(|h| h.tag_name).collect();
        assert_eq!(names, vec!["study"]);

        // Hashtags themselves survive unsubscription
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM hashtag")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(total, 3);
    }
}

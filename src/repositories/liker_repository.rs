use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::debug;

use crate::error::AppResult;
use crate::models::LikeToggle;

#[async_trait]
pub trait LikerRepository: Send + Sync {
    /// Flip the user's like on a comment. The join row, the comment counter and
    /// the post counter change in one transaction; the comment counter is
    /// re-derived from the join rows. `None` if the comment does not exist.
    async fn toggle(&self, comment_id: i64, user_id: i64, now: i64) -> AppResult<Option<LikeToggle>>;
}

pub struct SqliteLikerRepository {
    pool: SqlitePool,
}

impl SqliteLikerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikerRepository for SqliteLikerRepository {
    async fn toggle(&self, comment_id: i64, user_id: i64, now: i64) -> AppResult<Option<LikeToggle>> {
        let mut tx = self.pool.begin().await?;

        // Write first so the transaction holds the write lock before any read
        let removed = sqlx::query("DELETE FROM liker WHERE comment_id = ? AND user_id = ?")
            .bind(comment_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let row = sqlx::query("SELECT post_id, likes FROM comment WHERE id = ?")
            .bind(comment_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let post_id: i64 = row.get("post_id");
        let previous_likes: i64 = row.get("likes");

        let liked = removed == 0;
        if liked {
            sqlx::query("INSERT INTO liker (comment_id, user_id, created_at) VALUES (?, ?, ?)")
                .bind(comment_id)
                .bind(user_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        let likes = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM liker WHERE comment_id = ?")
            .bind(comment_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE comment SET likes = ? WHERE id = ?")
            .bind(likes)
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE post SET likes = MAX(likes + ?, 0) WHERE id = ?")
            .bind(likes - previous_likes)
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(
            "Comment {} like toggled by user {}: liked={} likes={}",
            comment_id, user_id, liked, likes
        );

        Ok(Some(LikeToggle {
            comment_id,
            liked,
            likes,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::Database;
    use std::sync::Arc;

    async fn seed_comment(db: &Database, fans: usize) -> (i64, i64, Vec<i64>) {
        let pool = db.pool();
        let author = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (nickname, created_at) VALUES ('author', 0) RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        let post_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO post (user_id, title, content, tag_name, created_at, updated_at) \
             VALUES (?, 't', 'c', 'tag', 0, 0) RETURNING id",
        )
        .bind(author)
        .fetch_one(pool)
        .await
        .unwrap();
        let comment_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO comment (post_id, user_id, content, created_at, updated_at) \
             VALUES (?, ?, 'hi', 0, 0) RETURNING id",
        )
        .bind(post_id)
        .bind(author)
        .fetch_one(pool)
        .await
        .unwrap();

        let mut fan_ids = Vec::with_capacity(fans);
        for i in 0..fans {
            let id = sqlx::query_scalar::<_, i64>(
                "INSERT INTO users (nickname, created_at) VALUES (?, 0) RETURNING id",
            )
            .bind(format!("fan{}", i))
            .fetch_one(pool)
            .await
            .unwrap();
            fan_ids.push(id);
        }
        (post_id, comment_id, fan_ids)
    }

    async fn likes_of(db: &Database, table: &str, id: i64) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT likes FROM {} WHERE id = ?", table))
            .bind(id)
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_counts() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = SqliteLikerRepository::new(db.pool().clone());
        let (post_id, comment_id, fans) = seed_comment(&db, 1).await;

        let on = repo.toggle(comment_id, fans[0], 1).await.unwrap().unwrap();
        assert!(on.liked);
        assert_eq!(on.likes, 1);
        assert_eq!(likes_of(&db, "post", post_id).await, 1);

        let off = repo.toggle(comment_id, fans[0], 2).await.unwrap().unwrap();
        assert!(!off.liked);
        assert_eq!(off.likes, 0);
        assert_eq!(likes_of(&db, "post", post_id).await, 0);

        assert!(repo.toggle(9999, fans[0], 3).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggles_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}/likes.db", dir.path().display());
        let db = Database::connect(&url).await.unwrap();
        db.initialize().await.unwrap();

        let (post_id, comment_id, fans) = seed_comment(&db, 30).await;
        let repo = Arc::new(SqliteLikerRepository::new(db.pool().clone()));

        let handles: Vec<_> = fans
            .iter()
            .map(|&fan| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.toggle(comment_id, fan, 1).await })
            })
            .collect();

        for handle in handles {
            let toggled = handle.await.unwrap().unwrap().unwrap();
            assert!(toggled.liked);
        }

        assert_eq!(likes_of(&db, "comment", comment_id).await, 30);
        assert_eq!(likes_of(&db, "post", post_id).await, 30);
    }
}

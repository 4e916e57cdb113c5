use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use crate::error::AppResult;
use crate::models::{Comment, NewComment, Page, PageRequest};

const COMMENT_COLUMNS: &str = "id, post_id, user_id, content, likes, created_at, updated_at";

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert the comment, bump the post's comment count and award the author a point
    async fn insert(&self, comment: NewComment, now: i64) -> AppResult<Comment>;
    async fn update_content(&self, id: i64, content: &str, now: i64) -> AppResult<Option<Comment>>;
    /// Delete the comment and take its count and likes off the post
    async fn delete(&self, id: i64) -> AppResult<bool>;
    /// Oldest first
    async fn find_page_by_post(&self, post_id: i64, page: PageRequest) -> AppResult<Page<Comment>>;
    /// Newest first
    async fn find_all_by_user(&self, user_id: i64) -> AppResult<Vec<Comment>>;
}

pub struct SqliteCommentRepository {
    pool: SqlitePool,
}

impl SqliteCommentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for SqliteCommentRepository {
    async fn insert(&self, comment: NewComment, now: i64) -> AppResult<Comment> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Comment>(&format!(
            "INSERT INTO comment (post_id, user_id, content, likes, created_at, updated_at) \
             VALUES (?, ?, ?, 0, ?, ?) RETURNING {}",
            COMMENT_COLUMNS
        ))
        .bind(comment.post_id)
        .bind(comment.user_id)
        .bind(comment.content)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE post SET comment_count = comment_count + 1 WHERE id = ?")
            .bind(created.post_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE users SET points = points + 1 WHERE id = ?")
            .bind(created.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn update_content(&self, id: i64, content: &str, now: i64) -> AppResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "UPDATE comment SET content = ?, updated_at = ? WHERE id = ? RETURNING {}",
            COMMENT_COLUMNS
        ))
        .bind(content)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("DELETE FROM comment WHERE id = ? RETURNING post_id, likes")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Ok(false);
        };
        let post_id: i64 = row.get("post_id");
        let likes: i64 = row.get("likes");

        sqlx::query(
            "UPDATE post SET comment_count = MAX(comment_count - 1, 0), \
             likes = MAX(likes - ?, 0) WHERE id = ?",
        )
        .bind(likes)
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn find_page_by_post(&self, post_id: i64, page: PageRequest) -> AppResult<Page<Comment>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comment WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        let content = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comment WHERE post_id = ? \
             ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?",
            COMMENT_COLUMNS
        ))
        .bind(post_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(content, page, total))
    }

    async fn find_all_by_user(&self, user_id: i64) -> AppResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comment WHERE user_id = ? ORDER BY created_at DESC, id DESC",
            COMMENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }
}

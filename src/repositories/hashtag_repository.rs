use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;

use crate::error::AppResult;
use crate::models::{Hashtag, Page, PageRequest};

pub(crate) const HASHTAG_COLUMNS: &str = "id, tag_name, posting_count, created_at";

#[async_trait]
pub trait HashtagRepository: Send + Sync {
    /// Look the tag up, inserting it with a zero count if it is new
    async fn find_or_create(&self, tag_name: &str, now: i64) -> AppResult<Hashtag>;
    /// Most used tags first
    async fn find_top(&self, limit: i64) -> AppResult<Vec<Hashtag>>;
    async fn find_page(&self, page: PageRequest) -> AppResult<Page<Hashtag>>;
}

pub struct SqliteHashtagRepository {
    pool: SqlitePool,
}

impl SqliteHashtagRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HashtagRepository for SqliteHashtagRepository {
    async fn find_or_create(&self, tag_name: &str, now: i64) -> AppResult<Hashtag> {
        sqlx::query(
            "INSERT INTO hashtag (tag_name, posting_count, created_at) VALUES (?, 0, ?) \
             ON CONFLICT(tag_name) DO NOTHING",
        )
        .bind(tag_name)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let hashtag = sqlx::query_as::<_, Hashtag>(&format!(
            "SELECT {} FROM hashtag WHERE tag_name = ?",
            HASHTAG_COLUMNS
        ))
        .bind(tag_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(hashtag)
    }

    async fn find_top(&self, limit: i64) -> AppResult<Vec<Hashtag>> {
        let hashtags = sqlx::query_as::<_, Hashtag>(&format!(
            "SELECT {} FROM hashtag ORDER BY posting_count DESC, id ASC LIMIT ?",
            HASHTAG_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(hashtags)
    }

    async fn find_page(&self, page: PageRequest) -> AppResult<Page<Hashtag>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM hashtag")
            .fetch_one(&self.pool)
            .await?;

        let content = sqlx::query_as::<_, Hashtag>(&format!(
            "SELECT {} FROM hashtag ORDER BY posting_count DESC, id ASC LIMIT ? OFFSET ?",
            HASHTAG_COLUMNS
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(content, page, total))
    }
}

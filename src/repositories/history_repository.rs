use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;

use super::post_repository::HISTORY_COLUMNS;
use crate::error::AppResult;
use crate::models::{History, Page, PageRequest};

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<History>>;
    /// Most recently archived first
    async fn find_page(&self, page: PageRequest) -> AppResult<Page<History>>;
    async fn find_page_by_user(&self, user_id: i64, page: PageRequest) -> AppResult<Page<History>>;
}

pub struct SqliteHistoryRepository {
    pool: SqlitePool,
}

impl SqliteHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryRepository for SqliteHistoryRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<History>> {
        let history = sqlx::query_as::<_, History>(&format!(
            "SELECT {} FROM history WHERE id = ?",
            HISTORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(history)
    }

    async fn find_page(&self, page: PageRequest) -> AppResult<Page<History>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM history")
            .fetch_one(&self.pool)
            .await?;

        let content = sqlx::query_as::<_, History>(&format!(
            "SELECT {} FROM history ORDER BY archived_at DESC, id DESC LIMIT ? OFFSET ?",
            HISTORY_COLUMNS
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(content, page, total))
    }

    async fn find_page_by_user(&self, user_id: i64, page: PageRequest) -> AppResult<Page<History>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM history WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let content = sqlx::query_as::<_, History>(&format!(
            "SELECT {} FROM history WHERE user_id = ? \
             ORDER BY archived_at DESC, id DESC LIMIT ? OFFSET ?",
            HISTORY_COLUMNS
        ))
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(content, page, total))
    }
}

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{History, Page, PageRequest},
    repositories::HistoryRepository,
};

/// Read access to archived posts
#[derive(Clone)]
pub struct HistoryService {
    histories: Arc<dyn HistoryRepository>,
}

impl HistoryService {
    pub fn new(histories: Arc<dyn HistoryRepository>) -> Self {
        Self { histories }
    }

    pub async fn get_history(&self, id: i64) -> AppResult<History> {
        self.histories
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("History {} not found", id)))
    }

    pub async fn list_history(&self, page_num: u32) -> AppResult<Page<History>> {
        self.histories.find_page(PageRequest::of(page_num)).await
    }

    pub async fn history_by_user(&self, user_id: i64, page_num: u32) -> AppResult<Page<History>> {
        self.histories
            .find_page_by_user(user_id, PageRequest::of(page_num))
            .await
    }
}

use std::sync::Arc;
use tracing::info;

use crate::{
    error::{AppError, AppResult},
    infrastructure::clock::Clock,
    models::{Hashtag, Page, PageRequest},
    repositories::HashtagRepository,
};

const MAX_TAG_LEN: usize = 30;

/// Trim whitespace and a leading `#`, rejecting empty or overlong tags
pub fn normalize_tag_name(raw: &str) -> AppResult<String> {
    let tag = raw.trim().trim_start_matches('#').trim();
    if tag.is_empty() {
        return Err(AppError::Validation("Hashtag must not be empty".to_string()));
    }
    if tag.chars().count() > MAX_TAG_LEN {
        return Err(AppError::Validation(format!(
            "Hashtag longer than {} characters",
            MAX_TAG_LEN
        )));
    }
    Ok(tag.to_string())
}

#[derive(Clone)]
pub struct HashtagService {
    hashtags: Arc<dyn HashtagRepository>,
    clock: Arc<dyn Clock>,
}

impl HashtagService {
    pub fn new(hashtags: Arc<dyn HashtagRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { hashtags, clock }
    }

    /// Register a hashtag, returning the existing one if already known
    pub async fn register(&self, raw_tag: &str) -> AppResult<Hashtag> {
        let tag_name = normalize_tag_name(raw_tag)?;
        let hashtag = self
            .hashtags
            .find_or_create(&tag_name, self.clock.now_millis())
            .await?;
        info!("Hashtag registered: {} (id {})", hashtag.tag_name, hashtag.id);
        Ok(hashtag)
    }

    pub async fn list(&self, page_num: u32) -> AppResult<Page<Hashtag>> {
        self.hashtags.find_page(PageRequest::of(page_num)).await
    }
}

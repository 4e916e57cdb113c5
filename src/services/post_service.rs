// PostService - feeds, post CRUD and the freshness/archival policy

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    error::{AppError, AppResult},
    infrastructure::clock::Clock,
    models::{
        api_models::{HomeResponse, PostSaveRequest},
        Hashtag, NewPost, Page, PageRequest, Post, PostChanges, PostSort,
    },
    repositories::{
        HashtagRepository, HistoryRepository, PostRepository, UserHashtagRepository,
        UserRepository,
    },
    services::hashtag_service::normalize_tag_name,
};

/// A post is archived once it is this old (24 hours)
pub const ARCHIVE_AFTER_SECS: i64 = 86_400;
const ARCHIVE_AFTER_MILLIS: i64 = ARCHIVE_AFTER_SECS * 1000;

pub const TRENDING_HASHTAGS: i64 = 12;
pub const STORY_CANDIDATES: i64 = 13;
pub const STORY_LIMIT: usize = 10;
pub const MAIN_CANDIDATES: u32 = 15;
pub const MAIN_SIZE: usize = 3;

/// Tag names that mean "every post" on the home feed
const ALL_TAGS: [&str; 2] = ["all", "전체"];

const MAX_TITLE_LEN: usize = 100;

pub fn is_expired(created_at: i64, now: i64) -> bool {
    now - created_at >= ARCHIVE_AFTER_MILLIS
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    histories: Arc<dyn HistoryRepository>,
    hashtags: Arc<dyn HashtagRepository>,
    users: Arc<dyn UserRepository>,
    user_hashtags: Arc<dyn UserHashtagRepository>,
    clock: Arc<dyn Clock>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        histories: Arc<dyn HistoryRepository>,
        hashtags: Arc<dyn HashtagRepository>,
        users: Arc<dyn UserRepository>,
        user_hashtags: Arc<dyn UserHashtagRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            posts,
            histories,
            hashtags,
            users,
            user_hashtags,
            clock,
        }
    }

    /// Create when `post_id` is absent or -1, update otherwise
    pub async fn save(&self, request: PostSaveRequest) -> AppResult<Post> {
        match request.post_id {
            None | Some(-1) => {
                self.create(NewPost {
                    user_id: request.user_id,
                    title: request.title,
                    content: request.content,
                    tag_name: request.tag_name,
                    image_path: request.image_path,
                })
                .await
            }
            Some(id) => {
                self.update(
                    id,
                    PostChanges {
                        title: request.title,
                        content: request.content,
                        tag_name: request.tag_name,
                        image_path: request.image_path,
                    },
                )
                .await
            }
        }
    }

    pub async fn create(&self, mut post: NewPost) -> AppResult<Post> {
        validate_text(&post.title, &post.content)?;
        post.tag_name = normalize_tag_name(&post.tag_name)?;

        if self.users.find_by_id(post.user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", post.user_id)));
        }

        let created = self.posts.insert(post, self.clock.now_millis()).await?;
        info!("Post {} created by user {}", created.id, created.user_id);
        Ok(created)
    }

    pub async fn update(&self, id: i64, mut changes: PostChanges) -> AppResult<Post> {
        validate_text(&changes.title, &changes.content)?;
        changes.tag_name = normalize_tag_name(&changes.tag_name)?;

        self.posts
            .update(id, changes, self.clock.now_millis())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.posts.delete(id).await? {
            return Err(AppError::NotFound(format!("Post {} not found", id)));
        }
        info!("Post {} deleted", id);
        Ok(())
    }

    /// Detail view: counts a hit, then applies the archival check.
    /// The post is still returned on the read that archives it.
    pub async fn get_post(&self, id: i64) -> AppResult<Post> {
        if !self.posts.increment_hits(id).await? {
            return Err(self.missing_post(id).await?);
        }

        let post = match self.posts.find_by_id(id).await? {
            Some(post) => post,
            None => return Err(self.missing_post(id).await?),
        };

        self.archive_if_expired(&post).await?;
        Ok(post)
    }

    async fn missing_post(&self, id: i64) -> AppResult<AppError> {
        if self.histories.find_by_id(id).await?.is_some() {
            Ok(AppError::NotFound(format!("Post {} has been archived", id)))
        } else {
            Ok(AppError::NotFound(format!("Post {} not found", id)))
        }
    }

    /// Move `post` into history if it outlived the freshness window.
    /// Returns whether this call archived it.
    pub async fn archive_if_expired(&self, post: &Post) -> AppResult<bool> {
        let now = self.clock.now_millis();
        if !is_expired(post.created_at, now) {
            return Ok(false);
        }

        let archived = self.posts.archive(post.id, now).await?.is_some();
        if archived {
            info!("Post {} archived to history", post.id);
        }
        Ok(archived)
    }

    /// Archive every expired post. Returns how many were moved.
    pub async fn archive_expired(&self) -> AppResult<usize> {
        let now = self.clock.now_millis();
        let ids = self
            .posts
            .find_ids_created_before(now - ARCHIVE_AFTER_MILLIS)
            .await?;

        let mut archived = 0;
        for id in ids {
            if self.posts.archive(id, now).await?.is_some() {
                archived += 1;
            }
        }
        Ok(archived)
    }

    pub async fn list_posts(&self, page_num: u32, sort: PostSort) -> AppResult<Page<Post>> {
        self.posts.find_page(PageRequest::of(page_num), sort).await
    }

    pub async fn home_by_tag(&self, tag: &str, page_num: u32) -> AppResult<Page<Post>> {
        let page = PageRequest::of(page_num);
        if ALL_TAGS.contains(&tag.trim()) {
            return self.posts.find_page(page, PostSort::Latest).await;
        }
        let tag_name = normalize_tag_name(tag)?;
        self.posts.find_page_by_tag(&tag_name, page).await
    }

    pub async fn search(&self, keyword: &str, page_num: u32) -> AppResult<Page<Post>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(AppError::Validation("Search keyword must not be empty".to_string()));
        }
        self.posts.search(keyword, PageRequest::of(page_num)).await
    }

    pub async fn posts_by_user(&self, user_id: i64, page_num: u32) -> AppResult<Page<Post>> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }
        self.posts
            .find_page_by_user(user_id, PageRequest::of(page_num))
            .await
    }

    pub async fn trending_hashtags(&self) -> AppResult<Vec<Hashtag>> {
        self.hashtags.find_top(TRENDING_HASHTAGS).await
    }

    /// Oldest still-active posts. Expired candidates are archived on the way.
    pub async fn story(&self) -> AppResult<Vec<Post>> {
        let candidates = self.posts.find_oldest(STORY_CANDIDATES).await?;
        let mut story = Vec::with_capacity(STORY_LIMIT);

        for post in candidates {
            if self.archive_if_expired(&post).await? {
                continue;
            }
            story.push(post);
            if story.len() >= STORY_LIMIT {
                break;
            }
        }

        debug!("Story assembled with {} posts", story.len());
        Ok(story)
    }

    pub async fn home(&self) -> AppResult<HomeResponse> {
        let (hashtags, story) = futures::try_join!(self.trending_hashtags(), self.story())?;
        Ok(HomeResponse { hashtags, story })
    }

    /// Three featured posts from the top hits. Posts tagged with one of the
    /// viewer's hashtags come first, the rest are filled in by hit order.
    pub async fn main_view(&self, user_id: Option<i64>) -> AppResult<Vec<Post>> {
        let candidates = self
            .posts
            .find_page(PageRequest::new(0, MAIN_CANDIDATES), PostSort::Hits)
            .await?
            .content;

        let user_id = match user_id {
            Some(id) if id != -1 => id,
            _ => return Ok(candidates.into_iter().take(MAIN_SIZE).collect()),
        };

        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        let subscribed: HashSet<String> = self
            .user_hashtags
            .find_hashtags_by_user(user_id)
            .await?
            .into_iter()
            .map(|h| h.tag_name)
            .collect();

        Ok(prioritize_subscribed(candidates, &subscribed))
    }
}

fn prioritize_subscribed(candidates: Vec<Post>, subscribed: &HashSet<String>) -> Vec<Post> {
    let (preferred, rest): (Vec<Post>, Vec<Post>) = candidates
        .into_iter()
        .partition(|post| subscribed.contains(&post.tag_name));

    preferred.into_iter().chain(rest).take(MAIN_SIZE).collect()
}

fn validate_text(title: &str, content: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("Title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "Title longer than {} characters",
            MAX_TITLE_LEN
        )));
    }
    if content.trim().is_empty() {
        return Err(AppError::Validation("Content must not be empty".to_string()));
    }
    Ok(())
}

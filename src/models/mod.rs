// Domain rows and pagination types shared by repositories, services and the API

pub mod api_models;

use serde::{Deserialize, Serialize};

/// Default page size for feeds, search and per-user listings
pub const PAGE_SIZE: u32 = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub age_range: i64,
    pub points: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Hashtag {
    pub id: i64,
    pub tag_name: String,
    pub posting_count: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub tag_name: String,
    pub image_path: Option<String>,
    pub hits: i64,
    pub likes: i64,
    pub comment_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A post that outlived the freshness window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct History {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub tag_name: String,
    pub image_path: Option<String>,
    pub hits: i64,
    pub likes: i64,
    pub comment_count: i64,
    pub created_at: i64,
    pub archived_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    pub likes: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub nickname: String,
    pub profile_image: Option<String>,
    pub age_range: i64,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub nickname: Option<String>,
    pub profile_image: Option<String>,
    pub age_range: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub tag_name: String,
    pub image_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub tag_name: String,
    pub image_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
}

/// Outcome of flipping a like on a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggle {
    pub comment_id: i64,
    pub liked: bool,
    pub likes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostSort {
    #[default]
    Latest,
    Hits,
}

impl PostSort {
    pub fn order_by(&self) -> &'static str {
        match self {
            PostSort::Latest => " ORDER BY created_at DESC, id DESC",
            PostSort::Hits => " ORDER BY hits DESC, id DESC",
        }
    }
}

/// Zero-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_num: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page_num: u32, page_size: u32) -> Self {
        Self {
            page_num,
            page_size: page_size.max(1),
        }
    }

    pub fn of(page_num: u32) -> Self {
        Self::new(page_num, PAGE_SIZE)
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }

    pub fn offset(&self) -> i64 {
        self.page_num as i64 * self.page_size as i64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page_num: u32,
    pub page_size: u32,
    pub total_elements: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: i64) -> Self {
        Self {
            content,
            page_num: request.page_num,
            page_size: request.page_size,
            total_elements,
        }
    }
}

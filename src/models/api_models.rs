use serde::{Deserialize, Serialize};

use super::{Hashtag, Post, PostSort, User};

#[derive(Debug, Deserialize)]
pub struct PostSaveRequest {
    /// Absent or -1 creates a new post
    pub post_id: Option<i64>,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub tag_name: String,
    pub image_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page_num: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    pub page_num: Option<u32>,
    #[serde(default)]
    pub sort: PostSort,
}

#[derive(Debug, Default, Deserialize)]
pub struct MainViewQuery {
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CommentSaveRequest {
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentUpdateRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct LikeQuery {
    pub comment_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UserRegisterRequest {
    pub nickname: String,
    pub profile_image: Option<String>,
    pub age_range: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UserUpdateRequest {
    pub user_id: i64,
    pub nickname: Option<String>,
    pub profile_image: Option<String>,
    pub age_range: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UserHashtagRequest {
    pub hashtags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TagNameQuery {
    pub tag_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub age_range: i64,
    pub points: i64,
    pub hashtags: Vec<String>,
    pub created_at: i64,
}

impl UserResponse {
    pub fn new(user: User, hashtags: Vec<Hashtag>) -> Self {
        Self {
            id: user.id,
            nickname: user.nickname,
            profile_image: user.profile_image,
            age_range: user.age_range,
            points: user.points,
            hashtags: hashtags.into_iter().map(|h| h.tag_name).collect(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicknameCheckResponse {
    pub nickname: String,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeResponse {
    pub hashtags: Vec<Hashtag>,
    pub story: Vec<Post>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUploadResponse {
    pub img_path: String,
    pub status: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashtagIdResponse {
    pub id: i64,
    pub tag_name: String,
}

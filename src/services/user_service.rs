use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use crate::{
    error::{AppError, AppResult},
    infrastructure::clock::Clock,
    models::{
        api_models::{NicknameCheckResponse, UserResponse},
        NewUser, User, UserChanges,
    },
    repositories::{UserHashtagRepository, UserRepository},
    services::hashtag_service::normalize_tag_name,
};

/// Letters, digits and underscore; 2 to 12 characters
static NICKNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{N}_]{2,12}$").expect("nickname pattern is valid"));

pub fn is_valid_nickname(nickname: &str) -> bool {
    NICKNAME_PATTERN.is_match(nickname)
}

fn validate_nickname(nickname: &str) -> AppResult<()> {
    if is_valid_nickname(nickname) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Nickname '{}' must be 2-12 letters, digits or underscores",
            nickname
        )))
    }
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    user_hashtags: Arc<dyn UserHashtagRepository>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        user_hashtags: Arc<dyn UserHashtagRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            user_hashtags,
            clock,
        }
    }

    pub async fn register(
        &self,
        nickname: &str,
        profile_image: Option<String>,
        age_range: Option<i64>,
    ) -> AppResult<UserResponse> {
        let nickname = nickname.trim();
        validate_nickname(nickname)?;

        if self.users.count_by_nickname(nickname).await? > 0 {
            return Err(AppError::Conflict(format!("Nickname '{}' is already taken", nickname)));
        }

        let user = self
            .users
            .insert(
                NewUser {
                    nickname: nickname.to_string(),
                    profile_image,
                    age_range: age_range.unwrap_or(0),
                },
                self.clock.now_millis(),
            )
            .await?;

        info!("User {} registered as {}", user.id, user.nickname);
        Ok(UserResponse::new(user, Vec::new()))
    }

    /// Availability answer for the sign-up form. Malformed nicknames are
    /// reported as unavailable rather than rejected.
    pub async fn check_nickname(&self, nickname: &str) -> AppResult<NicknameCheckResponse> {
        let nickname = nickname.trim();
        let available =
            is_valid_nickname(nickname) && self.users.count_by_nickname(nickname).await? == 0;
        Ok(NicknameCheckResponse {
            nickname: nickname.to_string(),
            available,
        })
    }

    pub async fn get_user(&self, id: i64) -> AppResult<UserResponse> {
        let user = self.find_user(id).await?;
        let hashtags = self.user_hashtags.find_hashtags_by_user(id).await?;
        Ok(UserResponse::new(user, hashtags))
    }

    pub async fn update_profile(&self, id: i64, mut changes: UserChanges) -> AppResult<UserResponse> {
        let current = self.find_user(id).await?;

        if let Some(nickname) = changes.nickname.take() {
            let nickname = nickname.trim().to_string();
            if nickname != current.nickname {
                validate_nickname(&nickname)?;
                if self.users.count_by_nickname_excluding(&nickname, id).await? > 0 {
                    return Err(AppError::Conflict(format!(
                        "Nickname '{}' is already taken",
                        nickname
                    )));
                }
            }
            changes.nickname = Some(nickname);
        }

        let user = self
            .users
            .update(id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        let hashtags = self.user_hashtags.find_hashtags_by_user(id).await?;
        Ok(UserResponse::new(user, hashtags))
    }

    /// Replace the user's hashtag subscriptions. Blank entries are skipped
    /// and repeats collapse to one subscription.
    pub async fn update_hashtags(&self, id: i64, tags: Vec<String>) -> AppResult<UserResponse> {
        let user = self.find_user(id).await?;

        let mut seen = HashSet::new();
        let mut tag_names = Vec::with_capacity(tags.len());
        for raw in tags {
            if raw.trim().trim_start_matches('#').trim().is_empty() {
                continue;
            }
            let tag = normalize_tag_name(&raw)?;
            if seen.insert(tag.clone()) {
                tag_names.push(tag);
            }
        }

        let hashtags = self
            .user_hashtags
            .replace_for_user(id, &tag_names, self.clock.now_millis())
            .await?;
        info!("User {} now follows {} hashtags", id, hashtags.len());
        Ok(UserResponse::new(user, hashtags))
    }

    pub async fn set_profile_image(&self, id: i64, image_path: String) -> AppResult<UserResponse> {
        self.update_profile(
            id,
            UserChanges {
                profile_image: Some(image_path),
                ..UserChanges::default()
            },
        )
        .await
    }

    async fn find_user(&self, id: i64) -> AppResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }
}

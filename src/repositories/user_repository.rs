use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;

use crate::error::AppResult;
use crate::models::{NewUser, User, UserChanges};

const USER_COLUMNS: &str = "id, nickname, profile_image, age_range, points, created_at";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: NewUser, now: i64) -> AppResult<User>;
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;
    async fn count_by_nickname(&self, nickname: &str) -> AppResult<i64>;
    /// Same as `count_by_nickname` but ignores the given user's own row
    async fn count_by_nickname_excluding(&self, nickname: &str, user_id: i64) -> AppResult<i64>;
    /// Apply the non-empty fields of `changes`; `None` when the user does not exist
    async fn update(&self, id: i64, changes: UserChanges) -> AppResult<Option<User>>;
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn insert(&self, user: NewUser, now: i64) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (nickname, profile_image, age_range, points, created_at) \
             VALUES (?, ?, ?, 0, ?) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user.nickname)
        .bind(user.profile_image)
        .bind(user.age_range)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn count_by_nickname(&self, nickname: &str) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE nickname = ?")
            .bind(nickname)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_by_nickname_excluding(&self, nickname: &str, user_id: i64) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE nickname = ? AND id <> ?",
        )
        .bind(nickname)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
                nickname = COALESCE(?, nickname), \
                profile_image = COALESCE(?, profile_image), \
                age_range = COALESCE(?, age_range) \
             WHERE id = ? RETURNING {}",
            USER_COLUMNS
        ))
        .bind(changes.nickname)
        .bind(changes.profile_image)
        .bind(changes.age_range)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::infrastructure::database::Database;

    fn new_user(nickname: &str) -> NewUser {
        NewUser {
            nickname: nickname.to_string(),
            profile_image: None,
            age_range: 20,
        }
    }

    #[tokio::test]
    async fn test_insert_and_count_nickname() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = SqliteUserRepository::new(db.pool().clone());

        let user = repo.insert(new_user("abc"), 1_000).await.unwrap();
        assert_eq!(user.points, 0);
        assert_eq!(repo.count_by_nickname("abc").await.unwrap(), 1);
        assert_eq!(repo.count_by_nickname("xyz").await.unwrap(), 0);
        assert_eq!(
            repo.count_by_nickname_excluding("abc", user.id).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_duplicate_nickname_is_conflict() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = SqliteUserRepository::new(db.pool().clone());

        repo.insert(new_user("dup"), 1).await.unwrap();
        let err = repo.insert(new_user("dup"), 2).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = SqliteUserRepository::new(db.pool().clone());
        let user = repo.insert(new_user("before"), 1).await.unwrap();

        let updated = repo
            .update(
                user.id,
                UserChanges {
                    age_range: Some(30),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.nickname, "before");
        assert_eq!(updated.age_range, 30);

        assert!(repo.update(999, UserChanges::default()).await.unwrap().is_none());
    }
}

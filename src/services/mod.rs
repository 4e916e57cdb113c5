// Service layer - business rules on top of the repositories

pub mod archive_sweeper;
pub mod comment_service;
pub mod hashtag_service;
pub mod history_service;
pub mod image_service;
pub mod post_service;
pub mod user_service;

pub use archive_sweeper::ArchiveSweeper;
pub use comment_service::CommentService;
pub use hashtag_service::HashtagService;
pub use history_service::HistoryService;
pub use image_service::ImageService;
pub use post_service::PostService;
pub use user_service::UserService;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use tempfile::TempDir;

    use crate::{
        app_state::AppState,
        config::Config,
        infrastructure::{clock::ManualClock, database::Database, image_store::LocalImageStore},
        models::{Comment, NewComment, NewPost, Post},
    };

    /// 2024-01-01T00:00:00Z
    pub const START_MILLIS: i64 = 1_704_067_200_000;

    /// Fully wired state over an in-memory database and a manual clock
    pub struct TestContext {
        pub state: AppState,
        pub clock: Arc<ManualClock>,
        pub _uploads: TempDir,
    }

    impl TestContext {
        pub async fn new() -> Self {
            let uploads = tempfile::tempdir().unwrap();
            let mut config = Config::default();
            config.uploads.dir = uploads.path().to_string_lossy().into_owned();

            let database = Database::connect_in_memory().await.unwrap();
            let clock = Arc::new(ManualClock::new(START_MILLIS));
            let store = Arc::new(LocalImageStore::new(uploads.path()));
            let state = AppState::with_parts(database, clock.clone(), store, config).unwrap();

            Self {
                state,
                clock,
                _uploads: uploads,
            }
        }

        pub async fn user(&self, nickname: &str) -> crate::models::api_models::UserResponse {
            self.state.users.register(nickname, None, None).await.unwrap()
        }

        pub async fn post(&self, user_id: i64, title: &str, tag: &str) -> Post {
            self.state
                .posts
                .create(NewPost {
                    user_id,
                    title: title.to_string(),
                    content: format!("{} content", title),
                    tag_name: tag.to_string(),
                    image_path: None,
                })
                .await
                .unwrap()
        }

        pub async fn comment(&self, post_id: i64, user_id: i64, content: &str) -> Comment {
            self.state
                .comments
                .create(NewComment {
                    post_id,
                    user_id,
                    content: content.to_string(),
                })
                .await
                .unwrap()
        }

        /// Read a post without counting a hit
        pub async fn reload_post(&self, id: i64) -> Post {
            sqlx::query_as::<_, Post>(
                "SELECT id, user_id, title, content, tag_name, image_path, hits, likes, \
                 comment_count, created_at, updated_at FROM post WHERE id = ?",
            )
            .bind(id)
            .fetch_one(self.state.database.pool())
            .await
            .unwrap()
        }

        pub async fn set_hits(&self, id: i64, hits: i64) {
            sqlx::query("UPDATE post SET hits = ? WHERE id = ?")
                .bind(hits)
                .bind(id)
                .execute(self.state.database.pool())
                .await
                .unwrap();
        }
    }
}

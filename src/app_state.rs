use std::sync::Arc;

use crate::{
    config::Config,
    error::AppResult,
    infrastructure::{
        clock::{Clock, SystemClock},
        database::Database,
        image_store::{ImageStore, LocalImageStore},
    },
    repositories::{
        SqliteCommentRepository, SqliteHashtagRepository, SqliteHistoryRepository,
        SqliteLikerRepository, SqlitePostRepository, SqliteUserHashtagRepository,
        SqliteUserRepository,
    },
    services::{
        CommentService, HashtagService, HistoryService, ImageService, PostService, UserService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub database: Database,
    pub posts: PostService,
    pub histories: HistoryService,
    pub comments: CommentService,
    pub users: UserService,
    pub hashtags: HashtagService,
    pub images: ImageService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Initialize database
        let database = Database::connect(&config.database.url).await?;
        database.initialize().await?;

        let store = Arc::new(LocalImageStore::new(&config.uploads.dir));
        let state = Self::with_parts(database, Arc::new(SystemClock), store, config)?;
        Ok(state)
    }

    /// Wire repositories and services over an already initialized database
    pub fn with_parts(
        database: Database,
        clock: Arc<dyn Clock>,
        image_store: Arc<dyn ImageStore>,
        config: Config,
    ) -> AppResult<Self> {
        let pool = database.pool().clone();

        let users = Arc::new(SqliteUserRepository::new(pool.clone()));
        let hashtags = Arc::new(SqliteHashtagRepository::new(pool.clone()));
        let user_hashtags = Arc::new(SqliteUserHashtagRepository::new(pool.clone()));
        let posts = Arc::new(SqlitePostRepository::new(pool.clone()));
        let histories = Arc::new(SqliteHistoryRepository::new(pool.clone()));
        let comments = Arc::new(SqliteCommentRepository::new(pool.clone()));
        let likers = Arc::new(SqliteLikerRepository::new(pool));

        let images = ImageService::new(
            image_store,
            clock.clone(),
            &config.uploads.public_path,
            config.uploads.utc_offset_hours,
        )?;

        Ok(Self {
            posts: PostService::new(
                posts.clone(),
                histories.clone(),
                hashtags.clone(),
                users.clone(),
                user_hashtags.clone(),
                clock.clone(),
            ),
            histories: HistoryService::new(histories),
            comments: CommentService::new(comments, likers, posts, users.clone(), clock.clone()),
            users: UserService::new(users, user_hashtags, clock.clone()),
            hashtags: HashtagService::new(hashtags, clock),
            images,
            database,
            config,
        })
    }
}

// ArchiveSweeper - periodically moves expired posts into history

use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::services::post_service::PostService;

pub struct ArchiveSweeper {
    posts: PostService,
    interval: Duration,
}

impl ArchiveSweeper {
    pub fn new(posts: PostService, interval: Duration) -> Self {
        Self { posts, interval }
    }

    /// One sweep. Returns the number of posts archived.
    pub async fn run_once(&self) -> AppResult<usize> {
        let archived = self.posts.archive_expired().await?;
        if archived > 0 {
            info!("Archive sweep moved {} posts to history", archived);
        }
        Ok(archived)
    }

    /// Start the background sweep loop. A failed sweep is logged and the
    /// loop carries on with the next tick.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                if let Err(e) = self.run_once().await {
                    warn!("Archive sweep failed: {}", e);
                }
            }
        })
    }
}

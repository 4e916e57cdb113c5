// Image storage - where uploaded post and profile images end up

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use crate::error::{AppError, AppResult};

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist `bytes` under `file_name`. The name is already sanitised.
    async fn store(&self, file_name: &str, bytes: &[u8]) -> AppResult<()>;
}

/// Writes images into a directory on local disk
pub struct LocalImageStore {
    dir: PathBuf,
}

impl LocalImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> AppResult<()> {
        if file_name.contains(['/', '\\']) || file_name.starts_with('.') {
            return Err(AppError::Validation(format!(
                "Invalid file name: {}",
                file_name
            )));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let target = self.dir.join(file_name);
        tokio::fs::write(&target, bytes).await?;
        info!("Image uploaded : {}", target.display());
        Ok(())
    }
}

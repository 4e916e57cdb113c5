use chrono::{DateTime, FixedOffset, TimeZone};
use std::path::Path;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    infrastructure::{clock::Clock, image_store::ImageStore},
};

const TIMESTAMP_FORMAT: &str = "%y%m%d%H%M%S";

/// `<base><yyMMddHHmmss><.ext>` for an uploaded file. The base is the last
/// path component without its extension; the extension is lowercased.
pub fn timestamped_file_name(original: &str, at: DateTime<FixedOffset>) -> String {
    let file_name = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let path = Path::new(file_name);

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .trim_start_matches('.');
    let base = if stem.is_empty() { "image" } else { stem };

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();

    format!("{}{}{}", base, at.format(TIMESTAMP_FORMAT), extension)
}

#[derive(Clone)]
pub struct ImageService {
    store: Arc<dyn ImageStore>,
    clock: Arc<dyn Clock>,
    public_path: String,
    offset: FixedOffset,
}

impl ImageService {
    pub fn new(
        store: Arc<dyn ImageStore>,
        clock: Arc<dyn Clock>,
        public_path: &str,
        utc_offset_hours: i32,
    ) -> AppResult<Self> {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600).ok_or_else(|| {
            AppError::Internal(format!("Invalid UTC offset: {} hours", utc_offset_hours))
        })?;

        Ok(Self {
            store,
            clock,
            public_path: public_path.trim_end_matches('/').to_string(),
            offset,
        })
    }

    /// Store an uploaded image and return the public path it is served from.
    /// An empty payload stores nothing and yields an empty path.
    pub async fn upload(&self, original_name: Option<&str>, bytes: &[u8]) -> AppResult<String> {
        if bytes.is_empty() {
            return Ok(String::new());
        }

        let now = self
            .offset
            .timestamp_millis_opt(self.clock.now_millis())
            .single()
            .ok_or_else(|| AppError::Internal("Clock out of range".to_string()))?;

        let file_name = timestamped_file_name(original_name.unwrap_or_default(), now);
        self.store.store(&file_name, bytes).await?;

        Ok(format!("{}/{}", self.public_path, file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{clock::ManualClock, image_store::LocalImageStore};

    fn seoul(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(y, mo, d, h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_timestamped_file_name() {
        let at = seoul(2024, 3, 5, 14, 7, 9);
        assert_eq!(timestamped_file_name("cat.PNG", at), "cat240305140709.png");
        assert_eq!(
            timestamped_file_name("C:\\photos\\my.dog.jpg", at),
            "my.dog240305140709.jpg"
        );
        assert_eq!(timestamped_file_name("noext", at), "noext240305140709");
        assert_eq!(timestamped_file_name("", at), "image240305140709");
        assert_eq!(timestamped_file_name("../.hidden", at), "hidden240305140709");
    }

    #[tokio::test]
    async fn test_upload_uses_local_offset() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalImageStore::new(dir.path()));
        // 2024-03-05T05:07:09Z is 14:07:09 in Seoul
        let clock = Arc::new(ManualClock::new(1_709_615_229_000));
        let service = ImageService::new(store, clock, "/files/", 9).unwrap();

        let path = service.upload(Some("photo.JPG"), b"jpeg").await.unwrap();
        assert_eq!(path, "/files/photo240305140709.jpg");
        assert!(dir.path().join("photo240305140709.jpg").exists());
    }

    #[tokio::test]
    async fn test_empty_upload_yields_empty_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalImageStore::new(dir.path()));
        let clock = Arc::new(ManualClock::new(0));
        let service = ImageService::new(store, clock, "/files", 9).unwrap();

        assert_eq!(service.upload(Some("a.png"), b"").await.unwrap(), "");
    }
}

use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub uploads: UploadConfig,
    pub archive: ArchiveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory uploaded images are written to.
    pub dir: String,
    /// URL prefix the directory is served under.
    pub public_path: String,
    /// Offset from UTC used when stamping file names (Asia/Seoul by default).
    pub utc_offset_hours: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Seconds between archive sweeps, 0 disables the sweeper.
    pub sweep_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let utc_offset_hours: i32 = parse_var("UTC_OFFSET_HOURS", 9)?;
        if !(-23..=23).contains(&utc_offset_hours) {
            anyhow::bail!("UTC_OFFSET_HOURS out of range: {}", utc_offset_hours);
        }

        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:data/harugomin.db".to_string()),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("SERVER_PORT", 3000)?,
            },
            uploads: UploadConfig {
                dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "data/files".to_string()),
                public_path: env::var("UPLOAD_PUBLIC_PATH")
                    .unwrap_or_else(|_| "/files".to_string()),
                utc_offset_hours,
            },
            archive: ArchiveConfig {
                sweep_interval_secs: parse_var("ARCHIVE_SWEEP_INTERVAL_SECS", 600)?,
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            uploads: UploadConfig {
                dir: "data/files".to_string(),
                public_path: "/files".to_string(),
                utc_offset_hours: 9,
            },
            archive: ArchiveConfig {
                sweep_interval_secs: 0,
            },
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {}={:?}: {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}

// Core infrastructure modules
pub mod clock;       // Wall clock abstraction
pub mod database;    // SQLite pool and schema
pub mod image_store; // Uploaded image persistence

pub use clock::{Clock, ManualClock, SystemClock};
pub use database::Database;
pub use image_store::{ImageStore, LocalImageStore};

// Harugomin - worry-sharing backend

// HTTP surface - axum routers and handlers
pub mod api;

// Application wiring - repositories and services built once at startup
pub mod app_state;
pub mod config;

// Infrastructure - SQLite pool, clock, image storage
pub mod infrastructure;

// Entities, page types and request/response bodies
pub mod models;

// Repositories - one trait per table group, SQLite implementations
pub mod repositories;

// Business rules - feeds, archival, likes, users
pub mod services;

// Common utilities
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};

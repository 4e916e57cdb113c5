// Repository layer - one trait per entity, SQLite implementations behind Arc<dyn ...>

pub mod comment_repository;
pub mod hashtag_repository;
pub mod history_repository;
pub mod liker_repository;
pub mod post_repository;
pub mod user_hashtag_repository;
pub mod user_repository;

pub use comment_repository::{CommentRepository, SqliteCommentRepository};
pub use hashtag_repository::{HashtagRepository, SqliteHashtagRepository};
pub use history_repository::{HistoryRepository, SqliteHistoryRepository};
pub use liker_repository::{LikerRepository, SqliteLikerRepository};
pub use post_repository::{PostRepository, SqlitePostRepository};
pub use user_hashtag_repository::{SqliteUserHashtagRepository, UserHashtagRepository};
pub use user_repository::{SqliteUserRepository, UserRepository};

/// Escape `%`, `_` and `\` so user input matches literally inside LIKE ... ESCAPE '\'
pub(crate) fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

use std::sync::Arc;
use tracing::info;

use crate::{
    error::{AppError, AppResult},
    infrastructure::clock::Clock,
    models::{Comment, LikeToggle, NewComment, Page, PageRequest},
    repositories::{CommentRepository, LikerRepository, PostRepository, UserRepository},
};

const MAX_COMMENT_LEN: usize = 500;

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    likers: Arc<dyn LikerRepository>,
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        likers: Arc<dyn LikerRepository>,
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            comments,
            likers,
            posts,
            users,
            clock,
        }
    }

    /// Comment on a post. The author earns one point per comment.
    pub async fn create(&self, mut comment: NewComment) -> AppResult<Comment> {
        validate_content(&comment.content)?;
        comment.content = comment.content.trim().to_string();

        if self.posts.find_by_id(comment.post_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Post {} not found", comment.post_id)));
        }
        self.require_user(comment.user_id).await?;

        let created = self.comments.insert(comment, self.clock.now_millis()).await?;
        info!("Comment {} added to post {}", created.id, created.post_id);
        Ok(created)
    }

    pub async fn update(&self, id: i64, content: &str) -> AppResult<Comment> {
        validate_content(content)?;
        self.comments
            .update_content(id, content.trim(), self.clock.now_millis())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", id)))
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.comments.delete(id).await? {
            return Err(AppError::NotFound(format!("Comment {} not found", id)));
        }
        info!("Comment {} deleted", id);
        Ok(())
    }

    pub async fn toggle_like(&self, comment_id: i64, user_id: i64) -> AppResult<LikeToggle> {
        self.require_user(user_id).await?;
        self.likers
            .toggle(comment_id, user_id, self.clock.now_millis())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", comment_id)))
    }

    pub async fn comments_for_post(&self, post_id: i64, page_num: u32) -> AppResult<Page<Comment>> {
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Post {} not found", post_id)));
        }
        self.comments
            .find_page_by_post(post_id, PageRequest::of(page_num))
            .await
    }

    pub async fn comments_by_user(&self, user_id: i64) -> AppResult<Vec<Comment>> {
        self.require_user(user_id).await?;
        self.comments.find_all_by_user(user_id).await
    }

    async fn require_user(&self, user_id: i64) -> AppResult<()> {
        match self.users.find_by_id(user_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("User {} not found", user_id))),
        }
    }
}

fn validate_content(content: &str) -> AppResult<()> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("Comment must not be empty".to_string()));
    }
    if content.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::Validation(format!(
            "Comment longer than {} characters",
            MAX_COMMENT_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::TestContext;

    #[tokio::test]
    async fn test_like_toggle_twice_restores_counts() {
        let ctx = TestContext::new().await;
        let author = ctx.user("author").await;
        let fan = ctx.user("fan").await;
        let post = ctx.post(author.id, "worry", "tag").await;
        let comment = ctx.comment(post.id, author.id, "cheer up").await;

        let liked = ctx.state.comments.toggle_like(comment.id, fan.id).await.unwrap();
        assert!(liked.liked);
        assert_eq!(liked.likes, 1);
        assert_eq!(ctx.reload_post(post.id).await.likes, 1);

        let unliked = ctx.state.comments.toggle_like(comment.id, fan.id).await.unwrap();
        assert!(!unliked.liked);
        assert_eq!(unliked.likes, 0);
        assert_eq!(ctx.reload_post(post.id).await.likes, 0);
    }

    #[tokio::test]
    async fn test_post_likes_sum_comment_likes() {
        let ctx = TestContext::new().await;
        let author = ctx.user("author").await;
        let a = ctx.user("fan_a").await;
        let b = ctx.user("fan_b").await;
        let post = ctx.post(author.id, "worry", "tag").await;
        let first = ctx.comment(post.id, author.id, "one").await;
        let second = ctx.comment(post.id, author.id, "two").await;

        ctx.state.comments.toggle_like(first.id, a.id).await.unwrap();
        ctx.state.comments.toggle_like(first.id, b.id).await.unwrap();
        ctx.state.comments.toggle_like(second.id, a.id).await.unwrap();
        assert_eq!(ctx.reload_post(post.id).await.likes, 3);

        ctx.state.comments.delete(first.id).await.unwrap();
        let post = ctx.reload_post(post.id).await;
        assert_eq!(post.likes, 1);
        assert_eq!(post.comment_count, 1);
    }

    #[tokio::test]
    async fn test_toggle_like_unknown_targets() {
        let ctx = TestContext::new().await;
        let user = ctx.user("someone").await;

        let err = ctx.state.comments.toggle_like(404, user.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let post = ctx.post(user.id, "worry", "tag").await;
        let comment = ctx.comment(post.id, user.id, "hi").await;
        let err = ctx.state.comments.toggle_like(comment.id, 404).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_counts_and_awards_point() {
        let ctx = TestContext::new().await;
        let author = ctx.user("author").await;
        let replier = ctx.user("replier").await;
        let post = ctx.post(author.id, "worry", "tag").await;

        ctx.comment(post.id, replier.id, "first").await;
        ctx.comment(post.id, replier.id, "second").await;

        assert_eq!(ctx.reload_post(post.id).await.comment_count, 2);
        let replier = ctx.state.users.get_user(replier.id).await.unwrap();
        assert_eq!(replier.points, 2);

        let page = ctx.state.comments.comments_for_post(post.id, 0).await.unwrap();
        assert_eq!(page.total_elements, 2);
        assert_eq!(page.content[0].content, "first");

        let mine = ctx.state.comments.comments_by_user(replier.id).await.unwrap();
        assert_eq!(mine[0].content, "second");
    }

    #[tokio::test]
    async fn test_create_rejects_blank_and_missing_post() {
        let ctx = TestContext::new().await;
        let user = ctx.user("someone").await;
        let post = ctx.post(user.id, "worry", "tag").await;

        let blank = ctx
            .state
            .comments
            .create(NewComment {
                post_id: post.id,
                user_id: user.id,
                content: "   ".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(blank, AppError::Validation(_)));

        let missing = ctx
            .state
            .comments
            .create(NewComment {
                post_id: 999,
                user_id: user.id,
                content: "hello".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_comment() {
        let ctx = TestContext::new().await;
        let user = ctx.user("someone").await;
        let post = ctx.post(user.id, "worry", "tag").await;
        let comment = ctx.comment(post.id, user.id, "draft").await;

        let padded = ctx.comment(post.id, user.id, "  spaced out \n").await;
        assert_eq!(padded.content, "spaced out");

        let updated = ctx.state.comments.update(comment.id, " final ").await.unwrap();
        assert_eq!(updated.content, "final");
        assert!(ctx.state.comments.update(999, "x").await.is_err());
    }
}

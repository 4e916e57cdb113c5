use async_trait::async_trait;
use sqlx::sqlite::{Sqlite, SqliteConnection, SqlitePool};
use sqlx::QueryBuilder;

use super::escape_like;
use crate::error::AppResult;
use crate::models::{History, NewPost, Page, PageRequest, Post, PostChanges, PostSort};

pub(crate) const POST_COLUMNS: &str = "id, user_id, title, content, tag_name, image_path, \
     hits, likes, comment_count, created_at, updated_at";

pub(crate) const HISTORY_COLUMNS: &str = "id, user_id, title, content, tag_name, image_path, \
     hits, likes, comment_count, created_at, archived_at";

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert the post and count it against its hashtag
    async fn insert(&self, post: NewPost, now: i64) -> AppResult<Post>;
    /// Overwrite a post's editable fields, moving the hashtag count if the tag changed
    async fn update(&self, id: i64, changes: PostChanges, now: i64) -> AppResult<Option<Post>>;
    /// Delete a post with its comments and likes; `false` if it did not exist
    async fn delete(&self, id: i64) -> AppResult<bool>;
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Post>>;
    async fn increment_hits(&self, id: i64) -> AppResult<bool>;
    async fn find_page(&self, page: PageRequest, sort: PostSort) -> AppResult<Page<Post>>;
    async fn find_page_by_tag(&self, tag_name: &str, page: PageRequest) -> AppResult<Page<Post>>;
    /// Substring match on title or content, newest first
    async fn search(&self, keyword: &str, page: PageRequest) -> AppResult<Page<Post>>;
    async fn find_page_by_user(&self, user_id: i64, page: PageRequest) -> AppResult<Page<Post>>;
    /// Oldest posts first
    async fn find_oldest(&self, limit: i64) -> AppResult<Vec<Post>>;
    async fn find_ids_created_before(&self, cutoff: i64) -> AppResult<Vec<i64>>;
    /// Move a post into history. `None` if the post is already gone.
    async fn archive(&self, id: i64, archived_at: i64) -> AppResult<Option<History>>;
}

enum PostFilter<'a> {
    All,
    Tag(&'a str),
    Keyword(&'a str),
    User(i64),
}

fn push_filter<'args>(qb: &mut QueryBuilder<'args, Sqlite>, filter: &PostFilter<'args>) {
    match filter {
        PostFilter::All => {}
        PostFilter::Tag(tag_name) => {
            qb.push(" WHERE tag_name = ").push_bind(*tag_name);
        }
        PostFilter::Keyword(keyword) => {
            let pattern = format!("%{}%", escape_like(keyword));
            qb.push(" WHERE (title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR content LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        PostFilter::User(user_id) => {
            qb.push(" WHERE user_id = ").push_bind(*user_id);
        }
    }
}

async fn bump_hashtag(conn: &mut SqliteConnection, tag_name: &str, now: i64) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO hashtag (tag_name, posting_count, created_at) VALUES (?, 1, ?) \
         ON CONFLICT(tag_name) DO UPDATE SET posting_count = posting_count + 1",
    )
    .bind(tag_name)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

async fn drop_hashtag(conn: &mut SqliteConnection, tag_name: &str) -> AppResult<()> {
    sqlx::query("UPDATE hashtag SET posting_count = MAX(posting_count - 1, 0) WHERE tag_name = ?")
        .bind(tag_name)
        .execute(conn)
        .await?;
    Ok(())
}

pub struct SqlitePostRepository {
    pool: SqlitePool,
}

impl SqlitePostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_page(
        &self,
        filter: PostFilter<'_>,
        page: PageRequest,
        sort: PostSort,
    ) -> AppResult<Page<Post>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM post");
        push_filter(&mut count_qb, &filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM post", POST_COLUMNS));
        push_filter(&mut qb, &filter);
        qb.push(sort.order_by());
        qb.push(" LIMIT ").push_bind(page.limit());
        qb.push(" OFFSET ").push_bind(page.offset());

        let content = qb
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(content, page, total))
    }
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    async fn insert(&self, post: NewPost, now: i64) -> AppResult<Post> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Post>(&format!(
            "INSERT INTO post (user_id, title, content, tag_name, image_path, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {}",
            POST_COLUMNS
        ))
        .bind(post.user_id)
        .bind(post.title)
        .bind(post.content)
        .bind(&post.tag_name)
        .bind(post.image_path)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        bump_hashtag(&mut *tx, &post.tag_name, now).await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn update(&self, id: i64, changes: PostChanges, now: i64) -> AppResult<Option<Post>> {
        let mut tx = self.pool.begin().await?;

        // Touch the row first: takes the write lock and reads the tag being replaced
        let previous_tag = sqlx::query_scalar::<_, String>(
            "UPDATE post SET updated_at = ? WHERE id = ? RETURNING tag_name",
        )
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(previous_tag) = previous_tag else {
            return Ok(None);
        };

        let updated = sqlx::query_as::<_, Post>(&format!(
            "UPDATE post SET title = ?, content = ?, tag_name = ?, \
             image_path = COALESCE(?, image_path), updated_at = ? \
             WHERE id = ? RETURNING {}",
            POST_COLUMNS
        ))
        .bind(changes.title)
        .bind(changes.content)
        .bind(&changes.tag_name)
        .bind(changes.image_path)
        .bind(now)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if previous_tag != changes.tag_name {
            drop_hashtag(&mut *tx, &previous_tag).await?;
            bump_hashtag(&mut *tx, &changes.tag_name, now).await?;
        }

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        // comment and liker rows go with it through ON DELETE CASCADE
        let tag_name =
            sqlx::query_scalar::<_, String>("DELETE FROM post WHERE id = ? RETURNING tag_name")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(tag_name) = tag_name else {
            return Ok(false);
        };
        drop_hashtag(&mut *tx, &tag_name).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM post WHERE id = ?",
            POST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn increment_hits(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("UPDATE post SET hits = hits + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_page(&self, page: PageRequest, sort: PostSort) -> AppResult<Page<Post>> {
        self.fetch_page(PostFilter::All, page, sort).await
    }

    async fn find_page_by_tag(&self, tag_name: &str, page: PageRequest) -> AppResult<Page<Post>> {
        self.fetch_page(PostFilter::Tag(tag_name), page, PostSort::Latest)
            .await
    }

    async fn search(&self, keyword: &str, page: PageRequest) -> AppResult<Page<Post>> {
        self.fetch_page(PostFilter::Keyword(keyword), page, PostSort::Latest)
            .await
    }

    async fn find_page_by_user(&self, user_id: i64, page: PageRequest) -> AppResult<Page<Post>> {
        self.fetch_page(PostFilter::User(user_id), page, PostSort::Latest)
            .await
    }

    async fn find_oldest(&self, limit: i64) -> AppResult<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM post ORDER BY created_at ASC, id ASC LIMIT ?",
            POST_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn find_ids_created_before(&self, cutoff: i64) -> AppResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM post WHERE created_at <= ? ORDER BY created_at ASC, id ASC",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn archive(&self, id: i64, archived_at: i64) -> AppResult<Option<History>> {
        let mut tx = self.pool.begin().await?;

        let history = sqlx::query_as::<_, History>(&format!(
            "INSERT INTO history (id, user_id, title, content, tag_name, image_path, \
                 hits, likes, comment_count, created_at, archived_at) \
             SELECT id, user_id, title, content, tag_name, image_path, \
                 hits, likes, comment_count, created_at, ? \
             FROM post WHERE id = ? RETURNING {}",
            HISTORY_COLUMNS
        ))
        .bind(archived_at)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(history) = history else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM post WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::Database;

    async fn setup() -> (Database, SqlitePostRepository, i64) {
        let db = Database::connect_in_memory().await.unwrap();
        let user_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (nickname, created_at) VALUES ('writer', 0) RETURNING id",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        let repo = SqlitePostRepository::new(db.pool().clone());
        (db, repo, user_id)
    }

    fn new_post(user_id: i64, title: &str, content: &str, tag: &str) -> NewPost {
        NewPost {
            user_id,
            title: title.to_string(),
            content: content.to_string(),
            tag_name: tag.to_string(),
            image_path: None,
        }
    }

    async fn posting_count(db: &Database, tag: &str) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT posting_count FROM hashtag WHERE tag_name = ?")
            .bind(tag)
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_hashtag_count_follows_post_lifecycle() {
        let (db, repo, user_id) = setup().await;

        let post = repo.insert(new_post(user_id, "t", "c", "work"), 10).await.unwrap();
        repo.insert(new_post(user_id, "t2", "c2", "work"), 11).await.unwrap();
        assert_eq!(posting_count(&db, "work").await, 2);

        let changes = PostChanges {
            title: "t".into(),
            content: "c".into(),
            tag_name: "love".into(),
            image_path: None,
        };
        repo.update(post.id, changes, 12).await.unwrap().unwrap();
        assert_eq!(posting_count(&db, "work").await, 1);
        assert_eq!(posting_count(&db, "love").await, 1);

        assert!(repo.delete(post.id).await.unwrap());
        assert!(!repo.delete(post.id).await.unwrap());
        assert_eq!(posting_count(&db, "love").await, 0);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let (_db, repo, user_id) = setup().await;
        repo.insert(new_post(user_id, "100% tired", "body", "life"), 1).await.unwrap();
        repo.insert(new_post(user_id, "100 tired", "body", "life"), 2).await.unwrap();

        let page = repo.search("100%", PageRequest::of(0)).await.unwrap();
        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content[0].title, "100% tired");
    }

    #[tokio::test]
    async fn test_find_page_sort_orders() {
        let (db, repo, user_id) = setup().await;
        let a = repo.insert(new_post(user_id, "a", "x", "t"), 1).await.unwrap();
        let b = repo.insert(new_post(user_id, "b", "x", "t"), 2).await.unwrap();
        sqlx::query("UPDATE post SET hits = 9 WHERE id = ?")
            .bind(a.id)
            .execute(db.pool())
            .await
            .unwrap();

        let latest = repo.find_page(PageRequest::of(0), PostSort::Latest).await.unwrap();
        assert_eq!(latest.content[0].id, b.id);
        let by_hits = repo.find_page(PageRequest::of(0), PostSort::Hits).await.unwrap();
        assert_eq!(by_hits.content[0].id, a.id);
    }

    #[tokio::test]
    async fn test_archive_moves_row_once() {
        let (_db, repo, user_id) = setup().await;
        let post = repo.insert(new_post(user_id, "old", "x", "t"), 1).await.unwrap();

        let history = repo.archive(post.id, 500).await.unwrap().unwrap();
        assert_eq!(history.id, post.id);
        assert_eq!(history.archived_at, 500);
        assert!(repo.find_by_id(post.id).await.unwrap().is_none());
        assert!(repo.archive(post.id, 600).await.unwrap().is_none());
    }
}

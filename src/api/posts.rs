use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use crate::{
    api::{
        extract::{AppJson, AppPath, AppQuery},
        read_file_field,
    },
    app_state::AppState,
    error::AppResult,
    models::{
        api_models::{
            HomeResponse, ImageUploadResponse, ListPostsQuery, MainViewQuery, PageQuery,
            PostSaveRequest,
        },
        Comment, Hashtag, History, Page, Post,
    },
};

pub async fn save_post_handler(
    State(state): State<AppState>,
    AppJson(req): AppJson<PostSaveRequest>,
) -> AppResult<Json<Post>> {
    let post = state.posts.save(req).await?;
    Ok(Json(post))
}

pub async fn list_posts_handler(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListPostsQuery>,
) -> AppResult<Json<Page<Post>>> {
    let page = state
        .posts
        .list_posts(params.page_num.unwrap_or(0), params.sort)
        .await?;
    Ok(Json(page))
}

pub async fn get_post_handler(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Post>> {
    Ok(Json(state.posts.get_post(id).await?))
}

pub async fn delete_post_handler(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Value>> {
    state.posts.delete(id).await?;
    Ok(Json(json!({"id": id, "deleted": true})))
}

pub async fn post_comments_handler(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppQuery(params): AppQuery<PageQuery>,
) -> AppResult<Json<Page<Comment>>> {
    let page = state
        .comments
        .comments_for_post(id, params.page_num.unwrap_or(0))
        .await?;
    Ok(Json(page))
}

pub async fn home_handler(State(state): State<AppState>) -> AppResult<Json<HomeResponse>> {
    Ok(Json(state.posts.home().await?))
}

pub async fn trending_hashtags_handler(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Hashtag>>> {
    Ok(Json(state.posts.trending_hashtags().await?))
}

pub async fn story_handler(State(state): State<AppState>) -> AppResult<Json<Vec<Post>>> {
    Ok(Json(state.posts.story().await?))
}

pub async fn home_by_tag_handler(
    State(state): State<AppState>,
    AppPath(tag): AppPath<String>,
    AppQuery(params): AppQuery<PageQuery>,
) -> AppResult<Json<Page<Post>>> {
    let page = state
        .posts
        .home_by_tag(&tag, params.page_num.unwrap_or(0))
        .await?;
    Ok(Json(page))
}

pub async fn search_handler(
    State(state): State<AppState>,
    AppPath(keyword): AppPath<String>,
    AppQuery(params): AppQuery<PageQuery>,
) -> AppResult<Json<Page<Post>>> {
    let page = state
        .posts
        .search(&keyword, params.page_num.unwrap_or(0))
        .await?;
    Ok(Json(page))
}

pub async fn main_view_handler(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<MainViewQuery>,
) -> AppResult<Json<Vec<Post>>> {
    Ok(Json(state.posts.main_view(params.user_id).await?))
}

pub async fn upload_image_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ImageUploadResponse>> {
    let (file_name, bytes) = read_file_field(multipart?, "files").await?;
    let img_path = state.images.upload(file_name.as_deref(), &bytes).await?;
    Ok(Json(ImageUploadResponse {
        img_path,
        status: 200,
    }))
}

pub async fn list_history_handler(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<PageQuery>,
) -> AppResult<Json<Page<History>>> {
    let page = state
        .histories
        .list_history(params.page_num.unwrap_or(0))
        .await?;
    Ok(Json(page))
}

pub async fn get_history_handler(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<History>> {
    Ok(Json(state.histories.get_history(id).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(save_post_handler).get(list_posts_handler))
        .route("/{id}", get(get_post_handler).delete(delete_post_handler))
        .route("/{id}/comments", get(post_comments_handler))
        // Home feed
        .route("/home", get(home_handler))
        .route("/home/hashtag", get(trending_hashtags_handler))
        .route("/home/story", get(story_handler))
        .route("/home/{tag}", get(home_by_tag_handler))
        .route("/search/{keyword}", get(search_handler))
        .route("/main", get(main_view_handler))
        .route("/image", post(upload_image_handler))
}

pub fn history_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_history_handler))
        .route("/{id}", get(get_history_handler))
}

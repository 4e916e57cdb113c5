use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::Json,
    routing::{get, post, put},
    Router,
};

use crate::{
    api::{
        extract::{AppJson, AppPath, AppQuery},
        read_file_field,
    },
    app_state::AppState,
    error::{AppError, AppResult},
    models::{
        api_models::{
            NicknameCheckResponse, PageQuery, UserHashtagRequest, UserRegisterRequest,
            UserResponse, UserUpdateRequest,
        },
        Comment, History, Page, Post, UserChanges,
    },
};

pub async fn register_handler(
    State(state): State<AppState>,
    AppJson(req): AppJson<UserRegisterRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .users
        .register(&req.nickname, req.profile_image, req.age_range)
        .await?;
    Ok(Json(user))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<UserResponse>> {
    Ok(Json(state.users.get_user(id).await?))
}

pub async fn update_user_handler(
    State(state): State<AppState>,
    AppJson(req): AppJson<UserUpdateRequest>,
) -> AppResult<Json<UserResponse>> {
    let changes = UserChanges {
        nickname: req.nickname,
        profile_image: req.profile_image,
        age_range: req.age_range,
    };
    Ok(Json(state.users.update_profile(req.user_id, changes).await?))
}

pub async fn update_hashtags_handler(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<UserHashtagRequest>,
) -> AppResult<Json<UserResponse>> {
    Ok(Json(state.users.update_hashtags(id, req.hashtags).await?))
}

pub async fn profile_image_handler(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<UserResponse>> {
    // Fail before touching the disk when the user is unknown
    state.users.get_user(id).await?;

    let (file_name, bytes) = read_file_field(multipart?, "file").await?;
    let path = state.images.upload(file_name.as_deref(), &bytes).await?;
    if path.is_empty() {
        return Err(AppError::Validation("Profile image is empty".to_string()));
    }
    Ok(Json(state.users.set_profile_image(id, path).await?))
}

pub async fn check_nickname_handler(
    State(state): State<AppState>,
    AppPath(nickname): AppPath<String>,
) -> AppResult<Json<NicknameCheckResponse>> {
    Ok(Json(state.users.check_nickname(&nickname).await?))
}

pub async fn user_posts_handler(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppQuery(params): AppQuery<PageQuery>,
) -> AppResult<Json<Page<Post>>> {
    let page = state
        .posts
        .posts_by_user(id, params.page_num.unwrap_or(0))
        .await?;
    Ok(Json(page))
}

pub async fn user_comments_handler(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Vec<Comment>>> {
    Ok(Json(state.comments.comments_by_user(id).await?))
}

pub async fn user_histories_handler(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppQuery(params): AppQuery<PageQuery>,
) -> AppResult<Json<Page<History>>> {
    let page = state
        .histories
        .history_by_user(id, params.page_num.unwrap_or(0))
        .await?;
    Ok(Json(page))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register_handler).put(update_user_handler))
        .route("/{id}", get(get_user_handler))
        .route("/{id}/posts", get(user_posts_handler))
        .route("/{id}/comments", get(user_comments_handler))
        .route("/{id}/histories", get(user_histories_handler))
        .route("/hashtag/{id}", put(update_hashtags_handler))
        .route("/profileImage/{id}", put(profile_image_handler))
        .route("/check/{nickname}", get(check_nickname_handler))
}

use axum::{
    extract::State,
    response::Json,
    routing::{post, put},
    Router,
};
use serde_json::{json, Value};

use crate::{
    api::extract::{AppJson, AppPath, AppQuery},
    app_state::AppState,
    error::AppResult,
    models::{
        api_models::{CommentSaveRequest, CommentUpdateRequest, LikeQuery},
        Comment, LikeToggle, NewComment,
    },
};

pub async fn create_comment_handler(
    State(state): State<AppState>,
    AppJson(req): AppJson<CommentSaveRequest>,
) -> AppResult<Json<Comment>> {
    let comment = state
        .comments
        .create(NewComment {
            post_id: req.post_id,
            user_id: req.user_id,
            content: req.content,
        })
        .await?;
    Ok(Json(comment))
}

pub async fn update_comment_handler(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<CommentUpdateRequest>,
) -> AppResult<Json<Comment>> {
    Ok(Json(state.comments.update(id, &req.content).await?))
}

pub async fn delete_comment_handler(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Value>> {
    state.comments.delete(id).await?;
    Ok(Json(json!({"id": id, "deleted": true})))
}

pub async fn toggle_like_handler(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<LikeQuery>,
) -> AppResult<Json<LikeToggle>> {
    let toggled = state
        .comments
        .toggle_like(params.comment_id, params.user_id)
        .await?;
    Ok(Json(toggled))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_comment_handler))
        .route("/like", put(toggle_like_handler))
        .route("/{id}", put(update_comment_handler).delete(delete_comment_handler))
}

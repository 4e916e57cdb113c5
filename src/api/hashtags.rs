use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};

use crate::{
    api::extract::AppQuery,
    app_state::AppState,
    error::AppResult,
    models::{
        api_models::{HashtagIdResponse, PageQuery, TagNameQuery},
        Hashtag, Page,
    },
};

pub async fn list_hashtags_handler(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<PageQuery>,
) -> AppResult<Json<Page<Hashtag>>> {
    Ok(Json(state.hashtags.list(params.page_num.unwrap_or(0)).await?))
}

pub async fn register_hashtag_handler(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<TagNameQuery>,
) -> AppResult<Json<HashtagIdResponse>> {
    let hashtag = state.hashtags.register(&params.tag_name).await?;
    Ok(Json(HashtagIdResponse {
        id: hashtag.id,
        tag_name: hashtag.tag_name,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_hashtags_handler))
}

pub fn v2_router() -> Router<AppState> {
    Router::new().route("/hashtag", post(register_hashtag_handler))
}

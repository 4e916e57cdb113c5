// HTTP surface - axum routers over the service layer

pub mod comments;
pub mod extract;
pub mod hashtags;
pub mod posts;
pub mod users;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
};

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let v1 = Router::new()
        .nest("/posts", posts::router())
        .nest("/histories", posts::history_router())
        .nest("/comments", comments::router())
        .nest("/users", users::router())
        .nest("/hashtags", hashtags::router());

    let files = ServeDir::new(&state.config.uploads.dir);
    let public_path = state.config.uploads.public_path.clone();

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/v1", v1)
        .nest("/api/v2", hashtags::v2_router())
        .nest_service(&public_path, files)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state.database.health_check().await?;
    Ok(Json(json!({"status": "ok"})))
}

/// Pull the named file field out of a multipart body.
/// Returns the client-side file name and the raw bytes.
pub(crate) async fn read_file_field(
    mut multipart: Multipart,
    name: &str,
) -> AppResult<(Option<String>, Vec<u8>)> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(name) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        return Ok((file_name, bytes.to_vec()));
    }
    Err(AppError::Validation(format!("Missing multipart field '{}'", name)))
}

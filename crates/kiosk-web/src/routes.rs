use crate::render;
use crate::view::{AccessView, FACES_ROUTE};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tower_http::services::ServeDir;

#[derive(Clone)]
pub struct AppState {
    /// Single connection; tokio-rusqlite runs its queries one at a time.
    pub db: tokio_rusqlite::Connection,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
    pub status: u16,
}

impl From<tokio_rusqlite::Error> for ApiError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        tracing::error!(error = %err, "access log query failed");
        ApiError {
            message: err.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

pub fn router(state: AppState, static_dir: &Path, faces_dir: &Path) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/accesos", get(list_accesos))
        .with_state(state)
        .nest_service("/static", ServeDir::new(static_dir))
        .nest_service(FACES_ROUTE, ServeDir::new(faces_dir))
}

async fn load_views(state: &AppState, limit: Option<usize>) -> ApiResult<Vec<AccessView>> {
    let events = state
        .db
        .call(move |conn| Ok(kiosk_store::fetch_events(conn, limit)?))
        .await?;
    Ok(events.into_iter().map(AccessView::from).collect())
}

async fn index(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let rows = load_views(&state, None).await?;
    Ok(Html(render::access_page(&rows)))
}

async fn list_accesos(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<AccessView>>> {
    Ok(Json(load_views(&state, params.limit).await?))
}

use std::convert::Infallible;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use artsy_core::{ArtworkId, CommandError, Snapshot};
use artsy_engine::{ControllerError, SessionController};
use artsy_logging::{artsy_debug, artsy_error};
use axum::body::Bytes;
use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::stream::{self, Stream, StreamExt};
use serde_json::{json, Value};
use tokio::sync::watch;

/// Idle interval after which an event stream receives a `: keepalive` comment.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone)]
struct AppState {
    controller: Arc<SessionController>,
    /// Flips to `true` when the server begins shutting down.
    stopping: watch::Receiver<bool>,
}

/// API routes. Event streams end once `stopping` turns true, so graceful
/// shutdown is not held up by attached clients.
pub fn router(controller: Arc<SessionController>, stopping: watch::Receiver<bool>) -> Router {
    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/events", get(events))
        .route("/api/mode", post(set_mode))
        .route("/api/timer", post(set_timer))
        .route("/api/rotation", post(set_rotation))
        .route("/api/query", post(set_query))
        .route("/api/save", post(save))
        .route("/api/next", post(next))
        .route("/api/prev", post(prev))
        .route("/api/pause", post(pause))
        .route("/api/delete", post(delete))
        .route("/api/init", post(init))
        .route("/api/image/temp", get(temp_image))
        .route("/api/image/saved/{id}", get(saved_image))
        .with_state(AppState {
            controller,
            stopping,
        })
}

/// Failure response: `{"error": <reason code>, "message": <text>}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    reason: &'static str,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            reason: "not_found",
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn reason(&self) -> &'static str {
        self.reason
    }
}

impl From<ControllerError> for ApiError {
    fn from(err: ControllerError) -> Self {
        let status = match &err {
            ControllerError::Command(CommandError::NotFound(_)) => StatusCode::NOT_FOUND,
            ControllerError::Command(_) => StatusCode::BAD_REQUEST,
            ControllerError::Persist(_) | ControllerError::Image(_) => {
                artsy_error!("Request failed: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            reason: err.reason(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.reason,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

/// Field of a JSON request body; absent or unparsable bodies read as null.
fn body_field(body: &Bytes, field: &str) -> Value {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| value.get(field).cloned())
        .unwrap_or(Value::Null)
}

async fn get_state(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.controller.snapshot().await)
}

async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.controller.subscribe().await;
    let id = subscription.id();
    artsy_debug!("Event stream {} opened", id);

    // A disconnected client leaves its entry behind; the next publish prunes it.
    let mut rx = subscription.into_receiver();
    let mut stopping = state.stopping.clone();
    let shutdown = async move {
        // Without a sender nobody can stop the server; stream until disconnect.
        if stopping.wait_for(|stopping| *stopping).await.is_err() {
            std::future::pending::<()>().await;
        }
        artsy_debug!("Closing event stream {} for shutdown", id);
    };

    let stream = stream::poll_fn(move |cx| {
        rx.poll_recv(cx)
            .map(|text| text.map(|text| Ok(Event::default().data(text))))
    })
    .take_until(shutdown);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEPALIVE_INTERVAL)
            .text("keepalive"),
    )
}

async fn set_mode(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let mode = body_field(&body, "mode");
    let applied = state
        .controller
        .set_mode(mode.as_str().unwrap_or_default())
        .await?;
    Ok(Json(json!({ "success": true, "mode": applied.session.mode })))
}

async fn set_timer(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let applied = state
        .controller
        .set_timer(body_field(&body, "seconds"))
        .await?;
    Ok(Json(json!({
        "success": true,
        "timer_seconds": applied.session.timer_seconds,
    })))
}

async fn set_rotation(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let applied = state
        .controller
        .set_rotation(body_field(&body, "rotation"))
        .await?;
    Ok(Json(json!({ "success": true, "rotation": applied.session.rotation })))
}

async fn set_query(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let query = body_field(&body, "query");
    let applied = state
        .controller
        .set_query(query.as_str().unwrap_or_default())
        .await?;
    Ok(Json(json!({
        "success": true,
        "search_query": applied.session.search_query,
    })))
}

async fn save(State(state): State<AppState>) -> ApiResult {
    state.controller.save_current_candidate().await?;
    Ok(Json(json!({ "success": true })))
}

async fn next(State(state): State<AppState>) -> ApiResult {
    let applied = state.controller.advance().await?;
    Ok(Json(json!({
        "success": true,
        "current_artwork": applied.current_artwork,
    })))
}

async fn prev(State(state): State<AppState>) -> ApiResult {
    let applied = state.controller.retreat().await?;
    Ok(Json(json!({
        "success": true,
        "current_artwork": applied.current_artwork,
    })))
}

async fn pause(State(state): State<AppState>) -> ApiResult {
    let applied = state.controller.toggle_pause().await?;
    Ok(Json(json!({ "success": true, "paused": applied.session.paused })))
}

async fn delete(State(state): State<AppState>) -> ApiResult {
    state.controller.delete_current_displayed().await?;
    Ok(Json(json!({ "success": true })))
}

async fn init(State(state): State<AppState>) -> ApiResult {
    let applied = state.controller.initialize().await?;
    Ok(Json(json!({
        "success": true,
        "mode": applied.session.mode,
        "current_artwork": applied.current_artwork,
    })))
}

async fn temp_image(State(state): State<AppState>) -> Result<Response, ApiError> {
    let path = state.controller.temp_image().await?;
    jpeg(&path).await
}

async fn saved_image(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<Response, ApiError> {
    let id: ArtworkId = id
        .parse()
        .map_err(|_| ApiError::not_found(format!("No saved image for {id}")))?;
    let path = state.controller.saved_image(id).await?;
    jpeg(&path).await
}

async fn jpeg(path: &Path) -> Result<Response, ApiError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response()),
        // Removed between lookup and read.
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(ApiError::not_found("Image no longer available"))
        }
        Err(err) => Err(ControllerError::Image(err).into()),
    }
}

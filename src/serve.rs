use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info, warn};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::auth::{IdentityProvider, LoginStates};
use crate::error::Error;
use crate::models::{Recording, RecordingChunk, User};
use crate::repository::RecordingRepository;
use crate::users::UserRepository;

// State shared by all API handlers
pub struct AppState {
    pub recordings: RecordingRepository,
    pub users: UserRepository,
    pub identity: Option<Arc<dyn IdentityProvider>>,
    pub login_states: LoginStates,
}

/// Error response that renders as `{"error": "..."}` with a matching status
pub struct ApiError {
    status: StatusCode,
    message: String,
}

/// HTTP status for each failure kind
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::RecordingNotFound(_) | Error::UserNotFound(_) => StatusCode::NOT_FOUND,
        Error::IntegrityViolation(_)
        | Error::InvalidTransition { .. }
        | Error::RecordingEnded(_)
        | Error::ProviderMismatch { .. } => StatusCode::CONFLICT,
        Error::AuthenticationFailure(_) => StatusCode::UNAUTHORIZED,
        Error::Transcription(_) => StatusCode::BAD_GATEWAY,
        Error::DataCorruption(_) | Error::SchemaVersion { .. } | Error::Database(_) | Error::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            error!("Request failed: {}", err);
        }
        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Build the API router over the given state
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/auth/google/login", get(google_login_handler))
        .route("/auth/google/callback", get(google_callback_handler))
        .route(
            "/api/recordings",
            post(create_recording_handler).get(list_recordings_handler),
        )
        .route("/api/recordings/{recording_id}", get(get_recording_handler))
        .route(
            "/api/recordings/{recording_id}/chunks",
            post(add_chunk_handler).get(list_chunks_handler),
        )
        .route("/api/recordings/{recording_id}/pause", post(pause_handler))
        .route("/api/recordings/{recording_id}/resume", post(resume_handler))
        .route("/api/recordings/{recording_id}/end", post(end_handler))
        .layer(cors)
        .with_state(state)
}

/// Run the API server until the process is stopped
pub async fn serve(state: AppState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    info!("Listening on: http://[::]:{} (IPv4 + IPv6)", port);
    if state.identity.is_none() {
        warn!("Google login is not configured; /auth routes will return 404");
    }

    let app = router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(format!("[::]:{}", port)).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// Health check endpoint - returns 200 OK if server is running
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn identity_provider(state: &AppState) -> ApiResult<&Arc<dyn IdentityProvider>> {
    state.identity.as_ref().ok_or_else(|| ApiError {
        status: StatusCode::NOT_FOUND,
        message: "google login is not configured".to_string(),
    })
}

async fn google_login_handler(State(state): State<Arc<AppState>>) -> ApiResult<Redirect> {
    let provider = identity_provider(&state)?;
    let login_state = state.login_states.issue();
    let url = provider.authorize_url(&login_state)?;
    Ok(Redirect::to(url.as_str()))
}

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

async fn google_callback_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<Json<User>> {
    let provider = identity_provider(&state)?;

    if let Some(reason) = params.error {
        return Err(Error::AuthenticationFailure(format!("provider returned error: {}", reason)).into());
    }
    let login_state = params.state.unwrap_or_default();
    if !state.login_states.consume(&login_state) {
        return Err(Error::AuthenticationFailure("unknown or expired login state".to_string()).into());
    }
    let code = params
        .code
        .ok_or_else(|| Error::AuthenticationFailure("missing authorization code".to_string()))?;

    let identity = provider.exchange_code(&code).await?;
    let user = state.users.upsert_user(&identity).await?;
    info!("User {} logged in", user.id);
    Ok(Json(user))
}

#[derive(Deserialize)]
struct CreateRecordingRequest {
    user_id: String,
}

async fn create_recording_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRecordingRequest>,
) -> ApiResult<(StatusCode, Json<Recording>)> {
    let recording = state.recordings.create_recording(&request.user_id).await?;
    Ok((StatusCode::CREATED, Json(recording)))
}

#[derive(Deserialize)]
struct ListRecordingsParams {
    user_id: String,
}

async fn list_recordings_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListRecordingsParams>,
) -> ApiResult<Json<Vec<Recording>>> {
    Ok(Json(state.recordings.list_recordings(&params.user_id).await?))
}

async fn get_recording_handler(
    State(state): State<Arc<AppState>>,
    Path(recording_id): Path<String>,
) -> ApiResult<Json<Recording>> {
    Ok(Json(state.recordings.get_recording(&recording_id).await?))
}

#[derive(Deserialize)]
struct AddChunkRequest {
    chunk_index: u32,
    audio_blob_path: String,
}

async fn add_chunk_handler(
    State(state): State<Arc<AppState>>,
    Path(recording_id): Path<String>,
    Json(request): Json<AddChunkRequest>,
) -> ApiResult<StatusCode> {
    state
        .recordings
        .add_chunk(&recording_id, &request.audio_blob_path, request.chunk_index)
        .await?;
    Ok(StatusCode::CREATED)
}

async fn list_chunks_handler(
    State(state): State<Arc<AppState>>,
    Path(recording_id): Path<String>,
) -> ApiResult<Json<Vec<RecordingChunk>>> {
    Ok(Json(state.recordings.list_chunks(&recording_id).await?))
}

async fn pause_handler(
    State(state): State<Arc<AppState>>,
    Path(recording_id): Path<String>,
) -> ApiResult<Json<Recording>> {
    state.recordings.mark_paused(&recording_id).await?;
    Ok(Json(state.recordings.get_recording(&recording_id).await?))
}

async fn resume_handler(
    State(state): State<Arc<AppState>>,
    Path(recording_id): Path<String>,
) -> ApiResult<Json<Recording>> {
    state.recordings.mark_resumed(&recording_id).await?;
    Ok(Json(state.recordings.get_recording(&recording_id).await?))
}

#[derive(Deserialize)]
struct EndRecordingRequest {
    audio_file_path: String,
    transcription_text: String,
}

async fn end_handler(
    State(state): State<Arc<AppState>>,
    Path(recording_id): Path<String>,
    Json(request): Json<EndRecordingRequest>,
) -> ApiResult<Json<Recording>> {
    state
        .recordings
        .mark_ended(
            &recording_id,
            &request.audio_file_path,
            &request.transcription_text,
        )
        .await?;
    Ok(Json(state.recordings.get_recording(&recording_id).await?))
}

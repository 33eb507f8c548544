//! HTTP request handlers
//!
//! Thin adapters from JSON requests onto [`MediaSession`] calls. Session
//! errors map to `409 Conflict` (wrong state), `400 Bad Request` (bad input)
//! or `500 Internal Server Error`.
//!
//! [`MediaSession`]: crate::session::MediaSession

use crate::api::server::AppContext;
use crate::error::Error;
use crate::session::{SeekMode, TrackInfo};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use fling_common::events::{MediaStatus, SessionEvent};
use fling_common::media::MediaInfo;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    git_hash: String,
    build_timestamp: String,
    build_profile: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct SetSourceRequest {
    uri: String,
    /// Metadata as a JSON object or as a string holding JSON
    metadata: serde_json::Value,
    #[serde(default)]
    auto_play: bool,
    #[serde(default)]
    play_in_background: bool,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    mode: SeekMode,
    position_ms: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateIntervalRequest {
    interval_ms: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PositionResponse {
    pub position_ms: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DurationResponse {
    pub duration_ms: i64,
}

#[derive(Debug, Deserialize)]
pub struct MimeQuery {
    mime_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MimeResponse {
    pub mime_type: String,
    pub supported: bool,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    volume: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VolumeResponse {
    pub volume: f64,
    pub mute: bool,
}

#[derive(Debug, Deserialize)]
pub struct MuteRequest {
    mute: bool,
}

#[derive(Debug, Deserialize)]
pub struct SurfaceRequest {
    attached: bool,
}

#[derive(Debug, Deserialize)]
pub struct BinderRequest {
    ready: bool,
}

#[derive(Debug, Deserialize)]
pub struct ImageCompleteRequest {
    ok: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(e: Error) -> ApiError {
    let code = match &e {
        Error::InvalidState(_) => StatusCode::CONFLICT,
        e if e.is_caller_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!("Request failed ({}): {}", code, e);
    (
        code,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

fn ok() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

// ============================================================================
// Health
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("FLING_GIT_HASH").to_string(),
        build_timestamp: env!("FLING_BUILD_TIMESTAMP").to_string(),
        build_profile: env!("FLING_BUILD_PROFILE").to_string(),
    })
}

// ============================================================================
// Session control
// ============================================================================

/// POST /session/source
pub async fn set_source(
    State(ctx): State<AppContext>,
    Json(req): Json<SetSourceRequest>,
) -> ApiResult<StatusResponse> {
    let metadata = match req.metadata {
        serde_json::Value::String(raw) => raw,
        other => other.to_string(),
    };
    ctx.session
        .set_media_source(&req.uri, &metadata, req.auto_play, req.play_in_background)
        .map_err(api_error)?;

    info!("Source accepted: {}", req.uri);
    ctx.events.emit_lossy(SessionEvent::SourceRequested {
        source: req.uri,
        auto_play: req.auto_play,
        timestamp: chrono::Utc::now(),
    });
    Ok(ok())
}

/// POST /session/play
pub async fn play(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.session.play().map_err(api_error)?;
    Ok(ok())
}

/// POST /session/pause
pub async fn pause(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.session.pause().map_err(api_error)?;
    Ok(ok())
}

/// POST /session/stop
pub async fn stop(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.session.stop().map_err(api_error)?;
    Ok(ok())
}

/// POST /session/seek
pub async fn seek(
    State(ctx): State<AppContext>,
    Json(req): Json<SeekRequest>,
) -> ApiResult<StatusResponse> {
    ctx.session.seek(req.mode, req.position_ms).map_err(api_error)?;
    Ok(ok())
}

/// POST /session/update-interval
pub async fn set_update_interval(
    State(ctx): State<AppContext>,
    Json(req): Json<UpdateIntervalRequest>,
) -> ApiResult<StatusResponse> {
    ctx.session
        .set_position_update_interval(req.interval_ms)
        .map_err(api_error)?;
    Ok(ok())
}

// ============================================================================
// Session queries
// ============================================================================

/// GET /session/status
pub async fn get_status(State(ctx): State<AppContext>) -> Json<MediaStatus> {
    Json(ctx.session.get_status())
}

/// GET /session/media
pub async fn get_media_info(State(ctx): State<AppContext>) -> Json<MediaInfo> {
    Json(ctx.session.get_media_info())
}

/// GET /session/position
pub async fn get_position(State(ctx): State<AppContext>) -> ApiResult<PositionResponse> {
    let position_ms = ctx.session.get_position().map_err(api_error)?;
    Ok(Json(PositionResponse { position_ms }))
}

/// GET /session/duration
pub async fn get_duration(State(ctx): State<AppContext>) -> Json<DurationResponse> {
    Json(DurationResponse {
        duration_ms: ctx.session.get_duration(),
    })
}

/// GET /session/metadata
pub async fn get_track_info(State(ctx): State<AppContext>) -> Json<TrackInfo> {
    Json(ctx.session.track_info())
}

/// GET /session/mime?mime_type=...
pub async fn mime_supported(
    State(ctx): State<AppContext>,
    Query(query): Query<MimeQuery>,
) -> Json<MimeResponse> {
    let supported = ctx.session.is_mime_type_supported(&query.mime_type);
    Json(MimeResponse {
        mime_type: query.mime_type,
        supported,
    })
}

// ============================================================================
// Audio output
// ============================================================================

/// GET /audio/volume
pub async fn get_volume(State(ctx): State<AppContext>) -> ApiResult<VolumeResponse> {
    let volume = ctx.session.get_volume().map_err(api_error)?;
    Ok(Json(VolumeResponse {
        volume,
        mute: ctx.session.is_mute(),
    }))
}

/// POST /audio/volume
pub async fn set_volume(
    State(ctx): State<AppContext>,
    Json(req): Json<VolumeRequest>,
) -> ApiResult<VolumeResponse> {
    ctx.session.set_volume(req.volume).map_err(api_error)?;
    let volume = ctx.session.get_volume().map_err(api_error)?;
    Ok(Json(VolumeResponse {
        volume,
        mute: ctx.session.is_mute(),
    }))
}

/// POST /audio/mute
pub async fn set_mute(
    State(ctx): State<AppContext>,
    Json(req): Json<MuteRequest>,
) -> ApiResult<StatusResponse> {
    ctx.session.set_mute(req.mute).map_err(api_error)?;
    Ok(ok())
}

// ============================================================================
// Viewer handshake
// ============================================================================

/// POST /viewer/surface
pub async fn set_surface(
    State(ctx): State<AppContext>,
    Json(req): Json<SurfaceRequest>,
) -> Json<StatusResponse> {
    ctx.session.set_surface_attached(req.attached);
    ok()
}

/// POST /viewer/binder
pub async fn set_binder(
    State(ctx): State<AppContext>,
    Json(req): Json<BinderRequest>,
) -> Json<StatusResponse> {
    ctx.session.set_binder_status(req.ready);
    ok()
}

/// POST /viewer/image-complete
pub async fn image_complete(
    State(ctx): State<AppContext>,
    Json(req): Json<ImageCompleteRequest>,
) -> Json<StatusResponse> {
    ctx.session.set_image_complete(req.ok);
    ok()
}

//! Lyrics endpoints
//!
//! - POST /lyrics/load - resolve lyrics for a track
//! - POST /lyrics/select - pick a candidate from the last results
//! - POST /lyrics/cached - look up the persisted selection for a track
//! - GET  /lyrics/current - currently published lyrics
//! - GET  /lyrics/results - last search results
//! - GET  /lyrics/position - line index and progress at a playback position

use crate::error::{ApiError, ApiResult};
use crate::models::{LyricCandidate, LyricsData, SongInformation};
use crate::services::selection_controller::{LoadOptions, DEFAULT_SEARCH_LIMIT};
use crate::services::synchronizer;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// POST /lyrics/load request body
#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    pub song: SongInformation,
    /// Sidecar .lrc content, if the caller found one next to the audio file
    #[serde(default)]
    pub local_lrc_content: Option<String>,
    /// Per-provider result limit
    #[serde(default)]
    pub limit: Option<usize>,
}

/// POST /lyrics/load response body
#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub published: bool,
    pub results: Vec<LyricCandidate>,
}

/// POST /lyrics/load
pub async fn load_lyrics(
    State(state): State<AppState>,
    Json(request): Json<LoadRequest>,
) -> ApiResult<Json<LoadResponse>> {
    if request.song.title.trim().is_empty() {
        return Err(ApiError::BadRequest("song title is required".to_string()));
    }

    let options = LoadOptions {
        local_lrc_content: request.local_lrc_content,
        limit: request.limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
    };

    let published = state.controller.load(&request.song, options).await;

    Ok(Json(LoadResponse {
        published,
        results: state.controller.last_search_results(),
    }))
}

/// POST /lyrics/select request body
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub index: usize,
    #[serde(default = "default_save")]
    pub save: bool,
}

fn default_save() -> bool {
    true
}

/// POST /lyrics/select response body
#[derive(Debug, Serialize)]
pub struct SelectResponse {
    pub selected: bool,
}

/// POST /lyrics/select
pub async fn select_lyrics(
    State(state): State<AppState>,
    Json(request): Json<SelectRequest>,
) -> Json<SelectResponse> {
    let selected = state.controller.select(request.index, request.save).await;
    Json(SelectResponse { selected })
}

/// POST /lyrics/cached
pub async fn cached_selection(
    State(state): State<AppState>,
    Json(song): Json<SongInformation>,
) -> Json<Option<LyricCandidate>> {
    Json(state.controller.cached_selection(&song).await)
}

/// GET /lyrics/current
pub async fn current_lyrics(State(state): State<AppState>) -> ApiResult<Json<LyricsData>> {
    match state.controller.current_lyrics() {
        Some(lyrics) => Ok(Json((*lyrics).clone())),
        None => Err(ApiError::NotFound("no lyrics published".to_string())),
    }
}

/// GET /lyrics/results
pub async fn last_results(State(state): State<AppState>) -> Json<Vec<LyricCandidate>> {
    Json(state.controller.last_search_results())
}

/// GET /lyrics/position query parameters
#[derive(Debug, Deserialize)]
pub struct PositionQuery {
    pub time_ms: u64,
}

/// GET /lyrics/position response body
#[derive(Debug, Serialize)]
pub struct PositionResponse {
    /// Active line index, -1 before the first line
    pub line_index: i64,
    /// Progress through the active line in [0, 1]
    pub progress: f64,
}

/// GET /lyrics/position?time_ms=N
pub async fn position(
    State(state): State<AppState>,
    Query(query): Query<PositionQuery>,
) -> ApiResult<Json<PositionResponse>> {
    let Some(lyrics) = state.controller.current_lyrics() else {
        return Err(ApiError::NotFound("no lyrics published".to_string()));
    };

    let line_index = synchronizer::find_line_index(&lyrics, query.time_ms);
    let progress = if line_index >= 0 {
        let i = line_index as usize;
        synchronizer::line_progress(&lyrics.lines[i], lyrics.lines.get(i + 1), query.time_ms)
    } else {
        0.0
    };

    Ok(Json(PositionResponse {
        line_index: line_index as i64,
        progress,
    }))
}

/// Build lyrics routes
pub fn lyrics_routes() -> Router<AppState> {
    Router::new()
        .route("/lyrics/load", post(load_lyrics))
        .route("/lyrics/select", post(select_lyrics))
        .route("/lyrics/cached", post(cached_selection))
        .route("/lyrics/current", get(current_lyrics))
        .route("/lyrics/results", get(last_results))
        .route("/lyrics/position", get(position))
}

use crate::api::extract::{JsonBody, SongId};
use crate::error::{AppError, Result};
use crate::models::{
    song::parse_release_date, EditSongRequest, EditSongResponse, NewSongRequest, Song,
    SongListResponse, SongTextResponse,
};
use crate::services::{lyrics, SongFilter, SongInfoClient, SongRepository};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

pub struct AppState {
    pub repository: Arc<SongRepository>,
    pub song_info: Arc<SongInfoClient>,
}

const LIST_QUERY_KEYS: [&str; 7] = ["limit", "offset", "group", "name", "releaseDate", "text", "link"];

pub fn song_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/songs", get(list_songs))
        .route("/songs/new", post(new_song))
        .route("/songs/:song_id/text", get(get_text))
        .route("/songs/:song_id/delete", delete(delete_song))
        .route("/songs/:song_id/edit", patch(edit_song))
}

/// Builds a filter from the raw query pairs. Every key must be one of the
/// listing parameters; the first occurrence of a repeated key wins.
pub fn parse_list_query(pairs: Vec<(String, String)>) -> Result<SongFilter> {
    let mut filter = SongFilter::default();
    let mut seen = HashSet::new();

    for (key, value) in pairs {
        if !LIST_QUERY_KEYS.contains(&key.as_str()) {
            return Err(AppError::Validation(format!(
                "unrecognized query parameter: {}",
                key
            )));
        }
        if !seen.insert(key.clone()) {
            continue;
        }

        match key.as_str() {
            "limit" => filter.limit = parse_count("limit", &value)?,
            "offset" => filter.offset = parse_count("offset", &value)?,
            "group" => filter.group = Some(value),
            "name" => filter.name = Some(value),
            "releaseDate" if value.is_empty() => {}
            "releaseDate" => {
                filter.release_date = Some(parse_release_date(&value).ok_or_else(|| {
                    AppError::Validation(format!("invalid releaseDate format: {}", value))
                })?)
            }
            "text" => filter.text = Some(value),
            "link" => filter.link = Some(value),
            _ => {}
        }
    }

    Ok(filter)
}

fn parse_count(name: &str, value: &str) -> Result<i64> {
    let n = value
        .parse::<i64>()
        .map_err(|e| AppError::Validation(format!("invalid {} format: {}", name, e)))?;
    if n < 0 {
        return Err(AppError::Validation(format!("{} must not be negative", name)));
    }
    Ok(n)
}

/// Page and verse count for the lyrics endpoint. Only the first occurrence of
/// each key counts; missing or unparsable values fall back to 1. Other keys
/// are ignored.
pub fn parse_text_page(pairs: &[(String, String)]) -> (i64, i64) {
    let first = |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| value.parse::<i64>().ok())
            .unwrap_or(1)
    };
    (first("page"), first("limit"))
}

async fn list_songs(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<SongListResponse>> {
    let Query(pairs) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    let filter = parse_list_query(pairs)?;

    let songs = state.repository.list_songs(&filter).await?;

    Ok(Json(SongListResponse { song: songs }))
}

async fn get_text(
    State(state): State<Arc<AppState>>,
    SongId(song_id): SongId,
    query: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<SongTextResponse>> {
    let Query(pairs) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    let (page, limit) = parse_text_page(&pairs);

    let text = state
        .repository
        .get_lyrics_by_song_id(song_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no such text with song_id: {}", song_id)))?;

    let text = lyrics::paginate_verses(&text, page, limit)
        .ok_or_else(|| AppError::NotFound("no more verses".to_string()))?;

    Ok(Json(SongTextResponse { text }))
}

async fn delete_song(
    State(state): State<Arc<AppState>>,
    SongId(song_id): SongId,
) -> Result<Json<Value>> {
    let deleted = state.repository.delete_song(song_id).await?;
    tracing::info!("Delete song {}: {} row(s) removed", song_id, deleted);

    Ok(Json(json!({})))
}

async fn edit_song(
    State(state): State<Arc<AppState>>,
    SongId(song_id): SongId,
    JsonBody(req): JsonBody<EditSongRequest>,
) -> Result<Json<EditSongResponse>> {
    let not_found = || AppError::NotFound(format!("no such song with song_id: {}", song_id));

    let mut song = state
        .repository
        .get_song_by_id(song_id)
        .await?
        .ok_or_else(not_found)?;
    let mut song_details = state
        .repository
        .get_song_details_by_id(song_id)
        .await?
        .ok_or_else(not_found)?;

    req.song.apply(&mut song);
    req.song_details.apply(&mut song_details)?;

    state
        .repository
        .update_song(song.clone(), song_details.clone())
        .await
        .map_err(|e| {
            if e.is_foreign_key_violation() {
                AppError::Validation(format!("no such group with group_id: {}", song.group_id))
            } else {
                e
            }
        })?;

    tracing::info!("Updated song {} ('{}')", song.id, song.name);

    Ok(Json(EditSongResponse {
        song,
        song_details,
    }))
}

async fn new_song(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<NewSongRequest>,
) -> Result<(StatusCode, Json<Song>)> {
    req.check()?;

    let info = state.song_info.fetch_details(&req.group, &req.song).await?;

    let group_id = state.repository.resolve_group(&req.group).await?;

    let song = state
        .repository
        .create_song_with_details(req.song, group_id, info)
        .await?;

    tracing::info!("Created song {} ('{}') in group {}", song.id, song.name, group_id);

    Ok((StatusCode::CREATED, Json(song)))
}

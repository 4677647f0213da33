use crate::interface_adapters::http::error_response;
use crate::interface_adapters::net::client::spawn_match_serializer;
use crate::interface_adapters::state::AppState;
use crate::use_cases::MatchError;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::{collections::HashSet, sync::Arc};

#[derive(Debug, serde::Deserialize)]
pub struct MatchInitRequest {
    // Match id chosen by whoever hosts the game.
    match_id: String,
    // Player ids allowed to play; empty opens the match to guests.
    #[serde(default)]
    allowed_player_ids: Vec<u64>,
}

#[derive(Debug, serde::Serialize)]
struct MatchInitResponse {
    match_id: String,
}

pub async fn create_match_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MatchInitRequest>,
) -> impl IntoResponse {
    let match_id = payload.match_id.trim().to_string();
    if match_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "match_id is required");
    }

    let allowed_players: HashSet<u64> = payload.allowed_player_ids.into_iter().collect();

    match state
        .match_registry
        .create_match(match_id.clone(), allowed_players)
        .await
    {
        Ok(handle) => {
            // Serializer first so clients can subscribe immediately.
            spawn_match_serializer(&handle);
            (StatusCode::CREATED, Json(MatchInitResponse { match_id })).into_response()
        }
        Err(MatchError::AlreadyExists) => {
            error_response(StatusCode::CONFLICT, "match already exists")
        }
        Err(MatchError::NotFound) => error_response(StatusCode::NOT_FOUND, "match not found"),
    }
}

pub async fn remove_match_handler(
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<String>,
) -> impl IntoResponse {
    if *state.default_match_id == *match_id {
        return error_response(StatusCode::FORBIDDEN, "default match cannot be removed");
    }

    match state.match_registry.remove_match(&match_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(_) => error_response(StatusCode::NOT_FOUND, "match not found"),
    }
}

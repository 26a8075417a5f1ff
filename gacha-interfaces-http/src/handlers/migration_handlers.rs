use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use tracing::warn;

use gacha_application::commands::migrate_commands;
use gacha_application::AppState;
use gacha_domain::MigrationResult;

use crate::error::HttpError;
use crate::middleware::{authorize, parse_player};

#[derive(Debug, Deserialize)]
pub struct MigrationRequest {
    pub old_player_id: String,
    pub new_player_id: String,
}

pub async fn run_migration(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<MigrationRequest>,
) -> Result<(StatusCode, Json<MigrationResult>), HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let old = parse_player(&payload.old_player_id)?;
    let new = parse_player(&payload.new_player_id)?;
    let result = migrate_commands::migrate(&state, &old, &new).await?;
    let status = match &result {
        MigrationResult::PartialFailure { failed, .. } => {
            warn!("migration {} -> {}: {} categories failed", old, new, failed.len());
            StatusCode::MULTI_STATUS
        }
        _ => StatusCode::OK,
    };
    Ok((status, Json(result)))
}

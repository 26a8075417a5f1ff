use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use gacha_application::commands::{history_commands, import_commands};
use gacha_application::queries::history_queries;
use gacha_application::AppState;

use crate::error::HttpError;
use crate::middleware::{authorize, maybe_gunzip, parse_category, parse_player};

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

pub async fn import_history(
    State(state): State<AppState>,
    Path(player): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<import_commands::ImportSummary>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let player = parse_player(&player)?;
    let content = maybe_gunzip(&headers, &body, state.config.max_body_bytes).map_err(|err| {
        error!("failed to inflate import body: {}", err);
        HttpError::BadRequest(err.to_string())
    })?;
    let summary = import_commands::import_file(&state, &player, &content).await?;
    info!(
        "import for {}: format={} added={} superseded={} skipped={}",
        player, summary.format, summary.added, summary.superseded, summary.skipped
    );
    Ok(Json(summary))
}

pub async fn import_live_history(
    State(state): State<AppState>,
    Path(player): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<import_commands::ImportSummary>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let player = parse_player(&player)?;
    let content = maybe_gunzip(&headers, &body, state.config.max_body_bytes)
        .map_err(|err| HttpError::BadRequest(err.to_string()))?;
    let summary = import_commands::import_live_response(&state, &player, &content).await?;
    Ok(Json(summary))
}

pub async fn export_history(
    State(state): State<AppState>,
    Path(player): Path<String>,
    headers: HeaderMap,
    Query(query): Query<ExportQuery>,
) -> Result<Response, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let player = parse_player(&player)?;
    let file = match query.format.as_deref().map(str::trim) {
        None | Some("") | Some("interchange") | Some("uimf") => {
            history_queries::export_all(&state, &player).await?
        }
        Some("legacy") => history_queries::export_legacy(&state, &player).await?,
        Some(other) => {
            return Err(HttpError::BadRequest(format!(
                "unknown export format '{}'",
                other
            )))
        }
    };

    let mut out = HeaderMap::new();
    out.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        out.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok((out, file.bytes).into_response())
}

pub async fn delete_history(
    State(state): State<AppState>,
    Path(player): Path<String>,
    headers: HeaderMap,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<DeleteResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let player = parse_player(&player)?;
    let category = match query.category.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(parse_category(raw)?),
    };
    let deleted = history_commands::delete_history(&state, &player, category).await?;
    Ok(Json(DeleteResponse { deleted }))
}

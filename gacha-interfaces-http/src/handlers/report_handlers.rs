use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use gacha_application::queries::report_queries;
use gacha_application::AppState;
use gacha_domain::{FiveStarOverview, WindowStats};

use crate::error::HttpError;
use crate::middleware::{authorize, parse_category, parse_player};

#[derive(Debug, Deserialize)]
pub struct PityQuery {
    /// When set, only the counters right after this record are returned.
    #[serde(default)]
    pub record_id: Option<String>,
}

pub async fn get_pity(
    State(state): State<AppState>,
    Path((player, category)): Path<(String, String)>,
    headers: HeaderMap,
    Query(query): Query<PityQuery>,
) -> Result<Response, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let player = parse_player(&player)?;
    let category = parse_category(&category)?;
    match query.record_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        Some(record_id) => {
            let point = report_queries::get_pity_at(&state, &player, category, record_id).await?;
            Ok(Json(point).into_response())
        }
        None => {
            let report = report_queries::get_pity_report(&state, &player, category).await?;
            Ok(Json(report).into_response())
        }
    }
}

pub async fn list_pools(
    State(state): State<AppState>,
    Path((player, category)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Vec<WindowStats>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let player = parse_player(&player)?;
    let category = parse_category(&category)?;
    let windows = report_queries::get_pool_report(&state, &player, category).await?;
    Ok(Json(windows))
}

pub async fn five_star_overview(
    State(state): State<AppState>,
    Path(player): Path<String>,
    headers: HeaderMap,
) -> Result<Json<FiveStarOverview>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let player = parse_player(&player)?;
    let overview = report_queries::get_five_star_overview(&state, &player).await?;
    Ok(Json(overview))
}

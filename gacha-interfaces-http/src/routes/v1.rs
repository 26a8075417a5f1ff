use axum::Router;

use gacha_application::AppState;

use crate::handlers::{history_handlers, migration_handlers, ops_handlers, report_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/players/:player/history",
            axum::routing::delete(history_handlers::delete_history),
        )
        .route(
            "/v1/players/:player/history/import",
            axum::routing::post(history_handlers::import_history),
        )
        .route(
            "/v1/players/:player/history/import/live",
            axum::routing::post(history_handlers::import_live_history),
        )
        .route(
            "/v1/players/:player/history/export",
            axum::routing::get(history_handlers::export_history),
        )
        .route(
            "/v1/players/:player/history/five-star",
            axum::routing::get(report_handlers::five_star_overview),
        )
        .route(
            "/v1/players/:player/history/:category/pity",
            axum::routing::get(report_handlers::get_pity),
        )
        .route(
            "/v1/players/:player/history/:category/pools",
            axum::routing::get(report_handlers::list_pools),
        )
        .route(
            "/v1/migrations",
            axum::routing::post(migration_handlers::run_migration),
        )
        .route(
            "/v1/ops/health/live",
            axum::routing::get(ops_handlers::health_live),
        )
        .route(
            "/v1/ops/metrics/prometheus",
            axum::routing::get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}

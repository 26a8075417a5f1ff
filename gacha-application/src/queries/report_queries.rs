use crate::commands::import_commands::load_all_ledgers;
use crate::{AppError, AppState};
use gacha_domain::{
    FiveStarOverview, Ledger, LedgerError, PityPoint, PityReport, PlayerId, PoolCategory,
    WindowStats,
};

async fn require_ledger(
    state: &AppState,
    player: &PlayerId,
    category: PoolCategory,
) -> Result<Ledger, AppError> {
    state
        .ledger_repo
        .load_ledger(player, category)
        .await
        .map_err(AppError::storage)?
        .ok_or_else(|| LedgerError::NoHistory(player.clone()).into())
}

pub async fn get_pity_report(
    state: &AppState,
    player: &PlayerId,
    category: PoolCategory,
) -> Result<PityReport, AppError> {
    let ledger = require_ledger(state, player, category).await?;
    Ok(state.analyzer().analyze(&ledger))
}

pub async fn get_pity_at(
    state: &AppState,
    player: &PlayerId,
    category: PoolCategory,
    record_id: &str,
) -> Result<PityPoint, AppError> {
    let ledger = require_ledger(state, player, category).await?;
    gacha_domain::pity_at(ledger.records(), record_id)
        .ok_or_else(|| AppError::BadRequest(format!("record '{}' not found", record_id)))
}

pub async fn get_pool_report(
    state: &AppState,
    player: &PlayerId,
    category: PoolCategory,
) -> Result<Vec<WindowStats>, AppError> {
    let ledger = require_ledger(state, player, category).await?;
    Ok(state.analyzer().pool_analysis(&ledger))
}

pub async fn get_five_star_overview(
    state: &AppState,
    player: &PlayerId,
) -> Result<FiveStarOverview, AppError> {
    let ledgers = load_all_ledgers(state, player).await?;
    if ledgers.is_empty() {
        return Err(LedgerError::NoHistory(player.clone()).into());
    }
    Ok(state.analyzer().five_star_overview(player, &ledgers))
}

use tracing::info;

use crate::{AppError, AppState};
use gacha_domain::{PlayerId, PoolCategory};

/// Deletes one category's ledger, or every ledger plus the profile when
/// `category` is `None`. Returns whether anything existed.
pub async fn delete_history(
    state: &AppState,
    player: &PlayerId,
    category: Option<PoolCategory>,
) -> Result<bool, AppError> {
    let categories = match category {
        Some(category) => vec![category],
        None => PoolCategory::ALL.to_vec(),
    };

    let mut deleted = false;
    for category in categories {
        let _guard = state.locks.acquire(player, category).await;
        deleted |= state
            .ledger_repo
            .delete_ledger(player, category)
            .await
            .map_err(AppError::storage)?;
    }
    if category.is_none() {
        let _guard = state.locks.acquire_profile(player).await;
        deleted |= state
            .ledger_repo
            .delete_profile(player)
            .await
            .map_err(AppError::storage)?;
    }

    info!(
        "delete history for player {} ({}): deleted={}",
        player,
        category.map(|c| c.as_str()).unwrap_or("all"),
        deleted
    );
    Ok(deleted)
}

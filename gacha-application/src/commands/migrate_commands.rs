use std::collections::BTreeMap;

use chrono::Local;
use futures_util::future::join_all;
use tracing::{info, warn};

use crate::commands::import_commands::load_all_ledgers;
use crate::{AppError, AppState};
use gacha_domain::{
    find_conflicting_record, CategoryFailure, CategoryMigration, Ledger, MigrationPlan,
    MigrationResult, PlayerId, PlayerProfile, PoolCategory,
};

/// Per category, the draws `old` holds that `new` does not.
pub async fn plan_migration(
    state: &AppState,
    old: &PlayerId,
    new: &PlayerId,
) -> Result<Option<MigrationPlan>, AppError> {
    if old == new {
        return Err(AppError::BadRequest(
            "old and new player ids must differ".to_string(),
        ));
    }
    let old_ledgers = load_all_ledgers(state, old).await?;
    let new_ledgers = load_all_ledgers(state, new).await?;
    Ok(MigrationPlan::build(
        old.clone(),
        new.clone(),
        &old_ledgers,
        &new_ledgers,
    ))
}

/// Copies the planned records into the new player's ledgers. The old
/// ledgers are never touched. Categories fail independently.
pub async fn apply_migration(state: &AppState, plan: MigrationPlan) -> Result<MigrationResult, AppError> {
    carry_providers(state, &plan.old_player_id, &plan.new_player_id).await?;

    let target = &plan.new_player_id;
    let results = join_all(
        plan.categories
            .into_iter()
            .map(|category| migrate_category(state, target, category)),
    )
    .await;

    let mut migrated = BTreeMap::new();
    let mut failed = Vec::new();
    for result in results {
        match result {
            Ok((category, added)) => {
                migrated.insert(category, added);
            }
            Err(failure) => {
                warn!(
                    "migration {} -> {} failed for {}: {}",
                    plan.old_player_id, target, failure.category, failure.reason
                );
                failed.push(failure);
            }
        }
    }

    state.metrics.record_migration(failed.len());
    info!(
        "migration {} -> {}: {} categories migrated, {} failed",
        plan.old_player_id,
        target,
        migrated.len(),
        failed.len()
    );
    if failed.is_empty() {
        Ok(MigrationResult::Completed { migrated })
    } else {
        Ok(MigrationResult::PartialFailure { migrated, failed })
    }
}

pub async fn migrate(state: &AppState, old: &PlayerId, new: &PlayerId) -> Result<MigrationResult, AppError> {
    match plan_migration(state, old, new).await? {
        Some(plan) => apply_migration(state, plan).await,
        None => {
            info!("migration {} -> {}: nothing to migrate", old, new);
            Ok(MigrationResult::NothingToMigrate)
        }
    }
}

async fn migrate_category(
    state: &AppState,
    target: &PlayerId,
    planned: CategoryMigration,
) -> Result<(PoolCategory, usize), CategoryFailure> {
    let category = planned.category;
    let fail = |reason: String| CategoryFailure { category, reason };

    let Some(_guard) = state.locks.try_acquire(target, category).await else {
        return Err(fail("ledger is being written concurrently".to_string()));
    };
    let mut ledger = state
        .ledger_repo
        .load_ledger(target, category)
        .await
        .map_err(|err| fail(format!("load failed: {}", err)))?
        .unwrap_or_else(|| Ledger::new(target.clone(), category));

    if let Some(record) = find_conflicting_record(&ledger, &planned.records) {
        return Err(fail(format!(
            "record {} already exists with different content",
            record.id
        )));
    }

    // The target may have changed since planning; never rewrite its ids.
    let records = ledger.unseen(&planned.records);
    let outcome = ledger
        .merge(records)
        .map_err(|err| fail(err.to_string()))?;
    if outcome.added > 0 || outcome.superseded > 0 {
        state
            .ledger_repo
            .save_ledger(&ledger)
            .await
            .map_err(|err| fail(format!("save failed: {}", err)))?;
    }
    Ok((category, outcome.added))
}

/// Unions the old player's providers into the new profile so the
/// provider-mixing guard still holds after the re-link.
async fn carry_providers(state: &AppState, old: &PlayerId, new: &PlayerId) -> Result<(), AppError> {
    let Some(source) = state
        .ledger_repo
        .load_profile(old)
        .await
        .map_err(AppError::storage)?
    else {
        return Ok(());
    };

    let _guard = state.locks.acquire_profile(new).await;
    let mut profile = state
        .ledger_repo
        .load_profile(new)
        .await
        .map_err(AppError::storage)?
        .unwrap_or_else(|| PlayerProfile::new(new.clone(), Local::now().naive_local()));
    profile.providers.extend(source.providers);
    profile.updated_at = Local::now().naive_local();
    state
        .ledger_repo
        .save_profile(&profile)
        .await
        .map_err(AppError::storage)
}

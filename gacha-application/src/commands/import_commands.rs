use chrono::Local;
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::{AppError, AppState};
use gacha_domain::formats::{self, live};
use gacha_domain::ports::LiveHistorySource;
use gacha_domain::{
    find_category_conflict, DecodedBatch, Ledger, LedgerError, MergeOutcome, PlayerId,
    PlayerProfile, PoolCategory, Record, SourceFormat,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryImport {
    pub category: PoolCategory,
    pub added: usize,
    pub superseded: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub player_id: PlayerId,
    pub format: SourceFormat,
    /// Records new to the ledger; zero means everything was already known.
    pub added: usize,
    pub superseded: usize,
    pub skipped: usize,
    pub per_category: Vec<CategoryImport>,
}

/// Imports an uploaded interchange or legacy file.
pub async fn import_file(
    state: &AppState,
    player: &PlayerId,
    bytes: &[u8],
) -> Result<ImportSummary, AppError> {
    let batch = formats::decode_file(bytes, &state.catalog).map_err(|err| {
        state.metrics.record_import_failure();
        warn!("import for player {} rejected: {}", player, err);
        AppError::from(err)
    })?;
    import_batch(state, player, batch).await
}

/// Imports a live API response the caller already fetched.
pub async fn import_live_response(
    state: &AppState,
    player: &PlayerId,
    bytes: &[u8],
) -> Result<ImportSummary, AppError> {
    let decoded = live::parse(bytes).and_then(|history| live::decode(&history, &state.catalog));
    let batch = decoded.map_err(|err| {
        state.metrics.record_import_failure();
        warn!("live import for player {} rejected: {}", player, err);
        AppError::from(err)
    })?;
    import_batch(state, player, batch).await
}

/// Fetches from the live source, then imports. No lock is held while fetching.
pub async fn import_from_live_source(
    state: &AppState,
    player: &PlayerId,
    source: &dyn LiveHistorySource,
) -> Result<ImportSummary, AppError> {
    let history = source.fetch(player).await.map_err(|err| {
        state.metrics.record_import_failure();
        AppError::Source(err)
    })?;
    let batch = live::decode(&history, &state.catalog).map_err(|err| {
        state.metrics.record_import_failure();
        AppError::from(err)
    })?;
    import_batch(state, player, batch).await
}

async fn import_batch(
    state: &AppState,
    player: &PlayerId,
    batch: DecodedBatch,
) -> Result<ImportSummary, AppError> {
    let result = merge_batch(state, player, batch).await;
    match &result {
        Ok(summary) => {
            state.metrics.record_import(summary.added);
            info!(
                "imported {} history for player {}: added={} superseded={} skipped={}",
                summary.format, player, summary.added, summary.superseded, summary.skipped
            );
        }
        Err(err) => {
            state.metrics.record_import_failure();
            warn!("import for player {} failed: {}", player, err);
        }
    }
    result
}

async fn merge_batch(
    state: &AppState,
    player: &PlayerId,
    batch: DecodedBatch,
) -> Result<ImportSummary, AppError> {
    batch.check_identity(player)?;

    let mut summary = ImportSummary {
        player_id: player.clone(),
        format: batch.format,
        added: 0,
        superseded: 0,
        skipped: batch.skipped,
        per_category: Vec::new(),
    };
    if batch.records.is_empty() {
        return Ok(summary);
    }

    // Legacy draws carry no id, so the cross-category check and the merge
    // must see the same ledgers: hold every category of the player throughout.
    let held = if batch.format == SourceFormat::Legacy {
        let guards = state.locks.acquire_all(player).await;
        let existing = load_all_ledgers(state, player).await?;
        if let Some((record, category)) = find_category_conflict(&existing, &batch.records) {
            return Err(LedgerError::schema(
                None,
                format!(
                    "{} at {} is already recorded under {}, not {}",
                    record.name, record.time, category, record.pool_category
                ),
            )
            .into());
        }
        Some(guards)
    } else {
        None
    };

    claim_provider(state, player, batch.format).await?;

    let locked = held.is_some();
    let merges = batch.by_category().into_iter().map(|(category, records)| async move {
        if locked {
            merge_locked(state, player, category, records).await
        } else {
            merge_category(state, player, category, records).await
        }
    });
    let mut failure = None;
    for result in join_all(merges).await {
        match result {
            Ok((category, outcome)) => {
                summary.added += outcome.added;
                summary.superseded += outcome.superseded;
                summary.per_category.push(CategoryImport {
                    category,
                    added: outcome.added,
                    superseded: outcome.superseded,
                    duplicates: outcome.duplicates,
                });
            }
            Err(err) => {
                failure.get_or_insert(err);
            }
        }
    }
    drop(held);
    match failure {
        Some(err) => Err(err),
        None => Ok(summary),
    }
}

/// Provider-mixing guard. The provider is recorded before any merge so a
/// concurrent legacy import cannot slip past a live import in flight.
async fn claim_provider(
    state: &AppState,
    player: &PlayerId,
    format: SourceFormat,
) -> Result<(), AppError> {
    let _guard = state.locks.acquire_profile(player).await;
    let mut profile = state
        .ledger_repo
        .load_profile(player)
        .await
        .map_err(AppError::storage)?
        .unwrap_or_else(|| PlayerProfile::new(player.clone(), Local::now().naive_local()));

    if format == SourceFormat::Legacy && profile.has_provider(SourceFormat::LiveApi) {
        warn!("refusing legacy import for player {}: live API history present", player);
        return Err(LedgerError::MixedProvider {
            player: player.clone(),
            existing: SourceFormat::LiveApi,
            incoming: format,
        }
        .into());
    }

    profile.providers.insert(format);
    profile.updated_at = Local::now().naive_local();
    state
        .ledger_repo
        .save_profile(&profile)
        .await
        .map_err(AppError::storage)
}

/// Load, merge, save under the `(player, category)` lock.
async fn merge_category(
    state: &AppState,
    player: &PlayerId,
    category: PoolCategory,
    records: Vec<Record>,
) -> Result<(PoolCategory, MergeOutcome), AppError> {
    let _guard = state.locks.acquire(player, category).await;
    merge_locked(state, player, category, records).await
}

/// Load, merge, save. The caller holds the `(player, category)` lock.
async fn merge_locked(
    state: &AppState,
    player: &PlayerId,
    category: PoolCategory,
    records: Vec<Record>,
) -> Result<(PoolCategory, MergeOutcome), AppError> {
    let mut ledger = state
        .ledger_repo
        .load_ledger(player, category)
        .await
        .map_err(AppError::storage)?
        .unwrap_or_else(|| Ledger::new(player.clone(), category));
    let outcome = ledger.merge(records)?;
    if outcome.added > 0 || outcome.superseded > 0 {
        state
            .ledger_repo
            .save_ledger(&ledger)
            .await
            .map_err(AppError::storage)?;
    }
    Ok((category, outcome))
}

pub(crate) async fn load_all_ledgers(state: &AppState, player: &PlayerId) -> Result<Vec<Ledger>, AppError> {
    let mut ledgers = Vec::new();
    for category in PoolCategory::ALL {
        if let Some(ledger) = state
            .ledger_repo
            .load_ledger(player, category)
            .await
            .map_err(AppError::storage)?
        {
            ledgers.push(ledger);
        }
    }
    Ok(ledgers)
}

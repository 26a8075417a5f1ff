use chrono::{Local, Utc};
use serde::Serialize;

use crate::commands::import_commands::load_all_ledgers;
use crate::{AppError, AppState};
use gacha_domain::formats::interchange::{self, ExportMetadata};
use gacha_domain::formats::legacy;
use gacha_domain::{Ledger, LedgerError, PlayerId, PoolCategory, Record};

#[derive(Debug, Clone, Serialize)]
pub struct HistorySnapshot {
    pub player_id: PlayerId,
    /// `false` means nothing was ever imported, as opposed to an empty slice.
    pub found: bool,
    pub ledgers: Vec<Ledger>,
}

#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub async fn load_history(
    state: &AppState,
    player: &PlayerId,
    category: Option<PoolCategory>,
) -> Result<HistorySnapshot, AppError> {
    let ledgers = match category {
        Some(category) => state
            .ledger_repo
            .load_ledger(player, category)
            .await
            .map_err(AppError::storage)?
            .into_iter()
            .collect(),
        None => load_all_ledgers(state, player).await?,
    };
    Ok(HistorySnapshot {
        player_id: player.clone(),
        found: !ledgers.is_empty(),
        ledgers,
    })
}

/// Records in ledger order, category by category.
pub async fn export_records(
    state: &AppState,
    player: &PlayerId,
    category: Option<PoolCategory>,
) -> Result<Vec<Record>, AppError> {
    let snapshot = load_history(state, player, category).await?;
    if !snapshot.found {
        return Err(LedgerError::NoHistory(player.clone()).into());
    }
    Ok(snapshot
        .ledgers
        .into_iter()
        .flat_map(Ledger::into_records)
        .collect())
}

/// Current-version interchange file of every category.
pub async fn export_all(state: &AppState, player: &PlayerId) -> Result<ExportFile, AppError> {
    let records = export_records(state, player, None).await?;
    let meta = ExportMetadata {
        player_id: player.clone(),
        lang: state.config.lang.clone(),
        export_app: state.config.export_app.clone(),
        export_app_version: state.config.export_app_version.clone(),
        exported_at: Utc::now(),
    };
    let bytes = interchange::encode(&records, &meta)?;
    Ok(ExportFile {
        file_name: interchange::export_file_name(player, &Local::now().naive_local()),
        bytes,
    })
}

/// Legacy table for tools that only read the tabular layout.
pub async fn export_legacy(state: &AppState, player: &PlayerId) -> Result<ExportFile, AppError> {
    let records = export_records(state, player, None).await?;
    let bytes = legacy::encode(&records, Some(player), &state.config.export_app)?;
    Ok(ExportFile {
        file_name: format!("legacy_{}.json", player),
        bytes,
    })
}

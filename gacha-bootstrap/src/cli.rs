use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use gacha_application::commands::{history_commands, import_commands, migrate_commands};
use gacha_application::queries::{history_queries, report_queries};
use gacha_application::AppState;
use gacha_domain::{PlayerId, PoolCategory};
use gacha_infrastructure::{write_atomic, SnapshotLiveSource};

#[derive(Parser, Debug)]
#[command(name = "gacha-ledger")]
#[command(about = "Gacha history ledger and pity analysis", long_about = None)]
pub struct Args {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Import an interchange or legacy history file
    Import {
        #[arg(short, long, value_parser = parse_player)]
        player: PlayerId,
        file: PathBuf,
    },
    /// Import a captured live API response
    ImportLive {
        #[arg(short, long, value_parser = parse_player)]
        player: PlayerId,
        file: PathBuf,
    },
    Export {
        #[arg(short, long, value_parser = parse_player)]
        player: PlayerId,
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Interchange)]
        format: ExportFormat,
        /// Output path; defaults to the generated file name in the current directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Pity counters for one category
    Report {
        #[arg(short, long, value_parser = parse_player)]
        player: PlayerId,
        #[arg(long, value_parser = parse_category)]
        category: PoolCategory,
        #[arg(long)]
        record_id: Option<String>,
    },
    /// Per-banner-window statistics for one category
    Pools {
        #[arg(short, long, value_parser = parse_player)]
        player: PlayerId,
        #[arg(long, value_parser = parse_category)]
        category: PoolCategory,
    },
    FiveStar {
        #[arg(short, long, value_parser = parse_player)]
        player: PlayerId,
    },
    /// Delete one category, or the whole history when no category is given
    Delete {
        #[arg(short, long, value_parser = parse_player)]
        player: PlayerId,
        #[arg(long, value_parser = parse_category)]
        category: Option<PoolCategory>,
    },
    /// Copy history that only exists under an old player id to a new one
    Migrate {
        #[arg(long, value_parser = parse_player)]
        from: PlayerId,
        #[arg(long, value_parser = parse_player)]
        to: PlayerId,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Interchange,
    Legacy,
}

fn parse_player(raw: &str) -> Result<PlayerId, String> {
    PlayerId::parse(raw).map_err(|err| err.to_string())
}

fn parse_category(raw: &str) -> Result<PoolCategory, String> {
    raw.parse()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn execute(state: &AppState, command: Command) -> Result<()> {
    match command {
        Command::Serve => Ok(()),
        Command::Import { player, file } => {
            let bytes = tokio::fs::read(&file).await?;
            let summary = import_commands::import_file(state, &player, &bytes).await?;
            print_json(&summary)
        }
        Command::ImportLive { player, file } => {
            let source = SnapshotLiveSource::from_file(&file).await?;
            let summary = import_commands::import_from_live_source(state, &player, &source).await?;
            print_json(&summary)
        }
        Command::Export { player, format, out } => {
            let export = match format {
                ExportFormat::Interchange => history_queries::export_all(state, &player).await?,
                ExportFormat::Legacy => history_queries::export_legacy(state, &player).await?,
            };
            let path = out.unwrap_or_else(|| PathBuf::from(&export.file_name));
            write_atomic(&path, &export.bytes).await?;
            info!("exported history of {} to {}", player, path.display());
            Ok(())
        }
        Command::Report {
            player,
            category,
            record_id,
        } => match record_id {
            Some(record_id) => {
                let point = report_queries::get_pity_at(state, &player, category, &record_id).await?;
                print_json(&point)
            }
            None => print_json(&report_queries::get_pity_report(state, &player, category).await?),
        },
        Command::Pools { player, category } => {
            print_json(&report_queries::get_pool_report(state, &player, category).await?)
        }
        Command::FiveStar { player } => {
            print_json(&report_queries::get_five_star_overview(state, &player).await?)
        }
        Command::Delete { player, category } => {
            let deleted = history_commands::delete_history(state, &player, category).await?;
            print_json(&serde_json::json!({ "deleted": deleted }))
        }
        Command::Migrate { from, to } => {
            print_json(&migrate_commands::migrate(state, &from, &to).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let args = Args::try_parse_from(["gacha-ledger"]).expect("args");
        assert!(args.command.is_none());
        assert!(args.config.is_none());
    }

    #[test]
    fn import_takes_player_and_file() {
        let args = Args::try_parse_from([
            "gacha-ledger",
            "--config",
            "ledger.toml",
            "import",
            "--player",
            "100000001",
            "export.json",
        ])
        .expect("args");
        assert_eq!(args.config.as_deref(), Some("ledger.toml"));
        assert_eq!(
            args.command,
            Some(Command::Import {
                player: PlayerId("100000001".to_string()),
                file: PathBuf::from("export.json"),
            })
        );
    }

    #[test]
    fn categories_and_players_are_validated() {
        let args = Args::try_parse_from([
            "gacha-ledger",
            "report",
            "-p",
            "100000001",
            "--category",
            "weapon",
        ])
        .expect("args");
        assert!(matches!(
            args.command,
            Some(Command::Report { category: PoolCategory::Weapon, record_id: None, .. })
        ));

        assert!(Args::try_parse_from(["gacha-ledger", "five-star", "-p", "abc"]).is_err());
        assert!(Args::try_parse_from([
            "gacha-ledger",
            "pools",
            "-p",
            "100000001",
            "--category",
            "gold"
        ])
        .is_err());
    }

    #[test]
    fn export_defaults_to_interchange() {
        let args = Args::try_parse_from(["gacha-ledger", "export", "-p", "100000001"]).expect("args");
        assert!(matches!(
            args.command,
            Some(Command::Export { format: ExportFormat::Interchange, out: None, .. })
        ));
        let args = Args::try_parse_from([
            "gacha-ledger",
            "export",
            "-p",
            "100000001",
            "--format",
            "legacy",
            "--out",
            "old.json",
        ])
        .expect("args");
        assert!(matches!(
            args.command,
            Some(Command::Export { format: ExportFormat::Legacy, .. })
        ));
    }

    #[test]
    fn migrate_takes_both_ids() {
        let args = Args::try_parse_from([
            "gacha-ledger",
            "migrate",
            "--from",
            "100000001",
            "--to",
            "100000002",
        ])
        .expect("args");
        assert_eq!(
            args.command,
            Some(Command::Migrate {
                from: PlayerId("100000001".to_string()),
                to: PlayerId("100000002".to_string()),
            })
        );
    }

    #[tokio::test]
    async fn import_live_of_another_players_capture_is_an_identity_mismatch() {
        use std::sync::Arc;

        use gacha_application::AppError;
        use gacha_domain::{ErrorCategory, LedgerRepository, MetadataRepository, RuntimeConfig};
        use gacha_infrastructure::{LedgerFileRepository, MetadataFileRepository};

        let dir = tempfile::tempdir().expect("tempdir");
        let metadata = MetadataFileRepository::new();
        let catalog = metadata.load_catalog(None).await.expect("catalog");
        let pools = metadata.load_pools(None).await.expect("pools");
        let repo = Arc::new(LedgerFileRepository::new(dir.path().join("ledgers")));
        let state = AppState::new(RuntimeConfig::default(), repo.clone(), catalog, pools);

        let capture = dir.path().join("live.json");
        let response = serde_json::json!({
            "playerId": "43",
            "pages": [{"cardPoolType": 1, "records": [
                {"id": "901", "name": "Danjin", "resourceId": 1602, "resourceType": "角色", "qualityLevel": 4, "count": 1, "time": "2024-05-23 10:00:00"},
            ]}],
        });
        tokio::fs::write(&capture, serde_json::to_vec(&response).expect("json"))
            .await
            .expect("write capture");

        let player = PlayerId("42".to_string());
        let err = execute(&state, Command::ImportLive { player: player.clone(), file: capture })
            .await
            .expect_err("identity mismatch");
        let category = err.downcast_ref::<AppError>().map(AppError::category);
        assert_eq!(category, Some(ErrorCategory::IdentityMismatch));
        for category in PoolCategory::ALL {
            assert!(repo.load_ledger(&player, category).await.expect("load").is_none());
        }
        assert!(repo.load_profile(&player).await.expect("load").is_none());
    }
}

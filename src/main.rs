// src/main.rs

use anyhow::Result;
use appcat::app::{INSTALL_DATE_UNKNOWN, INSTALL_DATE_UNSET};
use appcat::snapshot::Snapshot;
use appcat::{AppKind, AppState, IdentityKey, MergePolicy, Registry, SharedApp};
use chrono::DateTime;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use rayon::prelude::*;
use std::cmp::Reverse;
use std::io;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "appcat")]
#[command(author, version, about = "Merge application records from many backends into one catalog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every populated field of the merged records
    Dump {
        /// Backend snapshot files (JSON)
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,
        /// Only dump the record with this id
        #[arg(long)]
        id: Option<String>,
        /// Also merge name, summary and description between backends
        #[arg(long)]
        merge_text: bool,
    },
    /// List records by kudos percentage
    Rank {
        /// Backend snapshot files (JSON)
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,
        /// Number of records to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
        /// Also merge name, summary and description between backends
        #[arg(long)]
        merge_text: bool,
    },
    /// List records with a pending update
    Updates {
        /// Backend snapshot files (JSON)
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,
        /// Also merge name, summary and description between backends
        #[arg(long)]
        merge_text: bool,
    },
    /// Show the install/remove/update timeline of a record
    History {
        /// Backend snapshot files (JSON)
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,
        /// Record id, e.g. gimp.desktop
        #[arg(long)]
        id: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// One line of the kudos ranking
#[derive(Debug, Clone, PartialEq, Eq)]
struct RankRow {
    percentage: u32,
    id: String,
    name: Option<String>,
    state: AppState,
    kind: AppKind,
}

/// Load all snapshots and merge them into a fresh registry.
///
/// Snapshots are parsed in parallel, but merged one backend at a time in
/// the order given, so the first backend to report a key owns its record.
/// One unreadable file fails the run.
fn load_registry(paths: &[PathBuf], policy: MergePolicy) -> Result<Registry> {
    let batches = paths
        .par_iter()
        .map(|path| Snapshot::load(path).map(Snapshot::into_apps))
        .collect::<appcat::Result<Vec<_>>>()?;

    let registry = Registry::with_policy(policy);
    for app in batches.into_iter().flatten() {
        registry.merge(app);
    }

    info!("Catalog holds {} records", registry.len());
    Ok(registry)
}

fn policy(merge_text: bool) -> MergePolicy {
    MergePolicy {
        propagate_text: merge_text,
    }
}

fn find(registry: &Registry, id: &str) -> Result<SharedApp> {
    registry
        .get(&IdentityKey::new(id))
        .ok_or_else(|| anyhow::anyhow!("No record with id {}", id))
}

/// Highest kudos first, ties broken by id
fn ranked(registry: &Registry) -> Vec<RankRow> {
    let mut rows: Vec<RankRow> = registry
        .snapshot()
        .iter()
        .map(|shared| {
            let app = shared.read();
            RankRow {
                percentage: app.kudos_percentage(),
                id: app.id().to_string(),
                name: app.name().map(str::to_string),
                state: app.state(),
                kind: app.kind(),
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        Reverse(a.percentage)
            .cmp(&Reverse(b.percentage))
            .then_with(|| a.id.cmp(&b.id))
    });
    rows
}

/// Debug dumps of the given records, concatenated
fn dump(records: &[SharedApp]) -> String {
    records
        .iter()
        .map(|record| record.read().to_debug_string())
        .collect()
}

fn format_timestamp(timestamp: u64) -> String {
    match timestamp {
        INSTALL_DATE_UNSET => "never".to_string(),
        INSTALL_DATE_UNKNOWN => "unknown".to_string(),
        _ => DateTime::from_timestamp(timestamp as i64, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| timestamp.to_string()),
    }
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Dump {
            snapshots,
            id,
            merge_text,
        }) => {
            let registry = load_registry(&snapshots, policy(merge_text))?;
            let records = match id {
                Some(id) => vec![find(&registry, &id)?],
                None => registry.snapshot(),
            };
            print!("{}", dump(&records));
            Ok(())
        }
        Some(Commands::Rank {
            snapshots,
            limit,
            merge_text,
        }) => {
            let registry = load_registry(&snapshots, policy(merge_text))?;
            let rows = ranked(&registry);
            if rows.is_empty() {
                println!("No records found.");
                return Ok(());
            }

            for row in rows.iter().take(limit) {
                println!(
                    "{:>3}%  {}  [{}, {}]{}",
                    row.percentage,
                    row.id,
                    row.kind,
                    row.state,
                    row.name
                        .as_deref()
                        .map(|name| format!("  {}", name))
                        .unwrap_or_default()
                );
            }
            println!("\nTotal: {} record(s)", rows.len());
            Ok(())
        }
        Some(Commands::Updates {
            snapshots,
            merge_text,
        }) => {
            let registry = load_registry(&snapshots, policy(merge_text))?;
            let mut count = 0;
            for record in registry.snapshot() {
                let app = record.read();
                if app.state() != AppState::Updatable {
                    continue;
                }
                count += 1;
                println!(
                    "{}  {} -> {}",
                    app.id(),
                    app.version_ui().unwrap_or("?"),
                    app.update_version_ui().unwrap_or("?")
                );
                if let Some(details) = app.update_details() {
                    println!("  {}", details);
                }
            }

            if count == 0 {
                println!("No updates available.");
            } else {
                println!("\nTotal: {} update(s)", count);
            }
            Ok(())
        }
        Some(Commands::History { snapshots, id }) => {
            let registry = load_registry(&snapshots, MergePolicy::default())?;
            let record = find(&registry, &id)?;
            let app = record.read();

            if app.history().is_empty() {
                println!("No history for {}.", id);
                return Ok(());
            }

            println!("History of {}:", id);
            for entry in app.history() {
                println!(
                    "  {}  {:<12}  {}",
                    format_timestamp(entry.timestamp),
                    entry.state,
                    entry.version.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "appcat", &mut io::stdout());
            Ok(())
        }
        None => {
            println!("Appcat Application Catalog v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'appcat --help' for usage information");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_snapshot(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_flags_match_man_page() {
        let cli = Cli::command();

        let rank = cli.find_subcommand("rank").unwrap();
        let limit = rank
            .get_arguments()
            .find(|arg| arg.get_id() == "limit")
            .unwrap();
        assert_eq!(limit.get_short(), Some('l'));
        let defaults: Vec<String> = limit
            .get_default_values()
            .iter()
            .map(|value| value.to_string_lossy().into_owned())
            .collect();
        assert_eq!(defaults, ["20"]);

        let completions = cli.find_subcommand("completions").unwrap();
        let shell = completions
            .get_arguments()
            .find(|arg| arg.get_id() == "shell")
            .unwrap();
        let names: Vec<String> = shell
            .get_possible_values()
            .iter()
            .map(|value| value.get_name().to_string())
            .collect();
        assert_eq!(names, ["bash", "elvish", "fish", "powershell", "zsh"]);
    }

    #[test]
    fn test_load_registry_merges_backends() {
        let packagekit = write_snapshot(
            r#"{ "plugin": "packagekit", "apps": [
                { "id": "gimp.desktop", "state": "installed", "kind": "package",
                  "version": "2.8.10-1.fc20", "kudos": ["has-keywords"] },
                { "id": "zenity.desktop", "state": "available" }
            ] }"#,
        );
        let updates = write_snapshot(
            r#"{ "plugin": "packagekit-updates", "apps": [
                { "id": "gimp.desktop", "state": "updatable", "kind": "normal",
                  "update_version": "2.8.14-1.fc20", "kudos": ["has-screenshots"] }
            ] }"#,
        );

        let paths = vec![packagekit.path().to_path_buf(), updates.path().to_path_buf()];
        let registry = load_registry(&paths, MergePolicy::default()).unwrap();
        assert_eq!(registry.len(), 2);

        let gimp = find(&registry, "gimp.desktop").unwrap();
        let app = gimp.read();
        assert_eq!(app.kudos_percentage(), 25);
        assert_eq!(app.kind(), AppKind::Normal);
        assert_eq!(app.update_version(), Some("2.8.14-1.fc20"));
    }

    #[test]
    fn test_load_registry_merges_in_argument_order() {
        let installed = write_snapshot(
            r#"{ "plugin": "packagekit", "apps": [
                { "id": "gimp.desktop", "state": "installed",
                  "name": { "quality": "normal", "value": "GIMP" },
                  "version": "2:2.8.10-1.fc20" }
            ] }"#,
        );
        let updates = write_snapshot(
            r#"{ "plugin": "packagekit-updates", "apps": [
                { "id": "gimp.desktop", "state": "updatable",
                  "update_version": "2:2.8.14-1.fc20" }
            ] }"#,
        );
        let paths = vec![installed.path().to_path_buf(), updates.path().to_path_buf()];

        let first = dump(&load_registry(&paths, MergePolicy::default()).unwrap().snapshot());
        for _ in 0..16 {
            let again = dump(&load_registry(&paths, MergePolicy::default()).unwrap().snapshot());
            assert_eq!(again, first);
        }
        assert!(first.contains("\tname:\tGIMP\n"));
        assert!(first.contains("\tversion-ui:\t2.8.10\n"));
        assert!(first.contains("\tstate:\tupdatable\n"));

        // the first backend owns the record, so swapping the order loses
        // the fields the updates backend never reported
        let reversed: Vec<PathBuf> = paths.iter().rev().cloned().collect();
        let swapped = dump(&load_registry(&reversed, MergePolicy::default()).unwrap().snapshot());
        assert!(!swapped.contains("\tname:\tGIMP\n"));
        assert!(swapped.contains("\tstate:\tupdatable\n"));
    }

    #[test]
    fn test_load_registry_fails_on_bad_file() {
        let bad = write_snapshot("{");
        let result = load_registry(&[bad.path().to_path_buf()], MergePolicy::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_ranked_order() {
        let registry = Registry::new();
        for (id, kudo) in [
            ("b.desktop", appcat::Kudos::HAS_KEYWORDS),
            ("a.desktop", appcat::Kudos::HAS_KEYWORDS),
            ("c.desktop", appcat::Kudos::POPULAR),
        ] {
            let mut app = appcat::App::new(IdentityKey::new(id));
            app.add_kudo(kudo);
            registry.merge(app);
        }

        let ids: Vec<String> = ranked(&registry).into_iter().map(|row| row.id).collect();
        assert_eq!(ids, vec!["c.desktop", "a.desktop", "b.desktop"]);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(INSTALL_DATE_UNSET), "never");
        assert_eq!(format_timestamp(INSTALL_DATE_UNKNOWN), "unknown");
        assert_eq!(format_timestamp(1_400_000_000), "2014-05-13 16:53:20");
    }
}

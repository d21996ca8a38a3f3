// window-anchor: command-line driver for workspace snapshots
//
// Commands:
//   save <name> [--no-files]        capture the current desktop
//   restore <name> [--monitors a,b] restore a workspace (optionally projected)
//   switch <name>                   close everything, then restore
//   list                            list workspaces; '*' marks fingerprint match
//   delete <name> / rename <a> <b>  manage saved workspaces
//   recent <exe>                    recent documents the shell tracked for an app

#[cfg(windows)]
mod cli {
    use std::collections::HashSet;
    use std::sync::Arc;

    use anyhow::{bail, Context, Result};
    use tokio_util::sync::CancellationToken;

    use window_anchor::config::AppPaths;
    use window_anchor::display;
    use window_anchor::logging::FileLogger;
    use window_anchor::platform::windows::{
        ShellLauncher, Win32DisplaySystem, Win32WindowSystem, WindowsRegistry,
    };
    use window_anchor::progress::{Progress, ProgressSink};
    use window_anchor::resolver::handlers::HandlerCache;
    use window_anchor::resolver::jumplist::JumpListIndex;
    use window_anchor::resolver::search::SearchRoots;
    use window_anchor::resolver::RECENT_QUERY_POOL;
    use window_anchor::restore::{RestoreEngine, RestoreStatus};
    use window_anchor::snapshot::{SnapshotEngine, SnapshotRequest};
    use window_anchor::store::WorkspaceStore;

    struct ConsoleSink;

    impl ProgressSink for ConsoleSink {
        fn report(&self, progress: Progress) {
            match progress {
                Progress::IndexingRecentFiles => println!("indexing recent files..."),
                Progress::Window {
                    current,
                    total,
                    process_name,
                    ..
                } => println!("  [{}/{}] {}", current, total, process_name),
                Progress::Saving => println!("saving..."),
                Progress::RestorePhase { phase } => {
                    let label = match phase {
                        1 => "matching open windows",
                        2 => "launching missing applications",
                        3 => "waiting for applications to start",
                        4 => "matching new windows",
                        5 => "final pass",
                        _ => "working",
                    };
                    println!("phase {}: {}", phase, label);
                }
                Progress::ClosingWindows { remaining } => {
                    println!("waiting for {} window(s) to close", remaining)
                }
            }
        }
    }

    pub async fn run() -> Result<()> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let Some(command) = args.first().map(|s| s.as_str()) else {
            print_usage();
            return Ok(());
        };

        let paths = AppPaths::from_env();
        FileLogger::install(paths.log_file());
        let store = WorkspaceStore::open(paths.clone())?;

        let windows = Arc::new(Win32WindowSystem::new());
        let displays = Arc::new(Win32DisplaySystem::new());
        let registry = Arc::new(WindowsRegistry::new());
        let handlers = Arc::new(HandlerCache::new());

        match command {
            "save" => {
                let name = arg(&args, 1, "save <name>")?;
                let save_files = !args.iter().any(|a| a == "--no-files");
                let engine = SnapshotEngine::new(
                    windows,
                    displays,
                    registry,
                    handlers,
                    paths,
                    SearchRoots::discover(),
                );
                let snapshot = engine.take_snapshot(
                    &store,
                    SnapshotRequest {
                        name: &name,
                        save_files,
                        selected_windows: None,
                        progress: Some(&ConsoleSink),
                    },
                )?;
                println!(
                    "saved '{}': {} windows on fingerprint {}",
                    snapshot.name,
                    snapshot.entries.len(),
                    snapshot.monitor_fingerprint
                );
            }
            "restore" | "switch" => {
                let name = arg(&args, 1, "restore <name>")?;
                let mut snapshot = store.load(&name)?;
                let engine = RestoreEngine::new(windows, Arc::new(ShellLauncher::new()));
                let cancel = CancellationToken::new();

                if command == "restore" {
                    let monitor_ids = parse_monitor_filter(&args);
                    let mut projected =
                        RestoreEngine::select_monitors(&snapshot, monitor_ids.as_ref());
                    let outcome = engine
                        .restore(&mut projected, &cancel, Some(&ConsoleSink))
                        .await?;
                    report_outcome(&name, outcome);
                } else {
                    let outcome = engine
                        .switch(&mut snapshot, &cancel, Some(&ConsoleSink))
                        .await?;
                    report_outcome(&name, outcome);
                }
                store.write_last_fingerprint(&snapshot.monitor_fingerprint);
            }
            "list" => {
                let current = display::fingerprint::compute(displays.as_ref());
                for snapshot in store.list() {
                    let marker = if snapshot.monitor_fingerprint == current {
                        "*"
                    } else {
                        " "
                    };
                    println!(
                        "{} {:<24} {} windows  saved {}",
                        marker,
                        snapshot.name,
                        snapshot.entries.len(),
                        snapshot.saved_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
            "delete" => {
                let name = arg(&args, 1, "delete <name>")?;
                store.delete(&name)?;
                println!("deleted '{}'", name);
            }
            "rename" => {
                let old = arg(&args, 1, "rename <old> <new>")?;
                let new = arg(&args, 2, "rename <old> <new>")?;
                store.rename(&old, &new)?;
                println!("renamed '{}' to '{}'", old, new);
            }
            "recent" => {
                let exe = arg(&args, 1, "recent <executable-path>")?;
                let mut index =
                    JumpListIndex::build(paths.recent_destinations_dir(), registry.as_ref(), &handlers);
                for path in index.recent_files_for_app(&exe, RECENT_QUERY_POOL) {
                    println!("{}", path);
                }
            }
            other => {
                print_usage();
                bail!("unknown command '{}'", other);
            }
        }
        Ok(())
    }

    fn arg(args: &[String], index: usize, usage: &str) -> Result<String> {
        args.get(index)
            .filter(|a| !a.starts_with("--"))
            .cloned()
            .with_context(|| format!("usage: window-anchor {}", usage))
    }

    fn parse_monitor_filter(args: &[String]) -> Option<HashSet<String>> {
        let position = args.iter().position(|a| a == "--monitors")?;
        let ids = args.get(position + 1)?;
        Some(ids.split(',').map(|s| s.trim().to_string()).collect())
    }

    fn report_outcome(name: &str, outcome: window_anchor::restore::RestoreOutcome) {
        match outcome.status {
            RestoreStatus::Completed => println!(
                "restored '{}': {} matched, {} launched",
                name, outcome.matched, outcome.launched
            ),
            RestoreStatus::Cancelled => println!("restore of '{}' cancelled", name),
            RestoreStatus::SwitchTimedOut => {
                println!("switch cancelled: windows still open (unsaved changes?)")
            }
        }
    }

    fn print_usage() {
        println!("usage: window-anchor <save|restore|switch|list|delete|rename|recent> [args]");
    }
}

#[cfg(windows)]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::run().await
}

#[cfg(not(windows))]
fn main() {
    eprintln!("window-anchor manages Windows desktop workspaces and only runs on Windows.");
    std::process::exit(1);
}

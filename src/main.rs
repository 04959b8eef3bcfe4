use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::broadcast;

use feedtree::config::Config;
use feedtree::domain::{SidebarItemId, SidebarSource, Snapshot};
use feedtree::events::{EventHub, SidebarEvent, SnapshotWatcher};
use feedtree::outline::{ExpansionState, Outline};
use feedtree::tree::{FolderTree, NodeStore, Represented, SidebarTree};
use feedtree::util::truncate_to_width;

/// Get the config directory path (~/.config/feedtree/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("feedtree"))
}

#[derive(Parser, Debug)]
#[command(name = "feedtree", about = "Feed reader sidebar tree, reconciled from a snapshot")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the sidebar outline for a snapshot
    Show {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print the folder picker tree instead of the sidebar
        #[arg(long)]
        folders: bool,

        /// Collapse folders (sections stay expanded)
        #[arg(long)]
        collapsed: bool,
    },

    /// Re-reconcile whenever the snapshot file changes, until Ctrl-C
    Watch {
        #[command(flatten)]
        filter: FilterArgs,

        /// Polling interval in seconds (overrides config)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
    },
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Snapshot file (.json, or TOML otherwise)
    #[arg(value_name = "SNAPSHOT")]
    snapshot: PathBuf,

    /// Hide feeds and folders without unread articles
    #[arg(long)]
    hide_read: bool,

    /// Keep an item visible while read feeds are hidden (e.g. feed:local/42)
    #[arg(long = "except", value_name = "TYPE:ID")]
    exceptions: Vec<SidebarItemId>,
}

impl FilterArgs {
    fn apply<S: SidebarSource>(&self, tree: &mut SidebarTree<S>, config: &Config) {
        tree.set_read_filtered(self.hide_read || config.hide_read_feeds);
        for id in config.filter_exceptions.iter().chain(&self.exceptions) {
            tree.add_filter_exception(id.clone());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = get_config_dir()?.join("config.toml");
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    match cli.command {
        Command::Show {
            filter,
            folders,
            collapsed,
        } => show(&config, &filter, folders, collapsed),
        Command::Watch { filter, interval } => {
            let interval = Duration::from_secs(interval.unwrap_or(config.watch_interval_secs));
            watch(&config, &filter, interval).await
        }
    }
}

fn load_snapshot(path: &Path) -> Result<Snapshot> {
    Snapshot::load(path).with_context(|| format!("Failed to load snapshot {}", path.display()))
}

fn show(config: &Config, filter: &FilterArgs, folders: bool, collapsed: bool) -> Result<()> {
    let snapshot = load_snapshot(&filter.snapshot)?;

    if folders {
        let tree = FolderTree::with_source(&snapshot)?;
        let store = tree.store();
        let mut lines = Vec::new();
        store.visit(store.root(), |id, node| {
            if node.is_root() {
                return;
            }
            let depth = store.level(id).unwrap_or(1).saturating_sub(1);
            lines.push(format!(
                "{}{}",
                "  ".repeat(depth),
                label(&snapshot, node.represented(), config.max_name_width)
            ));
        });
        for line in lines {
            println!("{line}");
        }
        return Ok(());
    }

    let mut tree = SidebarTree::with_source(&snapshot)?;
    filter.apply(&mut tree, config);
    tree.rebuild()?;

    let expansion = expansion_for(tree.store(), config, collapsed);
    let outline = Outline::build(tree.store(), &expansion)?;
    print_outline(&snapshot, tree.store(), &outline, config.max_name_width);
    Ok(())
}

async fn watch(config: &Config, filter: &FilterArgs, interval: Duration) -> Result<()> {
    let path = filter.snapshot.clone();
    let mut snapshot = load_snapshot(&path)?;
    let mut account_active = snapshot.active_account().is_some();

    let mut tree = SidebarTree::with_source(snapshot.clone())?;
    filter.apply(&mut tree, config);
    tree.rebuild()?;

    let mut expansion = expansion_for(tree.store(), config, false);
    let mut outline = Outline::build(tree.store(), &expansion)?;
    print_outline(&snapshot, tree.store(), &outline, config.max_name_width);

    let hub = EventHub::default();
    let mut rx = hub.subscribe();
    let watcher = SnapshotWatcher::new(&path, interval, hub.clone());
    let watcher_task = tokio::spawn(watcher.run());

    tracing::info!(path = %path.display(), ?interval, "Watching snapshot");

    loop {
        let event = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = rx.recv() => event,
        };

        match event {
            Ok(SidebarEvent::SnapshotChanged) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            Ok(SidebarEvent::AccountActivityChanged { active }) => {
                tracing::info!(active, "Default account activity changed");
                continue;
            }
            Ok(SidebarEvent::FilterChanged) => {}
            Err(broadcast::error::RecvError::Closed) => break,
        }

        let next = match Snapshot::load(&path) {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable snapshot");
                continue;
            }
        };

        let active = next.active_account().is_some();
        if active != account_active {
            account_active = active;
            hub.publish(SidebarEvent::AccountActivityChanged { active });
        }

        snapshot = next;
        if !tree.update_source(snapshot.clone())? {
            // Names or unread counts may still differ
            tracing::debug!("Snapshot changed without moving any node");
        }

        if config.expanded_sections {
            expansion.expand_all_sections_and_folders(tree.store());
        } else {
            expand_sections(&mut expansion, tree.store());
        }
        let next_outline = Outline::build(tree.store(), &expansion)?;
        let changes = next_outline.changes_from(&outline);
        for section in changes.rows.iter().filter(|c| !c.is_empty()) {
            tracing::info!(
                section = section.section,
                inserts = section.rows.inserts.len(),
                deletes = section.rows.deletes.len(),
                moves = section.rows.moves.len(),
                reloads = section.reloads.len(),
                "Section rows changed"
            );
        }
        outline = next_outline;

        println!();
        print_outline(&snapshot, tree.store(), &outline, config.max_name_width);
    }

    watcher_task.abort();
    Ok(())
}

fn expand_sections(expansion: &mut ExpansionState, store: &NodeStore) {
    for &section in store.children(store.root()).unwrap_or_default() {
        if let Ok(represented) = store.represented(section) {
            expansion.expand(represented.clone());
        }
    }
}

fn expansion_for(store: &NodeStore, config: &Config, collapsed: bool) -> ExpansionState {
    let mut expansion = ExpansionState::new();
    if config.expanded_sections && !collapsed {
        expansion.expand_all_sections_and_folders(store);
    } else {
        expand_sections(&mut expansion, store);
    }
    expansion
}

fn print_outline(snapshot: &Snapshot, store: &NodeStore, outline: &Outline, max_width: usize) {
    for section in outline.sections() {
        println!("{}", label(snapshot, &section.key, max_width));
        for row in &section.rows {
            let Ok(represented) = store.represented(row.node) else {
                continue;
            };
            let marker = match (represented.is_folder(), row.expanded) {
                (true, true) => "▾ ",
                (true, false) => "▸ ",
                _ => "",
            };
            println!(
                "{}{}{}",
                "  ".repeat(row.depth + 1),
                marker,
                label(snapshot, represented, max_width)
            );
        }
    }
}

fn label(snapshot: &Snapshot, represented: &Represented, max_width: usize) -> String {
    let (name, unread) = match represented {
        Represented::Root => (String::new(), 0),
        Represented::SmartFeeds => ("Smart Feeds".to_string(), 0),
        Represented::Account(id) => match snapshot.account(id) {
            Some(account) => (account.name.clone(), 0),
            None => (id.to_string(), 0),
        },
        Represented::Item(id) => match snapshot.item(id) {
            Some(item) => (item.name, item.unread_count),
            None => (id.to_string(), 0),
        },
    };

    let name = if max_width == 0 {
        name
    } else {
        truncate_to_width(&name, max_width).into_owned()
    };
    if unread > 0 {
        format!("{name} ({unread})")
    } else {
        name
    }
}

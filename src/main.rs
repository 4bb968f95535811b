//! telerelay CLI entry point.
//!
//! `start` runs the relay bot; `check` inspects the relay database and exits.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use teloxide::Bot;
use tokio::sync::Mutex;
use tracing::info;

use telerelay::commands::{AdminList, CommandRouter};
use telerelay::config::{self, Config, RuntimePaths};
use telerelay::relay::{GraphSync, Transport};
use telerelay::store::{FilterMode, RelayStore, SqliteStore};
use telerelay::telegram::{run_telegram, TelegramTransport};

/// telerelay: relay messages between Telegram channels.
#[derive(Parser)]
#[command(name = "telerelay", version, about)]
struct Cli {
    /// Config file (default `~/.telerelay/config.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Run the relay bot until Ctrl+C.
    Start,
    /// Report relay database contents and verify the graph has no loops.
    Check {
        /// Database to inspect instead of the configured one.
        #[arg(long)]
        database: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let paths = config::runtime_paths()?;

    match cli.command {
        Command::Start => handle_start(&paths, cli.config.as_deref()).await,
        Command::Check { database } => {
            handle_check(&paths, cli.config.as_deref(), database).await
        }
    }
}

fn load_config(paths: &RuntimePaths, override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = override_path.unwrap_or(&paths.config_toml);
    config::load_config(path)
}

/// Run the relay: open the store, rebuild subscriptions, dispatch updates.
async fn handle_start(paths: &RuntimePaths, config_path: Option<&Path>) -> anyhow::Result<()> {
    let _logging_guard = telerelay::logging::init_production(&paths.logs_dir)?;

    let config = load_config(paths, config_path)?;
    let credentials = telerelay::credentials::load_credentials(&paths.env_file)
        .with_context(|| format!("failed to load {}", paths.env_file.display()))?;
    let token = credentials.require(&config.telegram.bot_token_env)?;

    let db_path = config.database_path(paths);
    let store: Arc<dyn RelayStore> = Arc::new(SqliteStore::open(&db_path).await?);

    let bot = Bot::new(token);
    let transport = Arc::new(TelegramTransport::new(bot.clone()));

    let mut sync = GraphSync::new(
        Arc::clone(&store),
        Arc::clone(&transport) as Arc<dyn Transport>,
    );
    let report = sync
        .resync()
        .await
        .context("initial subscription sync failed")?;

    info!(
        database = %db_path.display(),
        admins = config.telegram.admin_users.len(),
        subscriptions = report.registered,
        "telerelay started"
    );

    let router = Arc::new(CommandRouter::new(
        Arc::new(Mutex::new(sync)),
        store,
        AdminList::new(config.telegram.admin_users.iter().copied()),
    ));

    run_telegram(bot, transport, router).await
}

/// Summary printed by `check`.
#[derive(Debug, Serialize)]
struct CheckReport {
    database: String,
    channels: usize,
    edges: usize,
    blacklist: usize,
    replacements: usize,
    link_removers: usize,
    acyclic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    loop_path: Option<Vec<String>>,
}

/// Inspect the relay database and print a JSON report.
async fn handle_check(
    paths: &RuntimePaths,
    config_path: Option<&Path>,
    database: Option<PathBuf>,
) -> anyhow::Result<()> {
    telerelay::logging::init_cli();

    let db_path = match database {
        Some(path) => path,
        None if config_path.is_some() || paths.config_toml.exists() => {
            load_config(paths, config_path)?.database_path(paths)
        }
        None => paths.database.clone(),
    };

    let store = SqliteStore::open(&db_path).await?;
    let graph = store.load_graph().await?;
    let filters = store.list_filters().await?;
    let count = |mode: FilterMode| filters.iter().filter(|f| f.mode == mode).count();
    let cycle = graph.find_any_cycle();

    let report = CheckReport {
        database: db_path.display().to_string(),
        channels: graph.len(),
        edges: graph.edge_count(),
        blacklist: count(FilterMode::Blacklist),
        replacements: count(FilterMode::Replacement),
        link_removers: count(FilterMode::LinkRemover),
        acyclic: cycle.is_none(),
        loop_path: cycle.as_deref().map(|ids| graph.names(ids)),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(path) = report.loop_path {
        anyhow::bail!("relay graph contains a loop: {}", path.join(" -> "));
    }
    Ok(())
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use adrenaline_common::{GameId, GameInfo, StoreEvent};
use adrenaline_process::{Restarter, SysinfoProcessTable};
use adrenaline_store::{FsDatabaseIo, GameDatabaseStore, NotifyWatcher, RandomIdSource, StoreConfig};
use anyhow::{bail, Context};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;

use config::FileConfig;

const USAGE: &str = "\
Usage: adrenaline-games <command> [--config <file.toml>] [--db <gmdb.blb>]

Commands:
  list [--json]                          show the games Adrenaline displays
  add --title <t> --command <c> [--exe <path>] [--image <path>] [--id <guid>]
  update <guid> [--title <t>] [--command <c>] [--exe <path>] [--image <path>]
                [--hidden true|false] [--manual true|false]
  restart                                restart Adrenaline to pick up changes
  watch                                  print the list every time it changes";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("list");

    let file_config = match parse_flag_string(&args, "--config") {
        Some(path) => {
            debug!(%path, "loading config file");
            FileConfig::load(Path::new(&path))?
        }
        None => FileConfig::default(),
    };
    let mut store_config = file_config.store_config();
    if let Some(db) = parse_flag_string(&args, "--db") {
        store_config.database_path = PathBuf::from(db);
    }
    debug!(path = %store_config.database_path.display(), write_mode = ?store_config.write_mode, "using Adrenaline data file");

    match cmd {
        "list" => run_list(store_config, args.iter().any(|a| a == "--json")).await?,
        "add" => run_add(&args, store_config).await?,
        "update" => run_update(&args, store_config).await?,
        "restart" => {
            let store = GameDatabaseStore::open(
                store_config.clone(),
                Arc::new(FsDatabaseIo::new(store_config.write_mode)),
                Box::new(RandomIdSource),
            )
            .await;
            run_restart(&store, file_config.restart_config()).await?
        }
        "watch" => run_watch(store_config).await?,
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn parse_flag_string(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_flag_bool(args: &[String], flag: &str) -> anyhow::Result<Option<bool>> {
    parse_flag_string(args, flag)
        .map(|v| v.parse::<bool>())
        .transpose()
        .with_context(|| format!("{flag} expects true or false"))
}

fn require_flag(args: &[String], flag: &str) -> anyhow::Result<String> {
    parse_flag_string(args, flag).with_context(|| format!("missing {flag}\n\n{USAGE}"))
}

/// Open the store and insist the database could be read.
async fn open_store(config: StoreConfig) -> anyhow::Result<GameDatabaseStore> {
    let io = Arc::new(FsDatabaseIo::new(config.write_mode));
    let store = GameDatabaseStore::open(config, io, Box::new(RandomIdSource)).await;
    if !store.is_loaded() {
        bail!("could not load Adrenaline data file {}", store.path().display());
    }
    Ok(store)
}

fn print_games(games: &[GameInfo]) {
    if games.is_empty() {
        println!("(no games)");
        return;
    }
    for game in games {
        let manual = if game.is_manual { " [manual]" } else { "" };
        println!("{}  {}{manual}", game.id, game.display_name);
        match game.packaged_app() {
            Some(app) => println!("    app: {app}"),
            None if !game.command_line.is_empty() => println!("    command: {}", game.command_line),
            None => {}
        }
        if !game.exe_path.is_empty() {
            println!("    exe: {}", game.exe_path);
        }
    }
}

async fn run_list(config: StoreConfig, json: bool) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let games = store.games();
    if json {
        println!("{}", serde_json::to_string_pretty(games.as_slice())?);
    } else {
        print_games(&games);
    }
    Ok(())
}

async fn run_add(args: &[String], config: StoreConfig) -> anyhow::Result<()> {
    let store = open_store(config).await?;

    let id = match parse_flag_string(args, "--id") {
        Some(text) => GameId::parse(&text)?,
        None => GameId::NIL,
    };
    let game = GameInfo {
        id,
        display_name: require_flag(args, "--title")?,
        command_line: require_flag(args, "--command")?,
        exe_path: parse_flag_string(args, "--exe").unwrap_or_default(),
        image_path: parse_flag_string(args, "--image").unwrap_or_default(),
        is_manual: true,
        is_hidden: false,
    };

    let id = store.add(game).await.context("failed to add game")?;
    println!("Added {id}. Run `adrenaline-games restart` for Adrenaline to show it.");
    Ok(())
}

async fn run_update(args: &[String], config: StoreConfig) -> anyhow::Result<()> {
    let store = open_store(config).await?;

    let id_text = match args.get(2) {
        Some(text) if !text.starts_with("--") => text,
        _ => bail!("missing game id\n\n{USAGE}"),
    };
    let id = GameId::parse(id_text)?;
    let mut game = store
        .games()
        .iter()
        .find(|g| g.id == id)
        .cloned()
        .with_context(|| format!("no visible game with id {id}"))?;

    if let Some(title) = parse_flag_string(args, "--title") {
        game.display_name = title;
    }
    if let Some(command) = parse_flag_string(args, "--command") {
        game.command_line = command;
    }
    if let Some(exe) = parse_flag_string(args, "--exe") {
        game.exe_path = exe;
    }
    if let Some(image) = parse_flag_string(args, "--image") {
        game.image_path = image;
    }
    if let Some(hidden) = parse_flag_bool(args, "--hidden")? {
        game.is_hidden = hidden;
    }
    if let Some(manual) = parse_flag_bool(args, "--manual")? {
        game.is_manual = manual;
    }

    store.save(game).await.context("failed to update game")?;
    println!("Updated {id}. Run `adrenaline-games restart` for Adrenaline to show it.");
    Ok(())
}

async fn run_restart(store: &GameDatabaseStore, config: adrenaline_process::RestartConfig) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let restarter = Restarter::new(config, SysinfoProcessTable::new()).with_cancellation(cancel);
    println!("Restarting Adrenaline...");
    if store.restart_adrenaline(&restarter).await {
        println!("Adrenaline restarted.");
    } else {
        println!("Adrenaline restart likely failed. Check that it is running.");
    }
    Ok(())
}

async fn run_watch(config: StoreConfig) -> anyhow::Result<()> {
    let store = Arc::new(open_store(config).await?);
    let mut events = store.subscribe();
    let handle = store
        .watch(&NotifyWatcher, CancellationToken::new())
        .context("failed to watch Adrenaline data file")?;

    println!("Watching {} (Ctrl-C to stop)\n", store.path().display());
    print_games(&store.games());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(StoreEvent::GamesChanged) | Err(RecvError::Lagged(_)) => {
                    println!("\n--- games changed ---");
                    print_games(&store.games());
                }
                Ok(StoreEvent::RestartRequiredChanged) => {}
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.stop().await;
    Ok(())
}

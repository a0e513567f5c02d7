//! Plume - a single-author blog engine backed by one JSON document.

mod cli;
mod config;
mod generator;
mod init;
mod logger;
mod model;
mod router;
mod serve;
mod storage;
mod web;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use config::{BackendKind, PlumeConfig};
use init::new_site;
use serve::serve_site;
use std::path::Path;
use storage::{ContentStore, HttpStorage, LocalStorage};
use web::{
    App, Web,
    notify::Notifier,
    render::CommonMark,
    session::{Credentials, Sessions, hash_password},
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Passhash { password } = &cli.command {
        println!("{}", hash_password(password));
        return Ok(());
    }

    let config = load_config(&cli)?;
    match &cli.command {
        Commands::Init => new_site(&config),
        Commands::Serve { .. } => serve_site(&config, build_web(&config)?),
        Commands::Passhash { .. } => Ok(()),
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<PlumeConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() {
        PlumeConfig::from_path(&config_path)?
    } else {
        PlumeConfig::default()
    };
    config.update_with_cli(cli);

    // Validate config state based on command
    let config_exists = config.config_path.exists();
    match (cli.is_init(), config_exists) {
        (true, true) => {
            bail!("Config file already exists. Remove it manually or init in a different path.")
        }
        (false, false) => bail!("Config file not found. Run `plume init` first."),
        _ => {}
    }

    if !cli.is_init() {
        config.validate()?;
    }

    Ok(config)
}

/// Wire storage, sessions and routes together. Fails if the first load does.
fn build_web(config: &PlumeConfig) -> Result<Web> {
    let ttl = config.cache_ttl();
    let pretty = config.dev.local;

    let store = match config.storage.backend {
        BackendKind::Local => ContentStore::new(LocalStorage::new(&config.storage.site_path), ttl, pretty),
        BackendKind::Http => {
            let url = config.storage.url.clone().unwrap_or_default();
            ContentStore::new(HttpStorage::new(url, config.storage.token())?, ttl, pretty)
        }
    }
    .context("failed to load site")?;

    if config.auth.password_hash.is_empty() {
        log!("login"; "[auth] password_hash is empty, the dashboard is unreachable");
    }

    let app = App {
        store,
        sessions: Sessions::new(
            config.auth.session_cookie.clone(),
            config.session_lifetime(),
            !config.dev.local,
        ),
        credentials: Credentials::new(config.auth.username.clone(), config.auth.password_hash.clone()),
        markdown: Box::new(CommonMark),
        notifier: Notifier::new(config.dev.local),
        local: config.dev.local,
    };
    Ok(Web::new(app))
}

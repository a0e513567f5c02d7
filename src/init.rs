//! Project initialization.
//!
//! Writes a default `plume.toml` and an empty site document.

use crate::{config::PlumeConfig, log, model::Site};
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Create the config file and site document, refusing to overwrite either.
pub fn new_site(config: &PlumeConfig) -> Result<()> {
    let site_path = &config.storage.site_path;
    for path in [&config.config_path, site_path] {
        if path.exists() {
            bail!(
                "`{}` already exists. Remove it manually or init in a different path.",
                path.display()
            );
        }
    }

    init_default_config(&config.config_path)?;
    init_site_document(site_path)?;

    log!("init"; "wrote {}", config.config_path.display());
    log!("init"; "wrote {}", site_path.display());
    log!("init"; "set [auth] password_hash with `plume passhash <password>`");
    Ok(())
}

/// Write default configuration file
fn init_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&PlumeConfig::default())?;
    write_creating_parents(path, &content)
}

fn init_site_document(path: &Path) -> Result<()> {
    let mut site = Site::default();
    site.apply_defaults();
    site.touch();
    let content = serde_json::to_string_pretty(&site)?;
    write_creating_parents(path, &content)
}

fn write_creating_parents(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

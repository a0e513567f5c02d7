//! Configuration for `plume.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[server]`  | Listener (interface, port, workers, timeout)     |
//! | `[storage]` | Where the site document lives (file or URL)      |
//! | `[cache]`   | How long a loaded document stays fresh           |
//! | `[auth]`    | Operator credentials and session cookie          |
//! | `[dev]`     | Local development switches                       |
//!
//! Everything else (title, URL, posts, styles) lives in the site document
//! itself and is edited from the dashboard.
//!
//! # Example
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [storage]
//! site_path = "storage/site.json"
//!
//! [cache]
//! ttl = "1m"
//!
//! [auth]
//! username = "admin"
//! password_hash = "<output of `plume passhash`>"
//! ```

mod auth;
pub mod defaults;
mod error;
mod server;
mod storage;

pub use storage::BackendKind;

use auth::{AuthConfig, DevConfig};
use error::ConfigError;
use server::ServerConfig;
use storage::{CacheConfig, StorageConfig};

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse a human-readable duration string.
///
/// Supports suffixes: ms, s, m, h. A bare number is seconds.
///
/// # Examples
/// ```ignore
/// parse_duration_string("500ms") // → Some(500 ms)
/// parse_duration_string("1m")    // → Some(60 s)
/// parse_duration_string("2h")    // → Some(7200 s)
/// parse_duration_string("soon")  // → None
/// ```
pub fn parse_duration_string(s: &str) -> Option<Duration> {
    let s = s.trim().to_ascii_lowercase();
    let (digits, unit_ms) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60_000)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3_600_000)
    } else {
        (s.as_str(), 1_000)
    };
    let value: u64 = digits.trim().parse().ok()?;
    Some(Duration::from_millis(value.checked_mul(unit_ms)?))
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing plume.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct PlumeConfig {
    /// Absolute project root (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub dev: DevConfig,
}

impl PlumeConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: PlumeConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Update configuration with CLI arguments and resolve paths against the root
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let root = Self::normalize_path(root);

        self.config_path = Self::normalize_path(&root.join(&cli.config));
        self.storage.site_path = Self::normalize_path(&root.join(&self.storage.site_path));
        self.root = root;

        if let Commands::Serve {
            interface,
            port,
            local,
        } = &cli.command
        {
            Self::update_option(&mut self.server.interface, interface.as_ref());
            Self::update_option(&mut self.server.port, port.as_ref());
            Self::update_option(&mut self.dev.local, local.as_ref());
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        parse_duration_string(&self.cache.ttl).unwrap_or(Duration::from_secs(60))
    }

    pub fn request_timeout(&self) -> Duration {
        parse_duration_string(&self.server.request_timeout).unwrap_or(Duration::from_secs(10))
    }

    pub fn session_lifetime(&self) -> Duration {
        parse_duration_string(&self.auth.session_lifetime).unwrap_or(Duration::from_secs(24 * 3600))
    }

    /// Validate configuration for serving
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("[cache.ttl]", &self.cache.ttl),
            ("[server.request_timeout]", &self.server.request_timeout),
            ("[auth.session_lifetime]", &self.auth.session_lifetime),
        ] {
            if parse_duration_string(value).is_none() {
                bail!(ConfigError::Validation(format!(
                    "{field} must be a duration like \"500ms\", \"30s\", \"1m\" or \"2h\", got `{value}`"
                )));
            }
        }

        if self.server.workers == 0 {
            bail!(ConfigError::Validation("[server.workers] must be at least 1".into()));
        }

        if self.storage.backend == BackendKind::Http {
            match &self.storage.url {
                None => bail!("[storage.backend] = \"http\" requires [storage.url] to be set"),
                Some(url) if !url.starts_with("http") => {
                    bail!(ConfigError::Validation(
                        "[storage.url] must start with http:// or https://".into()
                    ))
                }
                _ => {}
            }
        }

        if !self.auth.password_hash.is_empty()
            && (self.auth.password_hash.len() != 64
                || !self.auth.password_hash.bytes().all(|b| b.is_ascii_hexdigit()))
        {
            bail!(ConfigError::Validation(
                "[auth.password_hash] must be a hex SHA-256 digest (see `plume passhash`)".into()
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

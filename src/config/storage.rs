//! `[storage]` and `[cache]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the site document lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// A JSON file on the local filesystem.
    #[default]
    Local,
    /// An object behind an HTTP URL (`GET` to read, `PUT` to write).
    Http,
}

/// `[storage]` section in plume.toml.
///
/// # Example
/// ```toml
/// [storage]
/// backend = "http"
/// url = "https://bucket.example.com/site.json"
/// token_env = "PLUME_STORAGE_TOKEN"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Site document path for the local backend, relative to the root.
    #[serde(default = "defaults::storage::site_path")]
    #[educe(Default = defaults::storage::site_path())]
    pub site_path: PathBuf,

    /// Object URL for the http backend.
    #[serde(default)]
    pub url: Option<String>,

    /// Environment variable holding the bearer token for the http backend.
    /// Unset variable means unauthenticated requests.
    #[serde(default = "defaults::storage::token_env")]
    #[educe(Default = defaults::storage::token_env())]
    pub token_env: String,
}

impl StorageConfig {
    /// Bearer token from the configured environment variable, if set.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env).ok().filter(|t| !t.is_empty())
    }
}

/// `[cache]` section in plume.toml.
///
/// # Example
/// ```toml
/// [cache]
/// ttl = "30s"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// How long a loaded site document is served before re-reading storage.
    #[serde(default = "defaults::cache::ttl")]
    #[educe(Default = defaults::cache::ttl())]
    pub ttl: String,
}

#[cfg(test)]
mod tests {
    use super::super::PlumeConfig;
    use super::*;

    #[test]
    fn test_storage_defaults() {
        let config: PlumeConfig = toml::from_str("").unwrap();
        assert_eq!(config.storage.backend, BackendKind::Local);
        assert_eq!(config.storage.site_path, PathBuf::from("storage/site.json"));
        assert_eq!(config.storage.url, None);
        assert_eq!(config.cache.ttl, "1m");
    }

    #[test]
    fn test_http_backend() {
        let config = r#"
            [storage]
            backend = "http"
            url = "https://objects.example.com/site.json"
            token_env = "MY_TOKEN"

            [cache]
            ttl = "30s"
        "#;
        let config: PlumeConfig = toml::from_str(config).unwrap();
        assert_eq!(config.storage.backend, BackendKind::Http);
        assert_eq!(config.storage.url.as_deref(), Some("https://objects.example.com/site.json"));
        assert_eq!(config.storage.token_env, "MY_TOKEN");
        assert_eq!(config.cache.ttl, "30s");
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let config = r#"
            [storage]
            backend = "s3"
        "#;
        assert!(toml::from_str::<PlumeConfig>(config).is_err());
    }
}

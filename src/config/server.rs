//! `[server]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[server]` section in plume.toml - HTTP listener settings.
///
/// # Example
/// ```toml
/// [server]
/// interface = "0.0.0.0"     # Listen on all interfaces
/// port = 8080
/// workers = 16              # Request threads sharing the listener
/// request_timeout = "5s"    # Deadline for storage access per request
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces
    #[serde(default = "defaults::server::interface")]
    #[educe(Default = defaults::server::interface())]
    pub interface: String,

    /// HTTP port number (default: 8080).
    #[serde(default = "defaults::server::port")]
    #[educe(Default = defaults::server::port())]
    pub port: u16,

    /// Number of request worker threads.
    #[serde(default = "defaults::server::workers")]
    #[educe(Default = defaults::server::workers())]
    pub workers: usize,

    /// How long a request may wait on the content store, e.g. `"10s"`.
    #[serde(default = "defaults::server::request_timeout")]
    #[educe(Default = defaults::server::request_timeout())]
    pub request_timeout: String,
}

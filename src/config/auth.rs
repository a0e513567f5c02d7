//! `[auth]` and `[dev]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[auth]` section in plume.toml - the single operator account.
///
/// # Example
/// ```toml
/// [auth]
/// username = "admin"
/// password_hash = "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
/// session_lifetime = "12h"
/// ```
///
/// `password_hash` is the hex SHA-256 of the password (`plume passhash`).
/// With an empty hash nobody can log in.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    #[serde(default = "defaults::auth::username")]
    #[educe(Default = defaults::auth::username())]
    pub username: String,

    #[serde(default)]
    pub password_hash: String,

    /// Cookie carrying the session token.
    #[serde(default = "defaults::auth::session_cookie")]
    #[educe(Default = defaults::auth::session_cookie())]
    pub session_cookie: String,

    #[serde(default = "defaults::auth::session_lifetime")]
    #[educe(Default = defaults::auth::session_lifetime())]
    pub session_lifetime: String,
}

/// `[dev]` section in plume.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DevConfig {
    /// Local development: pretty-printed storage, no canonical host
    /// redirect, webmentions logged instead of sent.
    #[serde(default)]
    pub local: bool,
}

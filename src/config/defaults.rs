//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// [server] Section Defaults
// ============================================================================

pub mod server {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        8080
    }

    pub fn workers() -> usize {
        8
    }

    pub fn request_timeout() -> String {
        "10s".into()
    }
}

// ============================================================================
// [storage] Section Defaults
// ============================================================================

pub mod storage {
    use std::path::PathBuf;

    pub fn site_path() -> PathBuf {
        "storage/site.json".into()
    }

    pub fn token_env() -> String {
        "PLUME_STORAGE_TOKEN".into()
    }
}

// ============================================================================
// [cache] Section Defaults
// ============================================================================

pub mod cache {
    pub fn ttl() -> String {
        "1m".into()
    }
}

// ============================================================================
// [auth] Section Defaults
// ============================================================================

pub mod auth {
    pub fn username() -> String {
        "admin".into()
    }

    pub fn session_cookie() -> String {
        "session".into()
    }

    pub fn session_lifetime() -> String {
        "24h".into()
    }
}

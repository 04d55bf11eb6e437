use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub csrf: CsrfConfig,
    #[serde(default)]
    pub prefetch: PrefetchConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Counter sync settings on the client side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the sync server (scheme + host + port).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Path flushes are posted to.
    #[serde(default = "default_sync_path")]
    pub path: String,
    /// Page fetched once on startup to pick up session cookies.
    #[serde(default = "default_page_path")]
    pub page_path: String,
    /// Region the flush response is swapped into.
    #[serde(default = "default_target")]
    pub target: String,
    /// Quiet period after the last bump before a flush fires.
    #[serde(default = "default_quiet_period_ms")]
    pub quiet_period_ms: u64,
}

/// Double-submit CSRF token names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfConfig {
    /// Cookie the token is read from.
    #[serde(default = "default_csrf_cookie")]
    pub cookie_name: String,
    /// Header the token is copied into.
    #[serde(default = "default_csrf_header")]
    pub header_name: String,
}

/// Hover/focus link prefetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefetchConfig {
    #[serde(default = "default_prefetch_enabled")]
    pub enabled: bool,
    /// Intent delay before a hovered link is fetched (default: 100).
    #[serde(default = "default_intent_delay_ms")]
    pub intent_delay_ms: u64,
}

/// Sync server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the sync server (host:port).
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_sync_path() -> String {
    "/counter/sync".to_string()
}

fn default_page_path() -> String {
    "/counter".to_string()
}

fn default_target() -> String {
    "#server-count-value".to_string()
}

fn default_quiet_period_ms() -> u64 {
    5000
}

fn default_csrf_cookie() -> String {
    "_gforge_csrf".to_string()
}

fn default_csrf_header() -> String {
    "X-CSRF-Token".to_string()
}

fn default_prefetch_enabled() -> bool {
    true
}

fn default_intent_delay_ms() -> u64 {
    100
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            path: default_sync_path(),
            page_path: default_page_path(),
            target: default_target(),
            quiet_period_ms: default_quiet_period_ms(),
        }
    }
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_csrf_cookie(),
            header_name: default_csrf_header(),
        }
    }
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            enabled: default_prefetch_enabled(),
            intent_delay_ms: default_intent_delay_ms(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Configuration management for the Miivvy shortcut service
///
/// Handles server binding, the public base URL used for default webhook
/// construction, and the object store used by the signed-URL channel.

use serde::{Deserialize, Serialize};

/// Signing key used when `MIIVVY_ENV=development` and no key is configured
const DEVELOPMENT_SIGNING_KEY: &str = "miivvy-development-signing-key";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Shortcut generation settings
    pub shortcuts: ShortcutConfig,
    /// Object store configuration
    pub storage: StorageConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Shortcut generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortcutConfig {
    /// Public API base URL; the download route points shortcuts at `{api_base_url}/api/webhook`
    pub api_base_url: String,
}

/// Filesystem object store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for stored objects (default: "data/objects")
    pub root_dir: String,
    /// Base URL that signed object URLs are issued against
    pub public_url: String,
    /// HMAC key for signed URLs. `None` fails store construction at startup.
    #[serde(skip_serializing)]
    pub signing_key: Option<String>,
}

impl ShortcutConfig {
    /// Webhook URL embedded into shortcuts served by the download route
    pub fn default_webhook_url(&self) -> String {
        format!("{}/api/webhook", self.api_base_url.trim_end_matches('/'))
    }
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        let api_base_url = std::env::var("API_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:5001".to_string());
        let development = std::env::var("MIIVVY_ENV")
            .map(|env| env == "development")
            .unwrap_or(false);

        Self {
            server: ServerConfig {
                host: std::env::var("MIIVVY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("PORT")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()
                    .unwrap_or(5000),
            },
            storage: StorageConfig {
                root_dir: std::env::var("MIIVVY_STORAGE_DIR")
                    .unwrap_or_else(|_| "data/objects".to_string()),
                public_url: std::env::var("MIIVVY_PUBLIC_URL")
                    .unwrap_or_else(|_| api_base_url.clone()),
                signing_key: std::env::var("MIIVVY_SIGNING_KEY")
                    .ok()
                    .filter(|key| !key.is_empty())
                    .or_else(|| development.then(|| DEVELOPMENT_SIGNING_KEY.to_string())),
            },
            shortcuts: ShortcutConfig { api_base_url },
        }
    }
}

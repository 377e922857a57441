use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "MedScreen";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Public IP lookup service used to identify admin-page visitors.
pub const DEFAULT_IP_LOOKUP_URL: &str = "https://api.ipify.org?format=json";

/// Timezone used for every stored timestamp.
pub const DEFAULT_TZ_NAME: &str = "Asia/Bangkok";
pub const DEFAULT_TZ_OFFSET_MINUTES: i32 = 7 * 60;

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_MODELS_DIR: &str = "models";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medscreen_lib=info,medscreen=info,tower_http=warn"
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Where the visitor's identity (IP address) comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMode {
    /// Ask an external "what is my IP" service.
    Lookup,
    /// Use the TCP peer address of the request.
    Peer,
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Base URL of the remote JSON store. `None` runs against an in-memory tree.
    pub store_url: Option<String>,
    pub store_auth: Option<String>,
    /// Request timeout for outgoing HTTP calls. `None` keeps the client default.
    pub http_timeout: Option<Duration>,
    pub models_dir: PathBuf,
    pub identity: IdentityMode,
    pub ip_lookup_url: String,
    pub tz_name: String,
    pub tz_offset_minutes: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            store_url: None,
            store_auth: None,
            http_timeout: None,
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            identity: IdentityMode::Lookup,
            ip_lookup_url: DEFAULT_IP_LOOKUP_URL.to_string(),
            tz_name: DEFAULT_TZ_NAME.to_string(),
            tz_offset_minutes: DEFAULT_TZ_OFFSET_MINUTES,
        }
    }
}

impl AppConfig {
    /// Read configuration from `MEDSCREEN_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = get("MEDSCREEN_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            var: "MEDSCREEN_BIND",
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let http_timeout = match get("MEDSCREEN_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                    var: "MEDSCREEN_HTTP_TIMEOUT_SECS",
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let identity = match get("MEDSCREEN_IDENTITY").as_deref() {
            None | Some("lookup") => IdentityMode::Lookup,
            Some("peer") => IdentityMode::Peer,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "MEDSCREEN_IDENTITY",
                    value: other.to_string(),
                    reason: "expected `lookup` or `peer`".into(),
                })
            }
        };

        let tz_offset_minutes = match get("MEDSCREEN_TZ_OFFSET_MINUTES") {
            Some(raw) => {
                let minutes = raw.parse::<i32>().map_err(|e| ConfigError::Invalid {
                    var: "MEDSCREEN_TZ_OFFSET_MINUTES",
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                if minutes.abs() >= 24 * 60 {
                    return Err(ConfigError::Invalid {
                        var: "MEDSCREEN_TZ_OFFSET_MINUTES",
                        value: raw,
                        reason: "offset must be within ±24h".into(),
                    });
                }
                minutes
            }
            None => DEFAULT_TZ_OFFSET_MINUTES,
        };

        Ok(Self {
            bind_addr,
            store_url: get("MEDSCREEN_STORE_URL").map(|u| u.trim_end_matches('/').to_string()),
            store_auth: get("MEDSCREEN_STORE_AUTH"),
            http_timeout,
            models_dir: get("MEDSCREEN_MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODELS_DIR)),
            identity,
            ip_lookup_url: get("MEDSCREEN_IP_LOOKUP_URL")
                .unwrap_or_else(|| DEFAULT_IP_LOOKUP_URL.to_string()),
            tz_name: get("MEDSCREEN_TZ_NAME").unwrap_or_else(|| DEFAULT_TZ_NAME.to_string()),
            tz_offset_minutes,
        })
    }
}

/// Build a blocking HTTP client. `None` disables the request timeout.
pub fn http_client(timeout: Option<Duration>) -> Result<reqwest::blocking::Client, reqwest::Error> {
    reqwest::blocking::Client::builder().timeout(timeout).build()
}

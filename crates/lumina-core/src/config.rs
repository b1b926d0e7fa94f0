//! Shared configuration for Lumina.
//!
//! Locates the state and config directories and reads the bot settings from
//! the environment.
//!
//! # Storage Structure
//!
//! ```text
//! ~/.lumina/
//! ├── config/       # .env.local with secrets
//! └── state/        # lumina_data.json
//! ```
//!
//! # Environment Variables
//!
//! - `LUMINA_STATE_DIR`: Override the base state directory
//! - `LUMINA_CONFIG_DIR`: Override the config directory
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather (required)
//! - `LUMINA_CHANNEL_ID`: Chat id of the announcement channel (required)
//! - `LUMINA_MOD_CODE`: Code accepted by `/mod` (optional, `/mod` is disabled without it)
//! - `LUMINA_ALERT_INTERVAL_SECS`: Alert poll interval (default: 120)
//! - `LUMINA_QUOTE_INTERVAL_SECS`: Quote post interval (default: 7200)
//! - `LUMINA_HTTP_TIMEOUT_SECS`: Per-request timeout for external APIs (default: 10)
//! - `LUMINA_USER_AGENT`: User agent sent to the weather service

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::{CoreError, Result};

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "LUMINA_STATE_DIR";

/// Environment variable for custom config directory.
pub const CONFIG_DIR_ENV: &str = "LUMINA_CONFIG_DIR";

pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const CHANNEL_ID_ENV: &str = "LUMINA_CHANNEL_ID";
pub const MOD_CODE_ENV: &str = "LUMINA_MOD_CODE";
pub const ALERT_INTERVAL_ENV: &str = "LUMINA_ALERT_INTERVAL_SECS";
pub const QUOTE_INTERVAL_ENV: &str = "LUMINA_QUOTE_INTERVAL_SECS";
pub const HTTP_TIMEOUT_ENV: &str = "LUMINA_HTTP_TIMEOUT_SECS";
pub const USER_AGENT_ENV: &str = "LUMINA_USER_AGENT";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".lumina";

const CONFIG_SUBDIR: &str = "config";
const STATE_SUBDIR: &str = "state";

/// Name of the persisted data file.
pub const DATA_FILE_NAME: &str = "lumina_data.json";

pub const DEFAULT_ALERT_INTERVAL_SECS: u64 = 120;
pub const DEFAULT_QUOTE_INTERVAL_SECS: u64 = 2 * 60 * 60;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// api.weather.gov refuses requests without an identifying user agent.
pub const DEFAULT_USER_AGENT: &str = "lumina-bot (contact: admin@example.com)";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the Lumina state directory.
///
/// 1. `LUMINA_STATE_DIR` environment variable if set
/// 2. `~/.lumina` if home directory is available
/// 3. `.lumina` in current directory as fallback
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Get the user config directory.
///
/// Defaults to `~/.lumina/config/` or `LUMINA_CONFIG_DIR` env var.
pub fn config_dir() -> PathBuf {
    std::env::var(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir().join(CONFIG_SUBDIR))
}

/// Get the runtime state directory.
pub fn runtime_state_dir() -> PathBuf {
    state_dir().join(STATE_SUBDIR)
}

/// Get the default data file path.
pub fn data_file() -> PathBuf {
    runtime_state_dir().join(DATA_FILE_NAME)
}

/// Get the .env.local file path.
pub fn env_file() -> PathBuf {
    config_dir().join(".env.local")
}

/// Load environment files: the config-dir `.env.local` first, then a local
/// `.env.local` or `.env`. Variables already set are never overridden.
pub fn load_env_files() {
    let env_path = env_file();
    if env_path.exists() {
        if let Err(e) = dotenvy::from_path(&env_path) {
            tracing::warn!(path = %env_path.display(), error = %e, "Failed to load env file");
        }
    }
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());
}

/// Ensure the runtime state and config directories exist.
///
/// # Errors
/// Returns an error if a directory cannot be created.
pub fn ensure_all_dirs() -> std::io::Result<()> {
    std::fs::create_dir_all(config_dir())?;
    std::fs::create_dir_all(runtime_state_dir())?;
    Ok(())
}

/// Runtime settings for the bot.
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub token: String,
    pub channel_id: i64,
    pub mod_code: Option<String>,
    pub alert_interval: Duration,
    pub quote_interval: Duration,
    pub http_timeout: Duration,
    pub user_agent: String,
}

impl BotSettings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which returns the value of a key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token = get(TOKEN_ENV).ok_or(CoreError::MissingSetting(TOKEN_ENV))?;

        let channel_raw = get(CHANNEL_ID_ENV).ok_or(CoreError::MissingSetting(CHANNEL_ID_ENV))?;
        let channel_id = channel_raw.parse().map_err(|_| CoreError::InvalidSetting {
            key: CHANNEL_ID_ENV,
            value: channel_raw.clone(),
        })?;

        let secs = |key: &'static str, default: u64| -> Result<Duration> {
            match get(key) {
                None => Ok(Duration::from_secs(default)),
                Some(raw) => match raw.parse::<u64>() {
                    Ok(n) if n > 0 => Ok(Duration::from_secs(n)),
                    _ => Err(CoreError::InvalidSetting { key, value: raw }),
                },
            }
        };

        Ok(Self {
            token,
            channel_id,
            mod_code: get(MOD_CODE_ENV),
            alert_interval: secs(ALERT_INTERVAL_ENV, DEFAULT_ALERT_INTERVAL_SECS)?,
            quote_interval: secs(QUOTE_INTERVAL_ENV, DEFAULT_QUOTE_INTERVAL_SECS)?,
            http_timeout: secs(HTTP_TIMEOUT_ENV, DEFAULT_HTTP_TIMEOUT_SECS)?,
            user_agent: get(USER_AGENT_ENV).unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        })
    }
}

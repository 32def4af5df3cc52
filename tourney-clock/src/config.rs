// Configuration loading and parsing (config/clock.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CONFIG_FILE: &str = "clock.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub base_url: String,
    pub tournament_id: i64,
}

/// Timing knobs for the tick loop and its waits.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Client-side ceiling on one long-poll session, before jitter.
    pub listen_timeout_secs: u64,
    /// Upper bound of the random extra added to each session's timeout, so
    /// many displays restarted together do not reconnect in lockstep.
    pub listen_jitter_ms: u64,
    pub content_timeout_ms: u64,
    /// Delay between the end of one tick cycle and the start of the next.
    pub tick_delay_ms: u64,
    pub footer_interval_secs: u64,
}

impl SyncConfig {
    pub fn listen_timeout(&self) -> Duration {
        Duration::from_secs(self.listen_timeout_secs)
    }

    pub fn listen_jitter(&self) -> Duration {
        Duration::from_millis(self.listen_jitter_ms)
    }

    pub fn content_timeout(&self) -> Duration {
        Duration::from_millis(self.content_timeout_ms)
    }

    pub fn tick_delay(&self) -> Duration {
        Duration::from_millis(self.tick_delay_ms)
    }

    pub fn footer_interval(&self) -> Duration {
        Duration::from_secs(self.footer_interval_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            listen_timeout_secs: 60,
            listen_jitter_ms: 5_000,
            content_timeout_ms: 10_000,
            tick_delay_ms: 50,
            footer_interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub dir: String,
    pub filter: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/clock.toml` relative to `base_dir`.
///
/// This does not copy defaults; prefer `load_config()`.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config = parse_config(&path, &text)?;
    validate(&config)?;
    Ok(config)
}

/// Parse config text without validating it.
pub fn parse_config(path: &Path, text: &str) -> Result<Config, ConfigError> {
    toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Seed `config/clock.toml` from `defaults/clock.toml` on first run.
///
/// Returns the path written, or `None` when a config file already exists.
/// An existing file is never overwritten.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    let copy_error = |action: &str, path: &Path, e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to {action} {}: {e}", path.display()),
    };

    let defaults = match std::fs::read(&source) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "no {CONFIG_FILE} in config/ or defaults/ under {}",
                    base_dir.display()
                ),
            });
        }
        Err(e) => return Err(copy_error("read", &source, e)),
    };

    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).map_err(|e| copy_error("create", dir, e))?;
    }

    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(mut file) => {
            std::io::Write::write_all(&mut file, &defaults)
                .map_err(|e| copy_error("write", &target, e))?;
            Ok(Some(target))
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(copy_error("create", &target, e)),
    }
}

/// Load config relative to the current working directory, copying defaults
/// first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_file(&cwd)?;
    load_config_from(&cwd)
}

/// Apply a tournament id given on the command line.
pub fn apply_tournament_override(config: &mut Config, arg: Option<&str>) -> Result<(), ConfigError> {
    let Some(arg) = arg else {
        return Ok(());
    };
    let id: i64 = arg.parse().map_err(|_| ConfigError::ValidationError {
        field: "tournament_id".into(),
        message: format!("command-line tournament id `{arg}` is not a number"),
    })?;
    config.server.tournament_id = id;
    validate(config)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let url = config.server.base_url.trim();
    if url.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "server.base_url".into(),
            message: "must not be empty".into(),
        });
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError {
            field: "server.base_url".into(),
            message: format!("must start with http:// or https://, got {url}"),
        });
    }

    if config.server.tournament_id <= 0 {
        return Err(ConfigError::ValidationError {
            field: "server.tournament_id".into(),
            message: format!("must be greater than 0, got {}", config.server.tournament_id),
        });
    }

    let sync = &config.sync;
    let nonzero: &[(&str, u64)] = &[
        ("sync.listen_timeout_secs", sync.listen_timeout_secs),
        ("sync.content_timeout_ms", sync.content_timeout_ms),
        ("sync.tick_delay_ms", sync.tick_delay_ms),
        ("sync.footer_interval_secs", sync.footer_interval_secs),
    ];
    for (name, val) in nonzero {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

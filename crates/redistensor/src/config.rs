//! Configuration for tensor backends
//!
//! Settings are layered with increasing priority:
//! 1. Default values
//! 2. Configuration files (TOML)
//! 3. Environment variables (`REDISTENSOR_*` by default)
//!
//! ```toml
//! [backend]
//! kind = "redis"
//! host = "localhost"
//! port = 6379
//!
//! [log]
//! level = "debug"
//! format = "compact"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default environment variable prefix
pub const ENV_PREFIX: &str = "REDISTENSOR";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid value
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Error message
        message: String,
    },

    /// Environment variable error
    #[error("environment variable error: {0}")]
    EnvVar(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// How strictly stored dtype names are interpreted by the directory backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DtypeNames {
    /// Only the canonical lowercase names
    Exact,
    /// Canonical names plus aliases and NumPy type codes
    #[default]
    Lenient,
}

impl std::str::FromStr for DtypeNames {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "lenient" => Ok(Self::Lenient),
            _ => Err(ConfigError::InvalidValue {
                field: "dtype_names".to_string(),
                message: format!("expected exact or lenient, got {s}"),
            }),
        }
    }
}

/// Directory backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Directory holding the record files
    pub path: PathBuf,
    /// Create the directory when it does not exist
    pub create_missing: bool,
    /// Dtype name interpretation on read
    pub dtype_names: DtypeNames,
}

impl DirectoryConfig {
    /// Configuration for an existing directory with default options
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Create the directory on open if missing
    #[must_use]
    pub fn create_missing(mut self, create: bool) -> Self {
        self.create_missing = create;
        self
    }

    /// Set dtype name interpretation
    #[must_use]
    pub fn dtype_names(mut self, names: DtypeNames) -> Self {
        self.dtype_names = names;
        self
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: home.join(".redistensor/tensors"),
            create_missing: false,
            dtype_names: DtypeNames::default(),
        }
    }
}

/// Redis backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Server host name or address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Password sent with AUTH; empty means none
    pub password: Option<String>,
    /// Database index selected after connecting
    pub db: i64,
    /// Connect timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Send each record triple as one MULTI/EXEC transaction
    pub atomic_writes: bool,
}

impl RedisConfig {
    /// Configuration for `host:port` with default options
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Set the AUTH password
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Enable or disable transactional triple writes
    #[must_use]
    pub fn atomic_writes(mut self, atomic: bool) -> Self {
        self.atomic_writes = atomic;
        self
    }

    /// `host:port`
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            db: 0,
            connect_timeout_ms: 5000,
            atomic_writes: false,
        }
    }
}

/// Which backend to open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Filesystem directory
    Directory(DirectoryConfig),
    /// Redis server
    Redis(RedisConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Redis(RedisConfig::default())
    }
}

impl BackendConfig {
    /// Short backend name
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Directory(_) => "directory",
            Self::Redis(_) => "redis",
        }
    }

    /// Check values that would make the backend unusable
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Directory(dir) => {
                if dir.path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "backend.path".to_string(),
                        message: "directory path is empty".to_string(),
                    });
                }
            }
            Self::Redis(redis) => {
                if redis.host.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "backend.host".to_string(),
                        message: "host is empty".to_string(),
                    });
                }
                if redis.port == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: "backend.port".to_string(),
                        message: "port must be non-zero".to_string(),
                    });
                }
                if redis.connect_timeout_ms == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: "backend.connect_timeout_ms".to_string(),
                        message: "timeout must be non-zero".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level
    Trace,
    /// Debug level
    Debug,
    /// Info level
    Info,
    /// Warn level
    #[default]
    Warn,
    /// Error level
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    #[must_use]
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::InvalidValue {
                field: "log.level".to_string(),
                message: format!("invalid log level: {s}"),
            }),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output
    Pretty,
    /// Single-line output
    #[default]
    Compact,
    /// JSON lines
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidValue {
                field: "log.format".to_string(),
                message: format!("invalid log format: {s}"),
            }),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level
    pub level: LogLevel,
    /// Output format
    pub format: LogFormat,
}

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backend selection
    pub backend: BackendConfig,
    /// Logging
    pub log: LogConfig,
}

/// Configuration source
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConfigSource {
    File(PathBuf),
    Env(String),
    Memory(String),
}

/// Configuration loader
#[derive(Debug, Default)]
pub struct ConfigLoader {
    sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    /// Loader that yields the defaults until sources are added
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a TOML file source
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.sources
            .push(ConfigSource::File(path.as_ref().to_path_buf()));
        self
    }

    /// Add an in-memory TOML source
    pub fn with_str(mut self, toml: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Memory(toml.into()));
        self
    }

    /// Add environment variable overrides with `prefix`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.sources.push(ConfigSource::Env(prefix.to_string()));
        self
    }

    /// Load from all sources, reading the process environment
    pub fn load(&self) -> Result<Settings> {
        self.load_with_env(|name| std::env::var(name).ok())
    }

    /// Load from all sources with a custom environment lookup
    pub fn load_with_env<F>(&self, lookup: F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = self.load_unvalidated_with_env(lookup)?;
        settings.backend.validate()?;
        Ok(settings)
    }

    /// Merge all sources without validating the backend
    ///
    /// For callers that apply further overrides and call
    /// [`BackendConfig::validate`] themselves.
    pub fn load_unvalidated_with_env<F>(&self, lookup: F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        for source in &self.sources {
            settings = match source {
                ConfigSource::File(path) => {
                    let content = std::fs::read_to_string(path)?;
                    Self::parse(&content)?
                }
                ConfigSource::Memory(content) => Self::parse(content)?,
                ConfigSource::Env(prefix) => Self::apply_env_overrides(settings, prefix, &lookup)?,
            };
        }

        if let BackendConfig::Directory(dir) = &mut settings.backend {
            dir.path = Self::expand_path(&dir.path);
        }

        Ok(settings)
    }

    fn parse(content: &str) -> Result<Settings> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_env_overrides<F>(mut settings: Settings, prefix: &str, lookup: &F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{prefix}_{suffix}"));

        if let Some(kind) = var("BACKEND") {
            match kind.to_lowercase().as_str() {
                "directory" | "dir" => {
                    if !matches!(settings.backend, BackendConfig::Directory(_)) {
                        settings.backend = BackendConfig::Directory(DirectoryConfig::default());
                    }
                }
                "redis" => {
                    if !matches!(settings.backend, BackendConfig::Redis(_)) {
                        settings.backend = BackendConfig::Redis(RedisConfig::default());
                    }
                }
                other => {
                    return Err(ConfigError::EnvVar(format!("invalid backend kind: {other}")));
                }
            }
        }

        match &mut settings.backend {
            BackendConfig::Directory(dir) => {
                if let Some(val) = var("DIR_PATH") {
                    dir.path = PathBuf::from(val);
                }
                if let Some(val) = var("DIR_CREATE_MISSING") {
                    dir.create_missing = val.parse().map_err(|_| {
                        ConfigError::EnvVar(format!("invalid create_missing value: {val}"))
                    })?;
                }
                if let Some(val) = var("DIR_DTYPE_NAMES") {
                    dir.dtype_names = val.parse()?;
                }
            }
            BackendConfig::Redis(redis) => {
                if let Some(val) = var("REDIS_HOST") {
                    redis.host = val;
                }
                if let Some(val) = var("REDIS_PORT") {
                    redis.port = val
                        .parse()
                        .map_err(|_| ConfigError::EnvVar(format!("invalid port value: {val}")))?;
                }
                if let Some(val) = var("REDIS_PASSWORD") {
                    redis.password = Some(val);
                }
                if let Some(val) = var("REDIS_DB") {
                    redis.db = val
                        .parse()
                        .map_err(|_| ConfigError::EnvVar(format!("invalid db value: {val}")))?;
                }
                if let Some(val) = var("REDIS_CONNECT_TIMEOUT_MS") {
                    redis.connect_timeout_ms = val.parse().map_err(|_| {
                        ConfigError::EnvVar(format!("invalid connect_timeout_ms value: {val}"))
                    })?;
                }
                if let Some(val) = var("REDIS_ATOMIC_WRITES") {
                    redis.atomic_writes = val.parse().map_err(|_| {
                        ConfigError::EnvVar(format!("invalid atomic_writes value: {val}"))
                    })?;
                }
            }
        }

        if let Some(val) = var("LOG_LEVEL") {
            settings.log.level = val.parse()?;
        }
        if let Some(val) = var("LOG_FORMAT") {
            settings.log.format = val.parse()?;
        }

        Ok(settings)
    }

    /// Expand a leading `~/`
    fn expand_path(path: &Path) -> PathBuf {
        if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/")) {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        path.to_path_buf()
    }
}

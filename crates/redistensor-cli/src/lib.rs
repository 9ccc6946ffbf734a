//! redistensor-cli library exports
//!
//! Argument definitions and command implementations for the `redistensor`
//! binary.

pub mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use redistensor::config::ENV_PREFIX;
use redistensor::{BackendConfig, ConfigLoader, DirectoryConfig, Dtype, RedisConfig, Settings};

#[derive(Parser)]
#[command(name = "redistensor")]
#[command(author, version, about = "Store and inspect tensors in a directory or on a Redis server", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub backend: BackendArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Backend selection flags, applied on top of the loaded configuration
#[derive(Debug, Clone, Default, clap::Args)]
pub struct BackendArgs {
    /// Use the tensor directory at PATH
    #[arg(long, global = true, value_name = "PATH", conflicts_with_all = ["redis", "port", "password", "db"])]
    pub dir: Option<PathBuf>,

    /// Create the directory given with --dir if it does not exist
    #[arg(long, global = true, requires = "dir")]
    pub create_missing: bool,

    /// Use the Redis server at HOST
    #[arg(long, global = true, value_name = "HOST")]
    pub redis: Option<String>,

    /// Redis port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Redis password
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Redis database index
    #[arg(long, global = true)]
    pub db: Option<i64>,
}

impl BackendArgs {
    fn wants_redis(&self) -> bool {
        self.redis.is_some() || self.port.is_some() || self.password.is_some() || self.db.is_some()
    }

    /// Override `backend` with the flags that were given
    pub fn apply(&self, backend: &mut BackendConfig) {
        if let Some(path) = &self.dir {
            let mut dir = match backend {
                BackendConfig::Directory(dir) => dir.clone(),
                BackendConfig::Redis(_) => DirectoryConfig::default(),
            };
            dir.path.clone_from(path);
            dir.create_missing |= self.create_missing;
            *backend = BackendConfig::Directory(dir);
            return;
        }

        if !self.wants_redis() {
            return;
        }
        if !matches!(backend, BackendConfig::Redis(_)) {
            *backend = BackendConfig::Redis(RedisConfig::default());
        }
        if let BackendConfig::Redis(redis) = backend {
            if let Some(host) = &self.redis {
                redis.host.clone_from(host);
            }
            if let Some(port) = self.port {
                redis.port = port;
            }
            if let Some(password) = &self.password {
                redis.password = Some(password.clone());
            }
            if let Some(db) = self.db {
                redis.db = db;
            }
        }
    }
}

impl Cli {
    /// Resolve settings: defaults, then `--config`, then environment, then flags
    pub fn settings(&self) -> Result<Settings> {
        self.settings_with_env(|name| std::env::var(name).ok())
    }

    /// Resolve settings with a custom environment lookup
    ///
    /// The backend is validated once, after the flags are applied, so a flag
    /// can replace an invalid value coming from the file or environment.
    pub fn settings_with_env<F>(&self, lookup: F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut loader = ConfigLoader::new();
        if let Some(path) = &self.config {
            loader = loader.with_file(path);
        }
        let mut settings = loader
            .with_env_prefix(ENV_PREFIX)
            .load_unvalidated_with_env(lookup)
            .context("failed to load configuration")?;

        self.backend.apply(&mut settings.backend);
        settings
            .backend
            .validate()
            .context("invalid backend options")?;
        Ok(settings)
    }
}

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Store a raw native-endian buffer as a tensor
    Put {
        /// Tensor key
        key: String,
        /// Input file, or - for stdin
        file: PathBuf,
        /// Element type (float32, int64, <f4, ...)
        #[arg(short, long)]
        dtype: Dtype,
        /// Shape, e.g. 2,3 or (2,3); empty for a scalar
        #[arg(short, long, allow_hyphen_values = true)]
        shape: String,
    },
    /// Fetch a tensor and write its raw buffer
    Get {
        /// Tensor key
        key: String,
        /// Output file, or - for stdout; prints a summary when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List stored tensor keys
    Ls {
        /// Glob over tensor keys
        #[arg(default_value = "*")]
        pattern: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the shape of a tensor
    Shape {
        /// Tensor key
        key: String,
    },
    /// Show dtype, shape and size of a tensor
    Stat {
        /// Tensor key
        key: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Parse a shape given as `2,3`, `(2,3)` or `[2,3]`
pub fn parse_shape_arg(arg: &str) -> Result<Vec<usize>> {
    let arg = arg.trim();
    let shape = if arg.starts_with('(') || arg.starts_with('[') {
        redistensor::decode_shape(arg)
    } else {
        redistensor::decode_shape(&format!("({arg})"))
    };
    shape.with_context(|| format!("invalid shape {arg:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shape_arg() {
        assert_eq!(parse_shape_arg("2,3").unwrap(), vec![2, 3]);
        assert_eq!(parse_shape_arg("(2,3)").unwrap(), vec![2, 3]);
        assert_eq!(parse_shape_arg("[4]").unwrap(), vec![4]);
        assert_eq!(parse_shape_arg("5,").unwrap(), vec![5]);
        assert_eq!(parse_shape_arg(" 7 ").unwrap(), vec![7]);
        assert!(parse_shape_arg("").unwrap().is_empty());
        assert!(parse_shape_arg("()").unwrap().is_empty());
        assert!(parse_shape_arg("2,x").is_err());
        assert!(parse_shape_arg("-1").is_err());
    }

    #[test]
    fn test_cli_parses_put() {
        let cli = Cli::try_parse_from([
            "redistensor", "--dir", "/tmp/t", "put", "w", "w.bin", "--dtype", "<f4", "--shape", "2,3",
        ])
        .unwrap();

        match cli.command {
            Commands::Put { key, dtype, shape, .. } => {
                assert_eq!(key, "w");
                assert_eq!(dtype, Dtype::Float32);
                assert_eq!(shape, "2,3");
            }
            _ => panic!("expected put"),
        }
        assert_eq!(cli.backend.dir, Some(PathBuf::from("/tmp/t")));
    }

    #[test]
    fn test_cli_rejects_dir_with_redis() {
        let result = Cli::try_parse_from(["redistensor", "--dir", "/tmp/t", "--redis", "h", "ls"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_backend_args_select_directory() {
        let args = BackendArgs {
            dir: Some(PathBuf::from("/data")),
            create_missing: true,
            ..BackendArgs::default()
        };
        let mut backend = BackendConfig::default();
        args.apply(&mut backend);

        match backend {
            BackendConfig::Directory(dir) => {
                assert_eq!(dir.path, PathBuf::from("/data"));
                assert!(dir.create_missing);
            }
            BackendConfig::Redis(_) => panic!("expected directory backend"),
        }
    }

    #[test]
    fn test_backend_args_override_redis() {
        let args = BackendArgs {
            port: Some(6380),
            db: Some(2),
            ..BackendArgs::default()
        };
        let mut backend = BackendConfig::Directory(DirectoryConfig::new("/data"));
        args.apply(&mut backend);

        match backend {
            BackendConfig::Redis(redis) => {
                assert_eq!(redis.host, "localhost");
                assert_eq!(redis.port, 6380);
                assert_eq!(redis.db, 2);
            }
            BackendConfig::Directory(_) => panic!("expected redis backend"),
        }
    }

    #[test]
    fn test_port_flag_overrides_invalid_env() {
        let env = |name: &str| (name == "REDISTENSOR_REDIS_PORT").then(|| "0".to_string());

        let cli = Cli::try_parse_from(["redistensor", "--port", "6380", "ls"]).unwrap();
        let settings = cli.settings_with_env(env).unwrap();
        match settings.backend {
            BackendConfig::Redis(redis) => assert_eq!(redis.port, 6380),
            BackendConfig::Directory(_) => panic!("expected redis backend"),
        }

        let cli = Cli::try_parse_from(["redistensor", "ls"]).unwrap();
        assert!(cli.settings_with_env(env).is_err());
    }

    #[test]
    fn test_backend_args_noop() {
        let mut backend = BackendConfig::Directory(DirectoryConfig::new("/data"));
        BackendArgs::default().apply(&mut backend);
        assert_eq!(backend, BackendConfig::Directory(DirectoryConfig::new("/data")));
    }
}
